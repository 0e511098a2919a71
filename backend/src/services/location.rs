//! Location lookups
//!
//! The location set is small and seeded out-of-band (warehouse plus retail
//! sites); the core only reads it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Location service
#[derive(Clone)]
pub struct LocationService {
    db: PgPool,
}

/// A stock-holding location
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl LocationService {
    /// Create a new LocationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List active locations.
    pub async fn list(&self) -> AppResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, code, description, is_active, created_at
            FROM locations
            WHERE is_active
            ORDER BY name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(locations)
    }

    /// Get a single location.
    pub async fn get(&self, location_id: Uuid) -> AppResult<Location> {
        sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, code, description, is_active, created_at
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(location_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Location".to_string()))
    }
}
