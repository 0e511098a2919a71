//! Stock movement service: single in/out/adjustment entries and history

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{business_today, ledger};
use shared::types::{MovementType, PaginatedResponse, Pagination, PaginationMeta};

/// Movement service for recording and querying ledger entries
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
    utc_offset_hours: i32,
}

/// Input for recording a single stock movement
#[derive(Debug, Deserialize)]
pub struct CreateMovementInput {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub batch_code: String,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub movement_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Seed a tracked zero-stock row without implying a real movement
    #[serde(default)]
    pub is_initial: bool,
}

/// Result of a recorded movement
#[derive(Debug, Serialize)]
pub struct MovementResult {
    pub movement_id: Uuid,
    pub previous_stock: i32,
    pub new_stock: i32,
}

/// A ledger entry with display names joined in
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Movement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub location_id: Uuid,
    pub location_name: String,
    pub batch_code: String,
    pub movement_type: String,
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub movement_date: NaiveDate,
    pub notes: Option<String>,
    pub transfer_group_id: Option<Uuid>,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Filters for the movement history listing
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl MovementFilter {
    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            per_page: self.per_page.unwrap_or(default.per_page),
        }
    }
}

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(db: PgPool, utc_offset_hours: i32) -> Self {
        Self {
            db,
            utc_offset_hours,
        }
    }

    /// Record a single in/out/adjustment movement.
    ///
    /// Transfers are excluded here; they always travel in pairs through the
    /// transfer service. The whole operation runs in one transaction, so a
    /// rejected movement leaves neither a ledger row nor a stock change.
    pub async fn create_movement(
        &self,
        actor: Uuid,
        input: CreateMovementInput,
    ) -> AppResult<MovementResult> {
        if input.movement_type == MovementType::Transfer {
            return Err(AppError::Validation {
                field: "movement_type".to_string(),
                message: "Transfers must go through the transfer endpoint".to_string(),
            });
        }

        if input.batch_code.trim().is_empty() {
            return Err(AppError::Validation {
                field: "batch_code".to_string(),
                message: "Batch code is required".to_string(),
            });
        }

        // Quantity must be positive, except for the initial-entry mode
        // (zero-stock row seed) and adjustments, whose quantity is the new
        // absolute level and may legitimately be zero.
        let zero_allowed = input.movement_type == MovementType::Adjustment
            || (input.is_initial && input.movement_type == MovementType::In);
        if input.quantity < 0 || (input.quantity == 0 && !zero_allowed) {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
            });
        }

        self.ensure_references_exist(input.product_id, input.location_id)
            .await?;

        let movement_date = input
            .movement_date
            .unwrap_or_else(|| business_today(self.utc_offset_hours));

        let mut tx = self.db.begin().await?;

        let change = ledger::apply_movement(
            &mut tx,
            ledger::StockMutation {
                product_id: input.product_id,
                location_id: input.location_id,
                batch_code: input.batch_code,
                movement_type: input.movement_type,
                quantity: input.quantity,
                movement_date,
                notes: input.notes,
                transfer_group_id: None,
                from_location_id: None,
                to_location_id: None,
                carried_dates: None,
                actor,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(MovementResult {
            movement_id: change.movement_id,
            previous_stock: change.previous_stock,
            new_stock: change.new_stock,
        })
    }

    /// List movement history, newest first.
    pub async fn list_movements(
        &self,
        filter: MovementFilter,
    ) -> AppResult<PaginatedResponse<Movement>> {
        let pagination = filter.pagination();
        let movement_type = filter.movement_type.map(|t| t.as_str().to_string());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM inventory_movements m
            WHERE ($1::uuid IS NULL OR m.product_id = $1)
              AND ($2::uuid IS NULL OR m.location_id = $2)
              AND ($3::text IS NULL OR m.movement_type = $3)
              AND ($4::date IS NULL OR m.movement_date >= $4)
              AND ($5::date IS NULL OR m.movement_date <= $5)
            "#,
        )
        .bind(filter.product_id)
        .bind(filter.location_id)
        .bind(&movement_type)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .fetch_one(&self.db)
        .await?;

        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT m.id, m.product_id, p.name AS product_name,
                   m.location_id, l.name AS location_name,
                   m.batch_code, m.movement_type, m.quantity,
                   m.previous_stock, m.new_stock, m.movement_date, m.notes,
                   m.transfer_group_id, m.from_location_id, m.to_location_id,
                   m.created_by, m.created_at
            FROM inventory_movements m
            JOIN products p ON p.id = m.product_id
            JOIN locations l ON l.id = m.location_id
            WHERE ($1::uuid IS NULL OR m.product_id = $1)
              AND ($2::uuid IS NULL OR m.location_id = $2)
              AND ($3::text IS NULL OR m.movement_type = $3)
              AND ($4::date IS NULL OR m.movement_date >= $4)
              AND ($5::date IS NULL OR m.movement_date <= $5)
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filter.product_id)
        .bind(filter.location_id)
        .bind(&movement_type)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: movements,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    async fn ensure_references_exist(
        &self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> AppResult<()> {
        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let location_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1)",
        )
        .bind(location_id)
        .fetch_one(&self.db)
        .await?;

        if !location_exists {
            return Err(AppError::NotFound("Location".to_string()));
        }

        Ok(())
    }
}
