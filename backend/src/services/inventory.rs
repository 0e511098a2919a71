//! Inventory service: current-state queries and grid-driven bulk corrections

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{business_today, ledger};
use shared::batch::{expiry_status, ExpiryStatus};
use shared::types::{MovementType, PaginatedResponse, Pagination, PaginationMeta};

/// Inventory service for stock queries and bulk updates
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    utc_offset_hours: i32,
}

/// A current-state inventory row with display names joined in
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub location_id: Uuid,
    pub location_name: String,
    pub batch_code: String,
    pub current_stock: i32,
    pub production_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub last_updated: DateTime<Utc>,
    pub last_modified_by: Option<Uuid>,
}

/// Inventory row annotated with its expiry classification
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringItem {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub expiry_status: ExpiryStatus,
}

/// Filters for the inventory listing
#[derive(Debug, Default, Deserialize)]
pub struct InventoryFilter {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Case-insensitive product name search
    pub search: Option<String>,
    /// Include rows whose stock has reached zero
    pub include_zero: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Per-location stock summary
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LocationSummary {
    pub location_id: Uuid,
    pub location_name: String,
    pub item_count: i64,
    pub total_stock: i64,
}

/// One correction from the edit grid
#[derive(Debug, Deserialize)]
pub struct BulkUpdateItem {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub batch_code: Option<String>,
    pub old_stock: i32,
    pub new_stock: i32,
}

/// Input for a bulk stock correction
#[derive(Debug, Deserialize)]
pub struct BulkUpdateInput {
    pub items: Vec<BulkUpdateItem>,
}

/// Result of a bulk update
#[derive(Debug, Serialize)]
pub struct BulkUpdateResult {
    pub updated_count: usize,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool, utc_offset_hours: i32) -> Self {
        Self {
            db,
            utc_offset_hours,
        }
    }

    /// List current inventory rows, optionally filtered.
    pub async fn list_inventory(
        &self,
        filter: InventoryFilter,
    ) -> AppResult<PaginatedResponse<InventoryItem>> {
        let pagination = Pagination {
            page: filter.page.unwrap_or(1),
            per_page: filter.per_page.unwrap_or(Pagination::default().per_page),
        };
        let search = filter.search.map(|s| format!("%{}%", s));
        let include_zero = filter.include_zero.unwrap_or(true);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            WHERE ($1::uuid IS NULL OR i.product_id = $1)
              AND ($2::uuid IS NULL OR i.location_id = $2)
              AND ($3::text IS NULL OR p.name ILIKE $3)
              AND ($4 OR i.current_stock > 0)
            "#,
        )
        .bind(filter.product_id)
        .bind(filter.location_id)
        .bind(&search)
        .bind(include_zero)
        .fetch_one(&self.db)
        .await?;

        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT i.id, i.product_id, p.name AS product_name, p.code AS product_code,
                   i.location_id, l.name AS location_name,
                   i.batch_code, i.current_stock,
                   i.production_date, i.expiry_date,
                   i.last_updated, i.last_modified_by
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            JOIN locations l ON l.id = i.location_id
            WHERE ($1::uuid IS NULL OR i.product_id = $1)
              AND ($2::uuid IS NULL OR i.location_id = $2)
              AND ($3::text IS NULL OR p.name ILIKE $3)
              AND ($4 OR i.current_stock > 0)
            ORDER BY p.name, l.name, i.batch_code
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.product_id)
        .bind(filter.location_id)
        .bind(&search)
        .bind(include_zero)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: items,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    /// Stock totals per location.
    pub async fn get_summary(&self) -> AppResult<Vec<LocationSummary>> {
        let rows = sqlx::query_as::<_, LocationSummary>(
            r#"
            SELECT l.id AS location_id, l.name AS location_name,
                   COUNT(i.id) AS item_count,
                   COALESCE(SUM(i.current_stock), 0) AS total_stock
            FROM locations l
            LEFT JOIN inventory i ON i.location_id = l.id
            WHERE l.is_active
            GROUP BY l.id, l.name
            ORDER BY l.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Rows at or below the caller's alert threshold.
    pub async fn list_low_stock(&self, threshold: i32) -> AppResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT i.id, i.product_id, p.name AS product_name, p.code AS product_code,
                   i.location_id, l.name AS location_name,
                   i.batch_code, i.current_stock,
                   i.production_date, i.expiry_date,
                   i.last_updated, i.last_modified_by
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            JOIN locations l ON l.id = i.location_id
            WHERE i.current_stock <= $1 AND p.is_active
            ORDER BY i.current_stock, p.name
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.db)
        .await?;

        Ok(items)
    }

    /// Stocked rows that are expired or expiring within 90 days, soonest
    /// first, annotated with their classification.
    pub async fn list_expiring(&self) -> AppResult<Vec<ExpiringItem>> {
        let today = business_today(self.utc_offset_hours);
        let horizon = today + chrono::Duration::days(90);

        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT i.id, i.product_id, p.name AS product_name, p.code AS product_code,
                   i.location_id, l.name AS location_name,
                   i.batch_code, i.current_stock,
                   i.production_date, i.expiry_date,
                   i.last_updated, i.last_modified_by
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            JOIN locations l ON l.id = i.location_id
            WHERE i.expiry_date IS NOT NULL
              AND i.expiry_date <= $1
              AND i.current_stock > 0
            ORDER BY i.expiry_date, p.name
            "#,
        )
        .bind(horizon)
        .fetch_all(&self.db)
        .await?;

        Ok(items
            .into_iter()
            .filter_map(|item| {
                item.expiry_date.map(|expiry| ExpiringItem {
                    expiry_status: expiry_status(expiry, today),
                    item,
                })
            })
            .collect())
    }

    /// Apply a list of absolute stock corrections from the edit grid.
    ///
    /// Items are processed sequentially in input order, one transaction per
    /// item: the inventory row is set to `new_stock` unconditionally and a
    /// movement is recorded whose type derives from the sign of
    /// (new − old): positive is in, negative is out, zero is an adjustment.
    /// A failed item aborts the loop and reports its 1-based index; earlier
    /// items stay committed.
    pub async fn bulk_update(
        &self,
        actor: Uuid,
        input: BulkUpdateInput,
    ) -> AppResult<BulkUpdateResult> {
        if input.items.is_empty() {
            return Err(AppError::ValidationError(
                "No items to update".to_string(),
            ));
        }

        let movement_date = business_today(self.utc_offset_hours);
        let mut updated_count = 0;

        for (index, item) in input.items.iter().enumerate() {
            self.apply_grid_item(actor, item, movement_date)
                .await
                .map_err(|err| annotate_row_error(index + 1, err))?;
            updated_count += 1;
        }

        Ok(BulkUpdateResult { updated_count })
    }

    async fn apply_grid_item(
        &self,
        actor: Uuid,
        item: &BulkUpdateItem,
        movement_date: NaiveDate,
    ) -> AppResult<()> {
        if item.new_stock < 0 {
            return Err(AppError::ValidationError(
                "Stock cannot be negative".to_string(),
            ));
        }

        let batch_code = item.batch_code.clone().unwrap_or_default();
        let delta = item.new_stock - item.old_stock;
        let movement_type = if delta > 0 {
            MovementType::In
        } else if delta < 0 {
            MovementType::Out
        } else {
            MovementType::Adjustment
        };

        let mut tx = self.db.begin().await?;

        // The grid's old value drives the movement type, but the recorded
        // previous stock is the row's actual value so the ledger stays
        // replayable when edits raced.
        let previous_stock =
            ledger::lock_inventory_row(&mut tx, item.product_id, item.location_id, &batch_code)
                .await?
                .map(|(stock, _, _)| stock)
                .unwrap_or(0);

        sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                product_id, location_id, batch_code, movement_type, quantity,
                previous_stock, new_stock, movement_date, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.product_id)
        .bind(item.location_id)
        .bind(&batch_code)
        .bind(movement_type.as_str())
        .bind(delta.abs())
        .bind(previous_stock)
        .bind(item.new_stock)
        .bind(movement_date)
        .bind("Bulk stock correction")
        .bind(actor)
        .execute(&mut *tx)
        .await?;

        let (production_date, expiry_date) = ledger::derive_batch_dates(&batch_code);

        sqlx::query(
            r#"
            INSERT INTO inventory (
                product_id, location_id, batch_code, current_stock,
                production_date, expiry_date, last_modified_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (product_id, location_id, batch_code)
            DO UPDATE SET
                current_stock = EXCLUDED.current_stock,
                last_updated = NOW(),
                last_modified_by = EXCLUDED.last_modified_by
            "#,
        )
        .bind(item.product_id)
        .bind(item.location_id)
        .bind(&batch_code)
        .bind(item.new_stock)
        .bind(production_date)
        .bind(expiry_date)
        .bind(actor)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn annotate_row_error(row: usize, err: AppError) -> AppError {
    match err {
        AppError::ValidationError(msg) => {
            AppError::ValidationError(format!("row {}: {}", row, msg))
        }
        AppError::Validation { field, message } => AppError::Validation {
            field,
            message: format!("row {}: {}", row, message),
        },
        other => other,
    }
}
