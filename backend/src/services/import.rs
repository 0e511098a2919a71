//! Bulk inventory import from externally prepared rows
//!
//! Rows reference products and locations by display name because they come
//! from spreadsheets maintained outside the system. Validation is
//! all-or-nothing: every row is checked first and any failure returns the
//! complete error list with no writes at all.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{business_today, ledger};
use shared::types::MovementType;
use shared::validation::validate_batch_code;

/// Import service for applying externally supplied stock rows
#[derive(Clone)]
pub struct ImportService {
    db: PgPool,
    utc_offset_hours: i32,
}

/// One externally supplied stock row
#[derive(Debug, Deserialize)]
pub struct ImportRow {
    pub product: String,
    pub location: String,
    pub batch_code: String,
    pub quantity: i32,
}

/// Input for a bulk import
#[derive(Debug, Deserialize)]
pub struct BulkImportInput {
    pub rows: Vec<ImportRow>,
}

/// Outcome of a bulk import: either everything was applied or nothing was
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ImportOutcome {
    Inserted { inserted_count: usize },
    Invalid { errors: Vec<String> },
}

struct ResolvedRow {
    product_id: Uuid,
    location_id: Uuid,
    batch_code: String,
    quantity: i32,
}

impl ImportService {
    /// Create a new ImportService instance
    pub fn new(db: PgPool, utc_offset_hours: i32) -> Self {
        Self {
            db,
            utc_offset_hours,
        }
    }

    /// Validate every row, then apply them all as inbound movements.
    pub async fn bulk_import(&self, actor: Uuid, input: BulkImportInput) -> AppResult<ImportOutcome> {
        if input.rows.is_empty() {
            return Err(AppError::ValidationError("No rows to import".to_string()));
        }

        let (resolved, errors) = self.validate_rows(&input.rows).await?;
        if !errors.is_empty() {
            return Ok(ImportOutcome::Invalid { errors });
        }

        let movement_date = business_today(self.utc_offset_hours);
        let mut inserted_count = 0;

        for (index, row) in resolved.into_iter().enumerate() {
            let mut tx = self.db.begin().await?;

            // Zero-quantity rows are legitimate initial entries.
            ledger::apply_movement(
                &mut tx,
                ledger::StockMutation {
                    product_id: row.product_id,
                    location_id: row.location_id,
                    batch_code: row.batch_code,
                    movement_type: MovementType::In,
                    quantity: row.quantity,
                    movement_date,
                    notes: Some("Bulk import".to_string()),
                    transfer_group_id: None,
                    from_location_id: None,
                    to_location_id: None,
                    carried_dates: None,
                    actor,
                },
            )
            .await
            .map_err(|err| match err {
                AppError::ValidationError(msg) => {
                    AppError::ValidationError(format!("row {}: {}", index + 1, msg))
                }
                other => other,
            })?;

            tx.commit().await?;
            inserted_count += 1;
        }

        Ok(ImportOutcome::Inserted { inserted_count })
    }

    /// Phase one: resolve names and collect every row-level error.
    async fn validate_rows(
        &self,
        rows: &[ImportRow],
    ) -> AppResult<(Vec<ResolvedRow>, Vec<String>)> {
        let mut product_ids: HashMap<String, Option<Uuid>> = HashMap::new();
        let mut location_ids: HashMap<String, Option<Uuid>> = HashMap::new();
        let mut resolved = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;

            let product_id = match product_ids.get(&row.product) {
                Some(cached) => *cached,
                None => {
                    let id = sqlx::query_scalar::<_, Uuid>(
                        "SELECT id FROM products WHERE name = $1",
                    )
                    .bind(&row.product)
                    .fetch_optional(&self.db)
                    .await?;
                    product_ids.insert(row.product.clone(), id);
                    id
                }
            };
            if product_id.is_none() {
                errors.push(format!(
                    "row {}: product '{}' does not exist",
                    row_number, row.product
                ));
            }

            let location_id = match location_ids.get(&row.location) {
                Some(cached) => *cached,
                None => {
                    let id = sqlx::query_scalar::<_, Uuid>(
                        "SELECT id FROM locations WHERE name = $1",
                    )
                    .bind(&row.location)
                    .fetch_optional(&self.db)
                    .await?;
                    location_ids.insert(row.location.clone(), id);
                    id
                }
            };
            if location_id.is_none() {
                errors.push(format!(
                    "row {}: location '{}' does not exist",
                    row_number, row.location
                ));
            }

            if let Err(msg) = validate_batch_code(&row.batch_code) {
                errors.push(format!("row {}: {}", row_number, msg));
            }

            if row.quantity < 0 {
                errors.push(format!("row {}: quantity cannot be negative", row_number));
            }

            if let (Some(product_id), Some(location_id)) = (product_id, location_id) {
                resolved.push(ResolvedRow {
                    product_id,
                    location_id,
                    batch_code: row.batch_code.clone(),
                    quantity: row.quantity,
                });
            }
        }

        Ok((resolved, errors))
    }
}
