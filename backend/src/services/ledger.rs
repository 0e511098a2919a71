//! Ledger writer: the atomic unit every stock operation composes from
//!
//! A stock mutation appends one row to the `inventory_movements` ledger and
//! upserts the matching `inventory` row, both on a caller-supplied
//! transaction. The inventory row is locked with `FOR UPDATE` for the
//! duration of the transaction, so concurrent writers on the same
//! (product, location, batch) key are serialized and the recorded
//! previous/new stock always match the row's true post-write value.

use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::batch;
use shared::types::MovementType;

/// A proposed stock mutation for one (product, location, batch) key.
///
/// `quantity` semantics depend on `movement_type`:
/// - `In` / `Out`: unsigned amount moved
/// - `Adjustment`: the new absolute stock level
/// - `Transfer`: signed delta (negative at the source leg)
#[derive(Debug, Clone)]
pub struct StockMutation {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub batch_code: String,
    pub movement_type: MovementType,
    pub quantity: i32,
    pub movement_date: NaiveDate,
    pub notes: Option<String>,
    pub transfer_group_id: Option<Uuid>,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    /// Dates to seed a newly created inventory row with, when the caller
    /// already knows them (transfer destinations carry the source's dates).
    /// Otherwise they are derived from the batch code.
    pub carried_dates: Option<(Option<NaiveDate>, Option<NaiveDate>)>,
    pub actor: Uuid,
}

/// Before/after stock for an applied mutation
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct StockChange {
    pub previous_stock: i32,
    pub new_stock: i32,
    #[serde(skip)]
    pub movement_id: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct LockedRow {
    current_stock: i32,
    production_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
}

/// Apply one stock mutation: lock and read the current inventory row,
/// compute the new stock, append the movement record, upsert the inventory
/// row. Runs entirely on the caller's transaction; a failure rolls back
/// both writes together.
pub async fn apply_movement(
    conn: &mut PgConnection,
    mutation: StockMutation,
) -> AppResult<StockChange> {
    let existing = sqlx::query_as::<_, LockedRow>(
        r#"
        SELECT current_stock, production_date, expiry_date
        FROM inventory
        WHERE product_id = $1 AND location_id = $2 AND batch_code = $3
        FOR UPDATE
        "#,
    )
    .bind(mutation.product_id)
    .bind(mutation.location_id)
    .bind(&mutation.batch_code)
    .fetch_optional(&mut *conn)
    .await?;

    let previous_stock = existing.as_ref().map(|r| r.current_stock).unwrap_or(0);

    // The recorded quantity is the audit delta for adjustments and the
    // caller-supplied quantity otherwise.
    let (new_stock, recorded_quantity) = match mutation.movement_type {
        MovementType::In => {
            if mutation.quantity < 0 {
                return Err(AppError::ValidationError(
                    "Inbound quantity cannot be negative".to_string(),
                ));
            }
            (previous_stock + mutation.quantity, mutation.quantity)
        }
        MovementType::Out => {
            if mutation.quantity < 0 {
                return Err(AppError::ValidationError(
                    "Outbound quantity cannot be negative".to_string(),
                ));
            }
            let new_stock = previous_stock - mutation.quantity;
            if new_stock < 0 {
                return Err(AppError::InsufficientStock {
                    available: previous_stock,
                    requested: mutation.quantity,
                });
            }
            (new_stock, mutation.quantity)
        }
        MovementType::Adjustment => {
            if mutation.quantity < 0 {
                return Err(AppError::ValidationError(
                    "Adjustment target cannot be negative".to_string(),
                ));
            }
            (mutation.quantity, mutation.quantity - previous_stock)
        }
        MovementType::Transfer => {
            let new_stock = previous_stock + mutation.quantity;
            if new_stock < 0 {
                return Err(AppError::InsufficientStock {
                    available: previous_stock,
                    requested: mutation.quantity.unsigned_abs() as i32,
                });
            }
            (new_stock, mutation.quantity)
        }
    };

    let movement_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO inventory_movements (
            product_id, location_id, batch_code, movement_type, quantity,
            previous_stock, new_stock, movement_date, notes,
            transfer_group_id, from_location_id, to_location_id, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(mutation.product_id)
    .bind(mutation.location_id)
    .bind(&mutation.batch_code)
    .bind(mutation.movement_type.as_str())
    .bind(recorded_quantity)
    .bind(previous_stock)
    .bind(new_stock)
    .bind(mutation.movement_date)
    .bind(&mutation.notes)
    .bind(mutation.transfer_group_id)
    .bind(mutation.from_location_id)
    .bind(mutation.to_location_id)
    .bind(mutation.actor)
    .fetch_one(&mut *conn)
    .await?;

    // Dates for a lazily created row: caller-carried, existing row's, or
    // derived from the batch code. Codes that predate the current format
    // leave the dates NULL rather than failing the movement.
    let (production_date, expiry_date) = match (&existing, mutation.carried_dates) {
        (Some(row), _) => (row.production_date, row.expiry_date),
        (None, Some(dates)) => dates,
        (None, None) => derive_batch_dates(&mutation.batch_code),
    };

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
    .bind(mutation.product_id)
    .bind(mutation.location_id)
    .bind(&mutation.batch_code)
    .bind(new_stock)
    .bind(production_date)
    .bind(expiry_date)
    .bind(mutation.actor)
    .execute(&mut *conn)
    .await?;

    Ok(StockChange {
        previous_stock,
        new_stock,
        movement_id,
    })
}

/// Lock and read the current stock and dates for a key, if the row exists.
pub async fn lock_inventory_row(
    conn: &mut PgConnection,
    product_id: Uuid,
    location_id: Uuid,
    batch_code: &str,
) -> AppResult<Option<(i32, Option<NaiveDate>, Option<NaiveDate>)>> {
    let row = sqlx::query_as::<_, LockedRow>(
        r#"
        SELECT current_stock, production_date, expiry_date
        FROM inventory
        WHERE product_id = $1 AND location_id = $2 AND batch_code = $3
        FOR UPDATE
        "#,
    )
    .bind(product_id)
    .bind(location_id)
    .bind(batch_code)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|r| (r.current_stock, r.production_date, r.expiry_date)))
}

/// Production and expiry dates derived from a batch code, when it parses.
pub fn derive_batch_dates(batch_code: &str) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match batch::parse_production_date(batch_code) {
        Ok(production) => (Some(production), Some(batch::compute_expiry_date(production))),
        Err(_) => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_dates_from_valid_codes() {
        let (production, expiry) = derive_batch_dates("4030");
        assert_eq!(production, NaiveDate::from_ymd_opt(2024, 1, 30));
        assert_eq!(expiry, NaiveDate::from_ymd_opt(2027, 1, 30));
    }

    #[test]
    fn unparseable_codes_leave_dates_empty() {
        assert_eq!(derive_batch_dates("LEGACY-01"), (None, None));
    }
}
