//! Location-to-location transfers and the transfer-approval workflow
//!
//! A transfer is two ledger movements sharing one transfer group id: a
//! signed decrement at the source and an increment at the destination,
//! committed in a single transaction. The approval workflow defers the same
//! execution behind a pending request that a master user approves or
//! rejects exactly once.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::{business_today, ledger};
use shared::types::{MovementType, PaginatedResponse, Pagination, PaginationMeta, TransferStatus};

/// Transfer service for direct transfers and transfer requests
#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
    utc_offset_hours: i32,
}

/// Input for a direct transfer
#[derive(Debug, Deserialize)]
pub struct TransferInput {
    pub product_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub batch_code: String,
    pub quantity: i32,
    pub movement_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Result of a completed transfer
#[derive(Debug, Serialize)]
pub struct TransferResult {
    pub message: String,
    pub transfer_group_id: Uuid,
    pub from_new_stock: i32,
    pub to_new_stock: i32,
}

/// Input for creating a transfer request
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequestInput {
    pub product_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub batch_code: String,
    pub quantity: i32,
    pub reason: Option<String>,
}

/// Action on a pending transfer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    Approve,
    Reject,
}

/// Input for processing a transfer request
#[derive(Debug, Deserialize)]
pub struct ProcessRequestInput {
    pub action: RequestAction,
    /// Recorded on rejection; omitting it stores no reason
    pub rejection_reason: Option<String>,
}

/// Result of processing a request
#[derive(Debug, Serialize)]
pub struct ProcessResult {
    pub message: String,
}

/// A transfer request with display names joined in
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransferRequest {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub from_location_id: Uuid,
    pub from_location_name: String,
    pub to_location_id: Uuid,
    pub to_location_name: String,
    pub batch_code: String,
    pub quantity: i32,
    pub reason: Option<String>,
    pub status: String,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
    pub approved_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// Filters for the request listing
#[derive(Debug, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<TransferStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, sqlx::FromRow)]
struct PendingRequestRow {
    product_id: Uuid,
    from_location_id: Uuid,
    to_location_id: Uuid,
    batch_code: String,
    quantity: i32,
    status: String,
}

const REQUEST_COLUMNS: &str = r#"
    SELECT r.id, r.product_id, p.name AS product_name,
           r.from_location_id, lf.name AS from_location_name,
           r.to_location_id, lt.name AS to_location_name,
           r.batch_code, r.quantity, r.reason, r.status,
           r.requested_by, r.requested_at,
           r.approved_by, r.rejection_reason, r.processed_at
    FROM transfer_requests r
    JOIN products p ON p.id = r.product_id
    JOIN locations lf ON lf.id = r.from_location_id
    JOIN locations lt ON lt.id = r.to_location_id
"#;

impl TransferService {
    /// Create a new TransferService instance
    pub fn new(db: PgPool, utc_offset_hours: i32) -> Self {
        Self {
            db,
            utc_offset_hours,
        }
    }

    /// Move stock between two locations in one transaction.
    pub async fn transfer(&self, actor: Uuid, input: TransferInput) -> AppResult<TransferResult> {
        self.validate_transfer_shape(
            input.from_location_id,
            input.to_location_id,
            input.quantity,
            &input.batch_code,
        )?;

        let (from_name, to_name) = self
            .resolve_locations(input.from_location_id, input.to_location_id)
            .await?;
        self.ensure_product_exists(input.product_id).await?;

        let movement_date = input
            .movement_date
            .unwrap_or_else(|| business_today(self.utc_offset_hours));

        let mut tx = self.db.begin().await?;

        let (group_id, from_change, to_change) = execute_transfer_legs(
            &mut tx,
            TransferLegs {
                product_id: input.product_id,
                from_location_id: input.from_location_id,
                to_location_id: input.to_location_id,
                batch_code: &input.batch_code,
                quantity: input.quantity,
                movement_date,
                notes: input.notes.as_deref(),
                from_name: &from_name,
                to_name: &to_name,
                actor,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(TransferResult {
            message: format!(
                "Transferred {} from {} to {}",
                input.quantity, from_name, to_name
            ),
            transfer_group_id: group_id,
            from_new_stock: from_change.new_stock,
            to_new_stock: to_change.new_stock,
        })
    }

    /// Record a pending transfer request.
    ///
    /// Source stock is checked now as a courtesy to the requester; it is
    /// re-validated at approval time because stock may move in between.
    pub async fn create_request(
        &self,
        actor: Uuid,
        input: CreateTransferRequestInput,
    ) -> AppResult<TransferRequest> {
        self.validate_transfer_shape(
            input.from_location_id,
            input.to_location_id,
            input.quantity,
            &input.batch_code,
        )?;

        self.resolve_locations(input.from_location_id, input.to_location_id)
            .await?;
        self.ensure_product_exists(input.product_id).await?;

        let available = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT current_stock FROM inventory
            WHERE product_id = $1 AND location_id = $2 AND batch_code = $3
            "#,
        )
        .bind(input.product_id)
        .bind(input.from_location_id)
        .bind(&input.batch_code)
        .fetch_optional(&self.db)
        .await?
        .unwrap_or(0);

        if available < input.quantity {
            return Err(AppError::InsufficientStock {
                available,
                requested: input.quantity,
            });
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO transfer_requests (
                product_id, from_location_id, to_location_id,
                batch_code, quantity, reason, status, requested_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
            RETURNING id
            "#,
        )
        .bind(input.product_id)
        .bind(input.from_location_id)
        .bind(input.to_location_id)
        .bind(&input.batch_code)
        .bind(input.quantity)
        .bind(&input.reason)
        .bind(actor)
        .fetch_one(&self.db)
        .await?;

        self.get_request(id).await
    }

    /// Approve or reject a pending request. Terminal states never
    /// transition again; a second process attempt fails without touching
    /// stock.
    pub async fn process_request(
        &self,
        actor: Uuid,
        request_id: Uuid,
        input: ProcessRequestInput,
    ) -> AppResult<ProcessResult> {
        let mut tx = self.db.begin().await?;

        let request = sqlx::query_as::<_, PendingRequestRow>(
            r#"
            SELECT product_id, from_location_id, to_location_id,
                   batch_code, quantity, status
            FROM transfer_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Transfer request".to_string()))?;

        if TransferStatus::parse(&request.status)
            .map(|s| s.is_terminal())
            .unwrap_or(true)
        {
            return Err(AppError::AlreadyProcessed(format!(
                "Transfer request has already been {}",
                request.status
            )));
        }

        let message = match input.action {
            RequestAction::Approve => {
                let (from_name, to_name) = self
                    .resolve_locations(request.from_location_id, request.to_location_id)
                    .await?;

                execute_transfer_legs(
                    &mut tx,
                    TransferLegs {
                        product_id: request.product_id,
                        from_location_id: request.from_location_id,
                        to_location_id: request.to_location_id,
                        batch_code: &request.batch_code,
                        quantity: request.quantity,
                        movement_date: business_today(self.utc_offset_hours),
                        notes: None,
                        from_name: &from_name,
                        to_name: &to_name,
                        actor,
                    },
                )
                .await?;

                sqlx::query(
                    r#"
                    UPDATE transfer_requests
                    SET status = 'approved', approved_by = $1, processed_at = NOW()
                    WHERE id = $2
                    "#,
                )
                .bind(actor)
                .bind(request_id)
                .execute(&mut *tx)
                .await?;

                "Transfer request approved".to_string()
            }
            RequestAction::Reject => {
                // Blank reasons are stored as no reason at all.
                let reason = input
                    .rejection_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string);

                sqlx::query(
                    r#"
                    UPDATE transfer_requests
                    SET status = 'rejected', rejection_reason = $1, processed_at = NOW()
                    WHERE id = $2
                    "#,
                )
                .bind(&reason)
                .bind(request_id)
                .execute(&mut *tx)
                .await?;

                "Transfer request rejected".to_string()
            }
        };

        tx.commit().await?;

        Ok(ProcessResult { message })
    }

    /// Get a single transfer request.
    pub async fn get_request(&self, request_id: Uuid) -> AppResult<TransferRequest> {
        let sql = format!("{} WHERE r.id = $1", REQUEST_COLUMNS);
        sqlx::query_as::<_, TransferRequest>(&sql)
            .bind(request_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Transfer request".to_string()))
    }

    /// List transfer requests, newest first.
    pub async fn list_requests(
        &self,
        filter: RequestFilter,
    ) -> AppResult<PaginatedResponse<TransferRequest>> {
        let pagination = Pagination {
            page: filter.page.unwrap_or(1),
            per_page: filter.per_page.unwrap_or(Pagination::default().per_page),
        };
        let status = filter.status.map(|s| s.as_str().to_string());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transfer_requests WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(&status)
        .fetch_one(&self.db)
        .await?;

        let sql = format!(
            r#"{}
            WHERE ($1::text IS NULL OR r.status = $1)
            ORDER BY r.requested_at DESC, r.id DESC
            LIMIT $2 OFFSET $3
            "#,
            REQUEST_COLUMNS
        );
        let requests = sqlx::query_as::<_, TransferRequest>(&sql)
            .bind(&status)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            data: requests,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    fn validate_transfer_shape(
        &self,
        from: Uuid,
        to: Uuid,
        quantity: i32,
        batch_code: &str,
    ) -> AppResult<()> {
        if from == to {
            return Err(AppError::Validation {
                field: "to_location_id".to_string(),
                message: "Source and destination locations must differ".to_string(),
            });
        }
        if quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity must be positive".to_string(),
            });
        }
        if batch_code.trim().is_empty() {
            return Err(AppError::Validation {
                field: "batch_code".to_string(),
                message: "Batch code is required".to_string(),
            });
        }
        Ok(())
    }

    async fn resolve_locations(&self, from: Uuid, to: Uuid) -> AppResult<(String, String)> {
        let from_name = sqlx::query_scalar::<_, String>("SELECT name FROM locations WHERE id = $1")
            .bind(from)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Source location".to_string()))?;

        let to_name = sqlx::query_scalar::<_, String>("SELECT name FROM locations WHERE id = $1")
            .bind(to)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Destination location".to_string()))?;

        Ok((from_name, to_name))
    }

    async fn ensure_product_exists(&self, product_id: Uuid) -> AppResult<()> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(product_id)
                .fetch_one(&self.db)
                .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound("Product".to_string()))
        }
    }
}

/// Parameters for the two legs of a transfer
struct TransferLegs<'a> {
    product_id: Uuid,
    from_location_id: Uuid,
    to_location_id: Uuid,
    batch_code: &'a str,
    quantity: i32,
    movement_date: NaiveDate,
    notes: Option<&'a str>,
    from_name: &'a str,
    to_name: &'a str,
    actor: Uuid,
}

/// Execute both legs of a transfer on the caller's transaction.
///
/// Shared by the direct operation and the approval path; both record a
/// source decrement then a destination increment under one freshly minted
/// transfer group id. The destination row, if created here, inherits the
/// source row's production and expiry dates since they share a batch.
async fn execute_transfer_legs(
    conn: &mut PgConnection,
    legs: TransferLegs<'_>,
) -> AppResult<(Uuid, ledger::StockChange, ledger::StockChange)> {
    let source = ledger::lock_inventory_row(
        conn,
        legs.product_id,
        legs.from_location_id,
        legs.batch_code,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Source inventory".to_string()))?;

    let (available, production_date, expiry_date) = source;
    if available < legs.quantity {
        return Err(AppError::InsufficientStock {
            available,
            requested: legs.quantity,
        });
    }

    let group_id = Uuid::new_v4();
    let source_notes = legs
        .notes
        .map(str::to_string)
        .unwrap_or_else(|| format!("Transferred to {}", legs.to_name));
    let dest_notes = legs
        .notes
        .map(str::to_string)
        .unwrap_or_else(|| format!("Transferred from {}", legs.from_name));

    let from_change = ledger::apply_movement(
        conn,
        ledger::StockMutation {
            product_id: legs.product_id,
            location_id: legs.from_location_id,
            batch_code: legs.batch_code.to_string(),
            movement_type: MovementType::Transfer,
            quantity: -legs.quantity,
            movement_date: legs.movement_date,
            notes: Some(source_notes),
            transfer_group_id: Some(group_id),
            from_location_id: Some(legs.from_location_id),
            to_location_id: Some(legs.to_location_id),
            carried_dates: None,
            actor: legs.actor,
        },
    )
    .await?;

    let to_change = ledger::apply_movement(
        conn,
        ledger::StockMutation {
            product_id: legs.product_id,
            location_id: legs.to_location_id,
            batch_code: legs.batch_code.to_string(),
            movement_type: MovementType::Transfer,
            quantity: legs.quantity,
            movement_date: legs.movement_date,
            notes: Some(dest_notes),
            transfer_group_id: Some(group_id),
            from_location_id: Some(legs.from_location_id),
            to_location_id: Some(legs.to_location_id),
            carried_dates: Some((production_date, expiry_date)),
            actor: legs.actor,
        },
    )
    .await?;

    Ok((group_id, from_change, to_change))
}
