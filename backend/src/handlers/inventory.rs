//! HTTP handlers for inventory queries, bulk updates, and imports

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::AuthService;
use crate::services::import::{BulkImportInput, ImportOutcome, ImportService};
use crate::services::inventory::{
    BulkUpdateInput, BulkUpdateResult, ExpiringItem, InventoryFilter, InventoryItem,
    InventoryService, LocationSummary,
};
use crate::AppState;
use shared::types::PaginatedResponse;

/// List current inventory rows
pub async fn list_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<InventoryFilter>,
) -> AppResult<Json<PaginatedResponse<InventoryItem>>> {
    let service = InventoryService::new(state.db, state.config.inventory.utc_offset_hours);
    let items = service.list_inventory(filter).await?;
    Ok(Json(items))
}

/// Stock totals per location
pub async fn get_inventory_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<LocationSummary>>> {
    let service = InventoryService::new(state.db, state.config.inventory.utc_offset_hours);
    let summary = service.get_summary().await?;
    Ok(Json(summary))
}

/// Rows at or below the caller's alert threshold
pub async fn list_low_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let auth = AuthService::new(state.db.clone(), &state.config);
    let profile = auth.get_user(current_user.0.user_id).await?;

    let service = InventoryService::new(state.db, state.config.inventory.utc_offset_hours);
    let items = service.list_low_stock(profile.alert_threshold).await?;
    Ok(Json(items))
}

/// Rows expired or expiring within 90 days
pub async fn list_expiring(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<ExpiringItem>>> {
    let service = InventoryService::new(state.db, state.config.inventory.utc_offset_hours);
    let items = service.list_expiring().await?;
    Ok(Json(items))
}

/// Apply absolute stock corrections from the edit grid
pub async fn bulk_update_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkUpdateInput>,
) -> AppResult<Json<BulkUpdateResult>> {
    for item in &input.items {
        current_user.0.require_location_access(item.location_id)?;
    }

    let service = InventoryService::new(state.db, state.config.inventory.utc_offset_hours);
    let result = service.bulk_update(current_user.0.user_id, input).await?;
    Ok(Json(result))
}

/// Import externally prepared stock rows (master only)
pub async fn bulk_import_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkImportInput>,
) -> AppResult<Response> {
    current_user.0.require_master()?;

    let service = ImportService::new(state.db, state.config.inventory.utc_offset_hours);
    let outcome = service.bulk_import(current_user.0.user_id, input).await?;

    // Row-level validation failures come back as one 400 carrying every error.
    let status = match &outcome {
        ImportOutcome::Inserted { .. } => StatusCode::OK,
        ImportOutcome::Invalid { .. } => StatusCode::BAD_REQUEST,
    };
    Ok((status, Json(outcome)).into_response())
}
