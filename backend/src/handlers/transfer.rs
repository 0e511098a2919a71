//! HTTP handlers for transfers and transfer requests

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::transfer::{
    CreateTransferRequestInput, ProcessRequestInput, ProcessResult, RequestFilter,
    TransferInput, TransferRequest, TransferResult, TransferService,
};
use crate::AppState;
use shared::types::PaginatedResponse;

/// Execute a direct location-to-location transfer (master only)
pub async fn create_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<TransferInput>,
) -> AppResult<Json<TransferResult>> {
    current_user.0.require_master()?;

    let service = TransferService::new(state.db, state.config.inventory.utc_offset_hours);
    let result = service.transfer(current_user.0.user_id, input).await?;
    Ok(Json(result))
}

/// File a transfer request for later approval
pub async fn create_transfer_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTransferRequestInput>,
) -> AppResult<Json<TransferRequest>> {
    current_user.0.require_location_access(input.from_location_id)?;

    let service = TransferService::new(state.db, state.config.inventory.utc_offset_hours);
    let request = service.create_request(current_user.0.user_id, input).await?;
    Ok(Json(request))
}

/// Approve or reject a pending transfer request (master only)
pub async fn process_transfer_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(input): Json<ProcessRequestInput>,
) -> AppResult<Json<ProcessResult>> {
    current_user.0.require_master()?;

    let service = TransferService::new(state.db, state.config.inventory.utc_offset_hours);
    let result = service
        .process_request(current_user.0.user_id, request_id, input)
        .await?;
    Ok(Json(result))
}

/// Get a transfer request
pub async fn get_transfer_request(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<TransferRequest>> {
    let service = TransferService::new(state.db, state.config.inventory.utc_offset_hours);
    let request = service.get_request(request_id).await?;
    Ok(Json(request))
}

/// List transfer requests
pub async fn list_transfer_requests(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<RequestFilter>,
) -> AppResult<Json<PaginatedResponse<TransferRequest>>> {
    let service = TransferService::new(state.db, state.config.inventory.utc_offset_hours);
    let requests = service.list_requests(filter).await?;
    Ok(Json(requests))
}
