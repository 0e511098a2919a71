//! HTTP handlers for stock movements

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::movement::{
    CreateMovementInput, Movement, MovementFilter, MovementResult, MovementService,
};
use crate::AppState;
use shared::types::PaginatedResponse;

/// Record a single in/out/adjustment movement
pub async fn create_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMovementInput>,
) -> AppResult<Json<MovementResult>> {
    current_user.0.require_location_access(input.location_id)?;

    let service = MovementService::new(state.db, state.config.inventory.utc_offset_hours);
    let result = service.create_movement(current_user.0.user_id, input).await?;
    Ok(Json(result))
}

/// List movement history
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<MovementFilter>,
) -> AppResult<Json<PaginatedResponse<Movement>>> {
    let service = MovementService::new(state.db, state.config.inventory.utc_offset_hours);
    let movements = service.list_movements(filter).await?;
    Ok(Json(movements))
}
