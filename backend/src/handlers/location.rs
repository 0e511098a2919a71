//! HTTP handlers for locations

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::location::{Location, LocationService};
use crate::AppState;

/// List active locations
pub async fn list_locations(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Location>>> {
    let service = LocationService::new(state.db);
    let locations = service.list().await?;
    Ok(Json(locations))
}

/// Get a location
pub async fn get_location(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<Location>> {
    let service = LocationService::new(state.db);
    let location = service.get(location_id).await?;
    Ok(Json(location))
}
