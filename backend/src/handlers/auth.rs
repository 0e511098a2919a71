//! HTTP handlers for authentication and user management

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, CreateUserInput, LoginInput, LoginResponse, UserInfo};
use crate::AppState;

/// Log in with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.login(input).await?;
    Ok(Json(response))
}

/// Get the current user's profile
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UserInfo>> {
    let service = AuthService::new(state.db, &state.config);
    let info = service.get_user(current_user.0.user_id).await?;
    Ok(Json(info))
}

/// Body for updating the alert threshold
#[derive(Debug, Deserialize)]
pub struct AlertThresholdInput {
    pub alert_threshold: i32,
}

/// Update the current user's low-stock alert threshold
pub async fn update_alert_threshold(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AlertThresholdInput>,
) -> AppResult<Json<UserInfo>> {
    let service = AuthService::new(state.db, &state.config);
    let info = service
        .update_alert_threshold(current_user.0.user_id, input.alert_threshold)
        .await?;
    Ok(Json(info))
}

/// Create a user (master only)
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<Json<UserInfo>> {
    current_user.0.require_master()?;
    let service = AuthService::new(state.db, &state.config);
    let info = service.create_user(input).await?;
    Ok(Json(info))
}
