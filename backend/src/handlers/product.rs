//! HTTP handlers for the product catalog

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::{
    BulkCreateInput, BulkCreateResult, CreateProductInput, Product, ProductFilter, ProductService,
    UpdateProductInput,
};
use crate::AppState;
use shared::types::PaginatedResponse;

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let service = ProductService::new(state.db);
    let products = service.list(filter).await?;
    Ok(Json(products))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.db);
    let product = service.get(product_id).await?;
    Ok(Json(product))
}

/// Register a product (master only)
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    current_user.0.require_master()?;
    let service = ProductService::new(state.db);
    let product = service.create(input).await?;
    Ok(Json(product))
}

/// Update or rename a product (master only)
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    current_user.0.require_master()?;
    let service = ProductService::new(state.db);
    let product = service.update(product_id, input).await?;
    Ok(Json(product))
}

/// Deactivate a product (master only)
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    current_user.0.require_master()?;
    let service = ProductService::new(state.db);
    service.deactivate(product_id).await?;
    Ok(Json(()))
}

/// Register several products at once (master only)
pub async fn bulk_create_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkCreateInput>,
) -> AppResult<Json<BulkCreateResult>> {
    current_user.0.require_master()?;
    let service = ProductService::new(state.db);
    let result = service.bulk_create(input).await?;
    Ok(Json(result))
}
