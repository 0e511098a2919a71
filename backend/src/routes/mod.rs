//! Route definitions for the Cosmetic Inventory Management platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (login is public, the rest are protected)
        .nest("/auth", auth_routes())
        // Protected routes - user management
        .nest("/users", user_routes())
        // Protected routes - product catalog
        .nest("/products", product_routes())
        // Protected routes - locations
        .nest("/locations", location_routes())
        // Protected routes - inventory state, bulk updates, imports
        .nest("/inventory", inventory_routes())
        // Protected routes - movement ledger
        .nest("/movements", movement_routes())
        // Protected routes - transfers and transfer requests
        .nest("/transfers", transfer_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .merge(protected_auth_routes())
}

/// Authenticated profile routes
fn protected_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::me))
        .route("/me/alert-threshold", put(handlers::update_alert_threshold))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// User management routes (protected)
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_user))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route("/bulk", post(handlers::bulk_create_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Location routes (protected)
fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_locations))
        .route("/:location_id", get(handlers::get_location))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_inventory))
        .route("/summary", get(handlers::get_inventory_summary))
        .route("/low-stock", get(handlers::list_low_stock))
        .route("/expiring", get(handlers::list_expiring))
        .route("/bulk", put(handlers::bulk_update_inventory))
        .route("/import", post(handlers::bulk_import_inventory))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Movement ledger routes (protected)
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_movements).post(handlers::create_movement))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Transfer routes (protected)
fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_transfer))
        .route(
            "/requests",
            get(handlers::list_transfer_requests).post(handlers::create_transfer_request),
        )
        .route("/requests/:request_id", get(handlers::get_transfer_request))
        .route(
            "/requests/:request_id/process",
            post(handlers::process_transfer_request),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
