//! Middleware for the Cosmetic Inventory Management platform

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
