//! HTTP handlers for the Cosmetic Inventory Management platform

pub mod auth;
pub mod health;
pub mod inventory;
pub mod location;
pub mod movement;
pub mod product;
pub mod transfer;

pub use auth::*;
pub use health::*;
pub use inventory::*;
pub use location::*;
pub use movement::*;
pub use product::*;
pub use transfer::*;
