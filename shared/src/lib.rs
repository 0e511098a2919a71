//! Shared types for the Cosmetic Inventory Management platform
//!
//! This crate contains domain logic that does not touch the database:
//! the batch-code interpreter, common enums, and input validation helpers.

pub mod batch;
pub mod types;
pub mod validation;

pub use batch::*;
pub use types::*;
pub use validation::*;
