//! Business logic services for the Cosmetic Inventory Management platform

pub mod auth;
pub mod import;
pub mod inventory;
pub mod ledger;
pub mod location;
pub mod movement;
pub mod product;
pub mod transfer;

pub use auth::AuthService;
pub use import::ImportService;
pub use inventory::InventoryService;
pub use location::LocationService;
pub use movement::MovementService;
pub use product::ProductService;
pub use transfer::TransferService;

use chrono::{FixedOffset, NaiveDate, Utc};

/// Today's date in the business time zone, expressed as a fixed UTC offset.
/// Used to default movement dates when the caller does not supply one.
pub fn business_today(utc_offset_hours: i32) -> NaiveDate {
    let seconds = utc_offset_hours.clamp(-23, 23) * 3600;
    let offset = FixedOffset::east_opt(seconds).expect("offset within +/-23h");
    Utc::now().with_timezone(&offset).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_today_tolerates_extreme_offsets() {
        // Clamped rather than panicking on bad configuration.
        let _ = business_today(99);
        let _ = business_today(-99);
    }
}
