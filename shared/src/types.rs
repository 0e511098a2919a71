//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Kinds of stock movement recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    /// Quantity is the new absolute stock level, not a delta
    Adjustment,
    Transfer,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
            MovementType::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementType::In),
            "out" => Some(MovementType::Out),
            "adjustment" => Some(MovementType::Adjustment),
            "transfer" => Some(MovementType::Transfer),
            _ => None,
        }
    }
}

/// Lifecycle of a transfer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransferStatus::Pending),
            "approved" => Some(TransferStatus::Approved),
            "rejected" => Some(TransferStatus::Rejected),
            _ => None,
        }
    }

    /// Approved and rejected are terminal; no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full read/write, approves transfer requests
    Master,
    /// Write restricted to the assigned location, transfers by request only
    General,
    Readonly,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::General => "general",
            Role::Readonly => "readonly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "master" => Some(Role::Master),
            "general" => Some(Role::General),
            "readonly" => Some(Role::Readonly),
            _ => None,
        }
    }

    pub fn can_write(&self) -> bool {
        !matches!(self, Role::Readonly)
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, 200) as i64
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let per_page = pagination.limit() as u32;
        Self {
            page: pagination.page.max(1),
            per_page,
            total_items,
            total_pages: ((total_items + per_page as u64 - 1) / per_page as u64) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_type_round_trips() {
        for t in [
            MovementType::In,
            MovementType::Out,
            MovementType::Adjustment,
            MovementType::Transfer,
        ] {
            assert_eq!(MovementType::parse(t.as_str()), Some(t));
        }
        assert_eq!(MovementType::parse("purchase"), None);
    }

    #[test]
    fn terminal_transfer_states() {
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(TransferStatus::Approved.is_terminal());
        assert!(TransferStatus::Rejected.is_terminal());
    }

    #[test]
    fn readonly_cannot_write() {
        assert!(Role::Master.can_write());
        assert!(Role::General.can_write());
        assert!(!Role::Readonly.can_write());
    }

    #[test]
    fn pagination_offsets() {
        let p = Pagination {
            page: 3,
            per_page: 20,
        };
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);

        let meta = PaginationMeta::new(&p, 41);
        assert_eq!(meta.total_pages, 3);
    }
}
