//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every operation of the stock ledger, the alert engine and the order engine
/// reports failures through this enum. Infrastructure failures are folded into
/// `Storage` / `Conflict` at the service boundary so callers only ever match on
/// one taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The catalog has no item matching the given id or name.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// The item exists but has never been assigned to the location.
    #[error("no stock record for item {item} at {location}")]
    NoStockRecord { item: String, location: String },

    /// An outbound movement asked for more than is available.
    #[error("insufficient stock (available: {available}, requested: {requested})")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("alert not found: {0}")]
    AlertNotFound(String),

    /// A lifecycle operation was invoked from a state that does not permit it.
    #[error("cannot {action} from status '{from}'")]
    InvalidTransition { from: String, action: String },

    /// A value failed validation (e.g. non-positive quantity).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Stale version / optimistic concurrency failure.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The persistence boundary failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn item_not_found(item: impl core::fmt::Display) -> Self {
        Self::ItemNotFound(item.to_string())
    }

    pub fn no_stock_record(item: impl core::fmt::Display, location: impl core::fmt::Display) -> Self {
        Self::NoStockRecord {
            item: item.to_string(),
            location: location.to_string(),
        }
    }

    pub fn insufficient_stock(available: i64, requested: i64) -> Self {
        Self::InsufficientStock {
            available,
            requested,
        }
    }

    pub fn order_not_found(order: impl core::fmt::Display) -> Self {
        Self::OrderNotFound(order.to_string())
    }

    pub fn alert_not_found(alert: impl core::fmt::Display) -> Self {
        Self::AlertNotFound(alert.to_string())
    }

    pub fn invalid_transition(from: impl core::fmt::Display, action: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            action: action.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True for the "lookup missed" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ItemNotFound(_)
                | Self::NoStockRecord { .. }
                | Self::OrderNotFound(_)
                | Self::AlertNotFound(_)
        )
    }
}
