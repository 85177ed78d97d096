//! Inventory domain module: catalog, stock ledger rules and alert engine.
//!
//! This crate contains business rules for inventory, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Serialisation of
//! mutations, persistence and notifications live in `gymops-infra`.

pub mod alert;
pub mod catalog;
pub mod events;
pub mod stock;

pub use alert::{evaluate, Alert, AlertDecision, AlertType, Severity};
pub use catalog::{current_versions, find_current_by_name, Item, NewItem};
pub use events::{InventoryEvent, StockMoved};
pub use stock::{Direction, Movement, MovementType, StockEntry, StockKey};
