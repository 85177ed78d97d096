//! Replenishment domain module (internal orders between locations).
//!
//! This crate contains the order state machine, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod order;
pub mod stats;

pub use order::{
    CancelOrder, CreateOrder, DeliverOrder, InternalOrder, OrderCommand, OrderCreated, OrderEvent,
    OrderLine, OrderNumber, OrderStatus, PaymentStatus, ProcessOrder, RecordPayment, ShipOrder,
};
pub use stats::OrderStats;
