//! Domain events and their distribution.
//!
//! - `Event`: the contract every domain event implements
//! - `EventBus` / `InMemoryEventBus`: fire-and-forget fan-out to subscribers
//! - `execute`: decide-then-apply helper for aggregates

pub mod bus;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
