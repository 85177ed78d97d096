//! Infrastructure layer: persistence, services, configuration.
//!
//! The domain crates decide; this crate stores, serializes access per key,
//! and wires the pieces into [`InventoryFacade`].

pub mod catalog;
pub mod config;
pub mod facade;
pub mod ledger;
pub mod locks;
pub mod notify;
pub mod orders;
pub mod repository;
pub mod seed;


pub use catalog::CatalogService;
pub use config::{AppConfig, ConfigError, InventoryConfig, StoreBackend};
pub use facade::{ConsumptionReport, InventoryFacade};
pub use ledger::{AlertPolicy, LedgerOutcome, StockLedger, TransferOutcome};
pub use notify::{BusNotifier, LogNotifier, Notification, Notifier, NotifyError};
pub use orders::OrderEngine;
pub use repository::{Repository, RepositoryError, Stores};
