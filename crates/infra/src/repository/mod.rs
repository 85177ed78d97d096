//! Persistence boundary for the inventory domain.
//!
//! Services never touch storage directly: they go through [`Repository`] for
//! records and [`OrderNumberSequence`] for order numbering. Both come bundled
//! in [`Stores`] so a whole backend can be swapped in one place.

use core::fmt::{Debug, Display};
use core::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use gymops_core::{AlertId, DomainError, ExpectedVersion, ItemId, MovementId, OrderId};
use gymops_inventory::{Alert, Item, Movement, StockEntry, StockKey};
use gymops_replenishment::InternalOrder;

mod in_memory;
#[cfg(feature = "postgres")]
mod postgres;
mod scope;

pub use in_memory::{InMemoryOrderSequence, InMemoryRepository};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresOrderSequence, PostgresRepository, PostgresStores};
pub use scope::Scope;

/// A value the repository can store, keyed by `Key` and guarded by `version`.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Key: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Table / collection name.
    const KIND: &'static str;

    fn key(&self) -> Self::Key;

    fn version(&self) -> u64;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{kind} {key}: expected version {expected:?}, found {actual}")]
    Conflict {
        kind: &'static str,
        key: String,
        expected: ExpectedVersion,
        actual: u64,
    },

    #[error("{kind} {key} already exists")]
    Duplicate { kind: &'static str, key: String },

    #[error("{kind} {key} does not exist")]
    Missing { kind: &'static str, key: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { .. } | RepositoryError::Duplicate { .. } => {
                DomainError::conflict(err.to_string())
            }
            RepositoryError::Missing { .. } | RepositoryError::Backend(_) => {
                DomainError::storage(err.to_string())
            }
        }
    }
}

/// Filter for [`Repository::list`] that keeps everything.
pub fn all_records<V>(_: &V) -> bool {
    true
}

/// Keyed record storage with optimistic concurrency on update.
///
/// Listings return records in insertion order.
pub trait Repository<V: Record>: Send + Sync {
    fn get(&self, key: &V::Key) -> Result<Option<V>, RepositoryError>;

    fn list(&self, filter: &dyn Fn(&V) -> bool) -> Result<Vec<V>, RepositoryError> {
        self.list_scoped(&Scope::new(), filter)
    }

    /// Records whose stored body matches `scope` and that pass `filter`.
    fn list_scoped(&self, scope: &Scope, filter: &dyn Fn(&V) -> bool) -> Result<Vec<V>, RepositoryError>;

    /// Store a new record. Fails with `Duplicate` if the key is taken.
    fn insert(&self, value: V) -> Result<(), RepositoryError>;

    /// Replace an existing record if the stored version matches `expected`.
    fn update(&self, value: V, expected: ExpectedVersion) -> Result<(), RepositoryError>;
}

impl<V, R> Repository<V> for Arc<R>
where
    V: Record,
    R: Repository<V> + ?Sized,
{
    fn get(&self, key: &V::Key) -> Result<Option<V>, RepositoryError> {
        (**self).get(key)
    }

    fn list(&self, filter: &dyn Fn(&V) -> bool) -> Result<Vec<V>, RepositoryError> {
        (**self).list(filter)
    }

    fn list_scoped(&self, scope: &Scope, filter: &dyn Fn(&V) -> bool) -> Result<Vec<V>, RepositoryError> {
        (**self).list_scoped(scope, filter)
    }

    fn insert(&self, value: V) -> Result<(), RepositoryError> {
        (**self).insert(value)
    }

    fn update(&self, value: V, expected: ExpectedVersion) -> Result<(), RepositoryError> {
        (**self).update(value, expected)
    }
}

/// Source of order numbers. Every call yields a value greater than all
/// previous ones, across concurrent callers.
pub trait OrderNumberSequence: Send + Sync {
    fn next_value(&self) -> Result<u64, RepositoryError>;
}

/// Every store the services need, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub items: Arc<dyn Repository<Item>>,
    pub stock: Arc<dyn Repository<StockEntry>>,
    pub movements: Arc<dyn Repository<Movement>>,
    pub alerts: Arc<dyn Repository<Alert>>,
    pub orders: Arc<dyn Repository<InternalOrder>>,
    pub order_numbers: Arc<dyn OrderNumberSequence>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            items: Arc::new(InMemoryRepository::<Item>::new()),
            stock: Arc::new(InMemoryRepository::<StockEntry>::new()),
            movements: Arc::new(InMemoryRepository::<Movement>::new()),
            alerts: Arc::new(InMemoryRepository::<Alert>::new()),
            orders: Arc::new(InMemoryRepository::<InternalOrder>::new()),
            order_numbers: Arc::new(InMemoryOrderSequence::new()),
        }
    }
}

impl Record for Item {
    type Key = ItemId;
    const KIND: &'static str = "items";

    fn key(&self) -> ItemId {
        self.id
    }

    // Catalog versions are new records, never updates.
    fn version(&self) -> u64 {
        1
    }
}

impl Record for StockEntry {
    type Key = StockKey;
    const KIND: &'static str = "stock_entries";

    fn key(&self) -> StockKey {
        StockEntry::key(self)
    }

    fn version(&self) -> u64 {
        StockEntry::version(self)
    }
}

impl Record for Movement {
    type Key = MovementId;
    const KIND: &'static str = "movements";

    fn key(&self) -> MovementId {
        self.id
    }

    fn version(&self) -> u64 {
        1
    }
}

impl Record for Alert {
    type Key = AlertId;
    const KIND: &'static str = "alerts";

    fn key(&self) -> AlertId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Record for InternalOrder {
    type Key = OrderId;
    const KIND: &'static str = "orders";

    fn key(&self) -> OrderId {
        self.id_typed()
    }

    fn version(&self) -> u64 {
        gymops_core::AggregateRoot::version(self)
    }
}
