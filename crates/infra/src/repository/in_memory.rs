use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use gymops_core::ExpectedVersion;

use super::{OrderNumberSequence, Record, RepositoryError, Repository, Scope};

/// In-memory repository for tests/dev.
///
/// Keeps a row vector for insertion order plus a key index into it.
#[derive(Debug)]
pub struct InMemoryRepository<V: Record> {
    inner: RwLock<Rows<V>>,
}

#[derive(Debug)]
struct Rows<V: Record> {
    rows: Vec<V>,
    index: HashMap<V::Key, usize>,
}

impl<V: Record> InMemoryRepository<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Rows {
                rows: Vec::new(),
                index: HashMap::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|r| r.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Record> Default for InMemoryRepository<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Backend("in-memory repository lock poisoned".to_string())
}

impl<V: Record> Repository<V> for InMemoryRepository<V> {
    fn get(&self, key: &V::Key) -> Result<Option<V>, RepositoryError> {
        let guard = self.inner.read().map_err(|_| poisoned())?;
        Ok(guard.index.get(key).map(|&i| guard.rows[i].clone()))
    }

    fn list_scoped(&self, scope: &Scope, filter: &dyn Fn(&V) -> bool) -> Result<Vec<V>, RepositoryError> {
        let guard = self.inner.read().map_err(|_| poisoned())?;
        let mut out = Vec::new();
        for value in guard.rows.iter().filter(|v| filter(v)) {
            // Scopes are checked against the serialized body, same as the SQL backend sees it.
            if !scope.is_empty() {
                let body = serde_json::to_value(value).map_err(|e| RepositoryError::Backend(e.to_string()))?;
                if !scope.matches(&body) {
                    continue;
                }
            }
            out.push(value.clone());
        }
        Ok(out)
    }

    fn insert(&self, value: V) -> Result<(), RepositoryError> {
        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        let key = value.key();
        if guard.index.contains_key(&key) {
            return Err(RepositoryError::Duplicate {
                kind: V::KIND,
                key: key.to_string(),
            });
        }
        let position = guard.rows.len();
        guard.rows.push(value);
        guard.index.insert(key, position);
        Ok(())
    }

    fn update(&self, value: V, expected: ExpectedVersion) -> Result<(), RepositoryError> {
        let mut guard = self.inner.write().map_err(|_| poisoned())?;
        let key = value.key();
        let Some(&position) = guard.index.get(&key) else {
            return Err(RepositoryError::Missing {
                kind: V::KIND,
                key: key.to_string(),
            });
        };

        let actual = guard.rows[position].version();
        if !expected.matches(actual) {
            return Err(RepositoryError::Conflict {
                kind: V::KIND,
                key: key.to_string(),
                expected,
                actual,
            });
        }

        guard.rows[position] = value;
        Ok(())
    }
}

/// Process-local order numbering, starting at 1.
#[derive(Debug)]
pub struct InMemoryOrderSequence {
    last: AtomicU64,
}

impl InMemoryOrderSequence {
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Resume numbering after `last` (e.g. the highest number already issued).
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }
}

impl Default for InMemoryOrderSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderNumberSequence for InMemoryOrderSequence {
    fn next_value(&self) -> Result<u64, RepositoryError> {
        Ok(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymops_core::{ItemId, Location};
    use gymops_inventory::StockEntry;
    use std::sync::Arc;

    fn entry(loc: &str) -> StockEntry {
        StockEntry::open(ItemId::new(), Location::new(loc).unwrap(), 5, None).unwrap()
    }

    #[test]
    fn insert_rejects_duplicate_keys() {
        let repo = InMemoryRepository::<StockEntry>::new();
        let e = entry("centro_sevilla");

        repo.insert(e.clone()).unwrap();
        let err = repo.insert(e).unwrap_err();

        assert!(matches!(err, RepositoryError::Duplicate { kind: "stock_entries", .. }));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn update_checks_expected_version() {
        let repo = InMemoryRepository::<StockEntry>::new();
        let e = entry("centro_sevilla");
        repo.insert(e.clone()).unwrap();

        let reserved = e.with_thresholds(3, Some(10)).unwrap();
        repo.update(reserved.clone(), ExpectedVersion::Exact(1)).unwrap();

        // A writer still holding version 1 loses.
        let stale = e.with_thresholds(1, None).unwrap();
        let err = repo.update(stale, ExpectedVersion::Exact(1)).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { actual: 2, .. }));

        assert_eq!(repo.get(&e.key()).unwrap(), Some(reserved));
    }

    #[test]
    fn update_of_unknown_key_fails() {
        let repo = InMemoryRepository::<StockEntry>::new();
        let err = repo.update(entry("x"), ExpectedVersion::Any).unwrap_err();
        assert!(matches!(err, RepositoryError::Missing { .. }));
    }

    #[test]
    fn list_keeps_insertion_order_and_filters() {
        let repo = InMemoryRepository::<StockEntry>::new();
        let names = ["b", "a", "c", "a"];
        for n in names {
            repo.insert(entry(n)).unwrap();
        }

        let all: Vec<String> = repo
            .list(&|_| true)
            .unwrap()
            .iter()
            .map(|e| e.location().to_string())
            .collect();
        assert_eq!(all, vec!["b", "a", "c", "a"]);

        let only_a = repo.list(&|e| e.location().as_str() == "a").unwrap();
        assert_eq!(only_a.len(), 2);
    }

    #[test]
    fn scoped_listing_matches_serialized_fields() {
        let repo = InMemoryRepository::<StockEntry>::new();
        let sevilla = entry("centro_sevilla");
        repo.insert(sevilla.clone()).unwrap();
        repo.insert(entry("centro_malaga")).unwrap();
        repo.insert(entry("centro_sevilla")).unwrap();

        let scope = Scope::new().field("location", "centro_sevilla");
        assert_eq!(repo.list_scoped(&scope, &|_| true).unwrap().len(), 2);

        let one = Scope::new()
            .field("location", "centro_sevilla")
            .field("item_id", sevilla.item_id());
        assert_eq!(repo.list_scoped(&one, &|_| true).unwrap(), vec![sevilla]);

        let filtered = repo.list_scoped(&scope, &|e| e.min_stock() > 5).unwrap();
        assert!(filtered.is_empty());
    }

    #[test]
    fn sequence_is_unique_under_contention() {
        let seq = Arc::new(InMemoryOrderSequence::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = seq.clone();
                std::thread::spawn(move || (0..100).map(|_| seq.next_value().unwrap()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 800);
        assert_eq!(all.first(), Some(&1));
        assert_eq!(all.last(), Some(&800));
    }
}
