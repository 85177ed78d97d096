//! Per-key mutual exclusion.
//!
//! Callers working on the same key are serialized; different keys proceed in
//! parallel. Several keys are always acquired in sorted order.
//!
//! ```ignore
//! let set = locks.for_keys(&[key])?;
//! let _held = set.acquire()?;
//! // read, validate, write
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use gymops_core::DomainError;

#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

/// The mutexes for a sorted, de-duplicated set of keys.
#[derive(Debug)]
pub struct LockSet {
    slots: Vec<Arc<Mutex<()>>>,
}

impl LockSet {
    /// Block until every lock in the set is held.
    pub fn acquire(&self) -> Result<Vec<MutexGuard<'_, ()>>, DomainError> {
        self.slots
            .iter()
            .map(|slot| {
                slot.lock()
                    .map_err(|_| DomainError::storage("key lock poisoned"))
            })
            .collect()
    }
}

impl<K: Clone + Eq + Hash + Ord> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_keys(&self, keys: &[K]) -> Result<LockSet, DomainError> {
        let mut ordered: Vec<&K> = keys.iter().collect();
        ordered.sort();
        ordered.dedup();

        let mut table = self
            .slots
            .lock()
            .map_err(|_| DomainError::storage("lock table poisoned"))?;
        let slots = ordered
            .into_iter()
            .map(|k| table.entry(k.clone()).or_default().clone())
            .collect();

        Ok(LockSet { slots })
    }

    /// Number of keys that have ever been locked.
    pub fn tracked_keys(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::<&'static str>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let (locks, inside, max_seen) = (locks.clone(), inside.clone(), max_seen.clone());
                thread::spawn(move || {
                    let set = locks.for_keys(&["k"]).unwrap();
                    let _held = set.acquire().unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_keys_collapse_to_one_lock() {
        let locks = KeyedLocks::<u8>::new();
        let set = locks.for_keys(&[2, 1, 2]).unwrap();
        let held = set.acquire().unwrap();

        assert_eq!(held.len(), 2);
        assert_eq!(locks.tracked_keys(), 2);
    }

    #[test]
    fn opposite_orders_do_not_deadlock() {
        let locks = Arc::new(KeyedLocks::<u8>::new());
        let a = {
            let locks = locks.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let set = locks.for_keys(&[1, 2]).unwrap();
                    let _held = set.acquire().unwrap();
                }
            })
        };
        let b = {
            let locks = locks.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let set = locks.for_keys(&[2, 1]).unwrap();
                    let _held = set.acquire().unwrap();
                }
            })
        };
        a.join().unwrap();
        b.join().unwrap();
    }
}
