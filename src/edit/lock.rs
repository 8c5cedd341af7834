use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::assets::storage::Scope;

/// Identity of a book for mutual exclusion: storage scope plus folder name.
pub type BookKey = (Scope, String);

/// Per-book mutexes, created on first use and dropped when no caller holds or waits on them.
///
/// Calls for the same `(scope, dir)` run one at a time; calls for different books never contend
/// beyond the short map lookup.
#[derive(Debug, Clone, Default)]
pub struct BookLocks {
    inner: Arc<Mutex<HashMap<BookKey, Arc<Mutex<()>>>>>,
}

impl BookLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: &BookKey, f: impl FnOnce() -> T) -> T {
        let entry = {
            let mut map = self.table();
            map.entry(key.clone()).or_default().clone()
        };

        let out = {
            // The guarded state lives on disk behind atomic renames; poisoning carries nothing.
            let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut map = self.table();
        // One reference in the map plus ours: nobody else is holding or waiting.
        if Arc::strong_count(&entry) == 2 {
            map.remove(key);
        }
        out
    }

    /// Number of books with a live lock entry.
    pub fn active(&self) -> usize {
        self.table().len()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<BookKey, Arc<Mutex<()>>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/lock.rs"]
mod tests;
