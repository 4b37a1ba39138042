//! Key-value store contract and the in-memory implementation.
//!
//! The session controller and the release note cards persist opaque JSON
//! values under string keys. Keys are namespaced by prefix so a full reset can
//! purge everything the tool wrote without touching unrelated entries.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use super::PersistenceError;

/// Prefix shared by every key the session controller writes.
pub const PERSISTED_PREFIX: &str = "persisted-";

/// Prefix shared by every key written by per-pull-request collaborators.
pub const DIFF_PREFIX: &str = "diff-";

/// Synchronous string-keyed storage.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the write fails. A failed write
    /// leaves the previous value in place.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Removes `key` if present.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the delete fails.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;

    /// Lists every stored key in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the backend cannot be read.
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;

    /// Removes every key starting with any of `prefixes` in one transaction
    /// and returns the number of removed entries.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the delete fails; no key is removed
    /// in that case.
    fn remove_prefixed(&self, prefixes: &[&str]) -> Result<usize, PersistenceError>;
}

/// Process-local store used for ephemeral runs and tests.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        operation: impl FnOnce(&mut BTreeMap<String, String>) -> T,
    ) -> Result<T, PersistenceError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(operation(&mut entries))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.with_entries(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.with_entries(|entries| {
            entries.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        self.with_entries(|entries| entries.keys().cloned().collect())
    }

    fn remove_prefixed(&self, prefixes: &[&str]) -> Result<usize, PersistenceError> {
        self.with_entries(|entries| {
            let before = entries.len();
            entries.retain(|key, _| !prefixes.iter().any(|prefix| key.starts_with(prefix)));
            before - entries.len()
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::{DIFF_PREFIX, KeyValueStore, MemoryKeyValueStore, PERSISTED_PREFIX};

    #[fixture]
    fn seeded_store() -> MemoryKeyValueStore {
        let store = MemoryKeyValueStore::new();
        for key in [
            "persisted-session",
            "diff-12-notes",
            "diff-40-notes",
            "theme",
        ] {
            store.set(key, "{}").expect("seed write should succeed");
        }
        store
    }

    #[rstest]
    fn set_replaces_existing_value() {
        let store = MemoryKeyValueStore::new();
        store.set("persisted-session", "1").expect("first write");
        store.set("persisted-session", "2").expect("second write");

        assert_eq!(
            store.get("persisted-session").expect("read should succeed"),
            Some("2".to_owned())
        );
    }

    #[rstest]
    fn remove_prefixed_only_touches_tracked_namespaces(seeded_store: MemoryKeyValueStore) {
        let removed = seeded_store
            .remove_prefixed(&[PERSISTED_PREFIX, DIFF_PREFIX])
            .expect("purge should succeed");

        assert_eq!(removed, 3);
        assert_eq!(
            seeded_store.keys().expect("keys should list"),
            vec!["theme".to_owned()]
        );
    }

    #[rstest]
    fn remove_prefixed_is_idempotent(seeded_store: MemoryKeyValueStore) {
        seeded_store
            .remove_prefixed(&[PERSISTED_PREFIX, DIFF_PREFIX])
            .expect("first purge should succeed");
        let removed = seeded_store
            .remove_prefixed(&[PERSISTED_PREFIX, DIFF_PREFIX])
            .expect("second purge should succeed");

        assert_eq!(removed, 0);
    }
}
