use std::sync::Arc;

use cacheimg_codec::classify;
use cacheimg_types::{EntryState, StoreKey};
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::KeyValueStore;

/// Namespaced gateway between the cache engine and a [`KeyValueStore`].
///
/// Every read and write the engine performs goes through here. Keys are
/// always `<prefix>:<identifier>`; values are raw text or an [`EntryState`]
/// rendered with its unambiguous sentinel encoding.
#[derive(Clone)]
pub struct StoreAdapter {
    store: Arc<dyn KeyValueStore>,
}

impl StoreAdapter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn inner(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Raw stored text for `key`.
    pub fn get(&self, key: &StoreKey) -> StoreResult<Option<String>> {
        self.store.get(&key.to_string())
    }

    /// Stored text for `key`, classified.
    pub fn entry(&self, key: &StoreKey) -> StoreResult<EntryState> {
        let raw = self.get(key)?;
        Ok(classify(raw.as_deref()))
    }

    /// Blind overwrite of `key` with `value`.
    pub fn set(&self, key: &StoreKey, value: &str) -> StoreResult<()> {
        self.store.set(&key.to_string(), value)
    }

    /// Write a state. `Absent` removes the entry.
    pub fn set_state(&self, key: &StoreKey, state: &EntryState) -> StoreResult<()> {
        debug!(key = %key, state = state.label(), "store write");
        match state.to_stored() {
            Some(text) => self.set(key, &text),
            None => self.remove(&key.to_string()),
        }
    }

    /// Snapshot of every key in `prefix`'s namespace.
    ///
    /// The list is fully materialized before returning, so callers may
    /// remove entries while walking it.
    pub fn list_keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|k| StoreKey::in_namespace(k, prefix))
            .collect())
    }

    /// Remove a full textual key.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        self.store.remove(key)
    }
}

impl std::fmt::Debug for StoreAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAdapter")
            .field("entry_count", &self.store.len().unwrap_or(0))
            .finish()
    }
}
