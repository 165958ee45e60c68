use crate::error::StoreResult;

/// Flat, string-keyed, string-valued persistent namespace.
///
/// This is the host storage primitive the cache is built on. Implementations
/// must satisfy:
/// - Single-key reads and writes are atomic.
/// - `set` is a blind overwrite; there is no merge.
/// - `key(i)` for `i < len()` enumerates every key exactly once, but the
///   order may change whenever an entry is added or removed. Callers that
///   mutate while enumerating must snapshot first (see [`keys`](Self::keys)).
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`. Returns `Ok(None)` if absent.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// The key at position `index` in the current enumeration order.
    fn key(&self, index: usize) -> StoreResult<Option<String>>;

    /// Number of entries currently stored.
    fn len(&self) -> StoreResult<usize>;

    /// Returns `true` if the store holds no entries.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of every key currently stored.
    ///
    /// Default implementation walks `key(0..len)`. Backends may override
    /// with a single locked pass.
    fn keys(&self) -> StoreResult<Vec<String>> {
        let len = self.len()?;
        let mut keys = Vec::with_capacity(len);
        for index in 0..len {
            if let Some(key) = self.key(index)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}
