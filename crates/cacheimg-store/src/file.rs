use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

/// Key-value store persisted as a single JSON object on disk.
///
/// The whole map is loaded on [`open`](Self::open) and rewritten after every
/// mutation. Writes go to a temporary file in the same directory which is
/// then renamed over the target, so a crash mid-write leaves the previous
/// document intact.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or create) a store file at `path`.
    ///
    /// A missing or empty file yields an empty store. A file that is not a
    /// JSON object of strings is rejected rather than overwritten.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| StoreError::CorruptFile {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), entries = entries.len(), "opened file store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, map: &BTreeMap<String, String>) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, map)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        let previous = map.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&map) {
            // Memory must keep matching the file.
            match previous {
                Some(old) => map.insert(key.to_string(), old),
                None => map.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(old) = map.remove(key) {
            if let Err(e) = self.persist(&map) {
                map.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    fn key(&self, index: usize) -> StoreResult<Option<String>> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.keys().nth(index).cloned())
    }

    fn len(&self) -> StoreResult<usize> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.len())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.keys().cloned().collect())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("entry_count", &self.len().unwrap_or(0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("store.json")
    }

    #[test]
    fn open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(store_path(&dir)).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        {
            let store = FileStore::open(&path).unwrap();
            store.set("cached:a.png", "data:image/png;base64,AA==").unwrap();
            store.set("other", "x").unwrap();
        }
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 2);
        assert_eq!(
            reopened.get("cached:a.png").unwrap().as_deref(),
            Some("data:image/png;base64,AA==")
        );
    }

    #[test]
    fn removal_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let store = FileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        store.remove("a").unwrap();
        drop(store);
        assert!(FileStore::open(&path).unwrap().is_empty().unwrap());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("store.json");
        let store = FileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        fs::write(&path, "").unwrap();
        assert!(FileStore::open(&path).unwrap().is_empty().unwrap());
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        fs::write(&path, "[1, 2, 3]").unwrap();
        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::CorruptFile { .. }));
        // The original content is untouched.
        assert_eq!(fs::read_to_string(&path).unwrap(), "[1, 2, 3]");
    }

    /// Replace the store file with a non-empty directory so the next
    /// rename over it fails.
    fn block_writes(path: &Path) {
        if path.exists() {
            fs::remove_file(path).unwrap();
        }
        fs::create_dir(path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();
    }

    #[test]
    fn failed_set_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let store = FileStore::open(&path).unwrap();
        block_writes(&path);

        assert!(store.set("cached:a.png", "!pending").is_err());
        assert_eq!(store.get("cached:a.png").unwrap(), None);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn failed_overwrite_restores_previous_value() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let store = FileStore::open(&path).unwrap();
        store.set("cached:a.png", "!error").unwrap();
        block_writes(&path);

        assert!(store.set("cached:a.png", "!pending").is_err());
        assert_eq!(store.get("cached:a.png").unwrap().as_deref(), Some("!error"));
    }

    #[test]
    fn failed_remove_keeps_entry() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let store = FileStore::open(&path).unwrap();
        store.set("cached:a.png", "!pending").unwrap();
        block_writes(&path);

        assert!(store.remove("cached:a.png").is_err());
        assert_eq!(store.get("cached:a.png").unwrap().as_deref(), Some("!pending"));
    }

    #[test]
    fn file_is_plain_json_object() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let store = FileStore::open(&path).unwrap();
        store.set("cached:x.gif", "!pending").unwrap();
        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("cached:x.gif").map(String::as_str), Some("!pending"));
    }
}
