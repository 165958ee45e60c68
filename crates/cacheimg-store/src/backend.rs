use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::file::FileStore;
use crate::memory::InMemoryStore;
use crate::traits::KeyValueStore;

/// Default file name used by the persistent backend.
pub const DEFAULT_STORE_FILE: &str = "cacheimg-store.json";

/// Storage backend named by the `storageDB` option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// Volatile, process-local.
    Memory,
    /// Persistent JSON file (`localStorage` or `file`).
    File,
}

impl StorageBackend {
    /// Open the backend. `path` is required for [`StorageBackend::File`]
    /// and ignored otherwise.
    pub fn open(&self, path: Option<&Path>) -> StoreResult<Arc<dyn KeyValueStore>> {
        match self {
            Self::Memory => Ok(Arc::new(InMemoryStore::new())),
            Self::File => {
                let path: PathBuf = path
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_FILE));
                Ok(Arc::new(FileStore::open(path)?))
            }
        }
    }
}

impl FromStr for StorageBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "localStorage" | "file" => Ok(Self::File),
            other => Err(StoreError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File => write!(f, "localStorage"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_selectors() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("localStorage".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("file".parse::<StorageBackend>().unwrap(), StorageBackend::File);
    }

    #[test]
    fn unknown_selector_is_error() {
        let err = "indexedDB".parse::<StorageBackend>().unwrap_err();
        assert!(matches!(err, StoreError::UnknownBackend(name) if name == "indexedDB"));
    }

    #[test]
    fn open_memory() {
        let store = StorageBackend::Memory.open(None).unwrap();
        store.set("a", "1").unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn open_file_at_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");
        let store = StorageBackend::File.open(Some(&path)).unwrap();
        store.set("a", "1").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for backend in [StorageBackend::Memory, StorageBackend::File] {
            assert_eq!(backend.to_string().parse::<StorageBackend>().unwrap(), backend);
        }
    }
}
