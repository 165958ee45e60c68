//! Key-value storage for cached image payloads.
//!
//! The cache persists into a flat, string-keyed, string-valued namespace
//! modelled on browser local storage. This crate defines that primitive, a
//! couple of backends for it, and the namespaced adapter the engine uses.
//!
//! # Storage Backends
//!
//! All backends implement the [`KeyValueStore`] trait:
//!
//! - [`InMemoryStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FileStore`] -- JSON document on disk with atomic replace-on-write
//!
//! # Design Rules
//!
//! 1. One value per key; writes are blind overwrites.
//! 2. Keys are `<prefix>:<identifier>`, composed only via [`StoreAdapter`].
//! 3. Enumeration is snapshotted before any bulk removal.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod adapter;
pub mod backend;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use adapter::StoreAdapter;
pub use backend::{StorageBackend, DEFAULT_STORE_FILE};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use traits::KeyValueStore;
