//! Cache-fill engine for inline image payloads.
//!
//! [`CacheEngine::fill`] looks an image up in the store, and on a miss
//! fetches it, encodes it as a `data:image/...;base64,` URI, validates the
//! result, stores it, and points the [`Target`] at it. Concurrent fills of
//! one key collapse to a single fetch; failed fetches fall back to a default
//! image at most one level deep.
//!
//! Bulk helpers ([`CacheEngine::purge`], [`CacheEngine::resolve_or_fallback`])
//! operate on whole namespaces of the store.

pub mod bulk;
pub mod config;
pub mod engine;
pub mod error;
pub mod flight;
pub mod outcome;
pub mod target;

pub use bulk::PurgeReport;
pub use config::{CacheConfig, Callbacks, ConfigOverrides, DefaultImage, BUILTIN_DEFAULT_IMAGE};
pub use engine::CacheEngine;
pub use error::{EngineError, EngineResult};
pub use flight::{FlightGuard, SingleFlight};
pub use outcome::{FillFailure, FillOutcome};
pub use target::{ImageTarget, Target, TargetKind};

// Re-export the types callers need alongside the engine.
pub use cacheimg_store::{KeyValueStore, StorageBackend, StoreAdapter};
pub use cacheimg_types::{EntryState, MediaSubtype, StoreKey};
