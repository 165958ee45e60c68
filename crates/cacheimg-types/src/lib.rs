//! Foundation types for cacheimg.
//!
//! This crate provides the small vocabulary shared by every other cacheimg
//! crate: how store keys are composed, which states a cache entry can be in,
//! how those states are written as text, and which image subtypes can be
//! cached at all.
//!
//! # Key Types
//!
//! - [`StoreKey`] -- `<prefix>:<identifier>` key of a cache entry
//! - [`EntryState`] -- Absent / Pending / Cached / Error / Unusable
//! - [`MediaSubtype`] -- the image subtypes derived from an identifier's extension

pub mod entry;
pub mod error;
pub mod key;
pub mod media;

pub use entry::{EntryState, ERROR_SENTINEL, LEGACY_ERROR, LEGACY_PENDING, PENDING_SENTINEL};
pub use error::TypesError;
pub use key::{StoreKey, DEFAULT_PREFIX, KEY_SEPARATOR};
pub use media::MediaSubtype;
