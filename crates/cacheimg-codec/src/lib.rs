//! Encoding and validation of inline image payloads.
//!
//! - [`encode`] turns raw image bytes into standard, padded base64 text.
//! - [`data_uri`] wraps that text as `data:image/<subtype>;base64,<text>`.
//! - [`is_usable`] / [`check`] decide whether a candidate string is a
//!   well-formed cached payload, and [`classify`] maps stored text onto an
//!   [`EntryState`](cacheimg_types::EntryState).
//!
//! Everything here is pure: no I/O, no shared state, deterministic for a
//! given input.

pub mod datauri;
pub mod encoder;
pub mod validate;

pub use datauri::{data_uri, payload_of, BASE64_MARKER, DATA_IMAGE_PREFIX};
pub use encoder::encode;
pub use validate::{check, classify, is_usable, Rejection};
