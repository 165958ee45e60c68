//! Collaborators that produce image bytes and bitmap re-encodings.
//!
//! - [`Transport`] fetches raw bytes for a URL; [`HttpTransport`] does it
//!   over HTTP with `reqwest`.
//! - [`CanvasEncoder`] decodes bytes to a bitmap and re-encodes them as a
//!   data-URI; [`ImageCanvas`] does it with the `image` crate.
//! - [`testing::StaticTransport`] answers from a scripted table.

pub mod canvas;
pub mod error;
pub mod testing;
pub mod transport;

pub use canvas::{CanvasEncoder, ImageCanvas};
pub use error::{FetchError, FetchResult};
pub use transport::{HttpTransport, Transport, DEFAULT_TIMEOUT};
