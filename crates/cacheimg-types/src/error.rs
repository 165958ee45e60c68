use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid store key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("unsupported media subtype: {0}")]
    UnsupportedSubtype(String),
}
