use serde::{Deserialize, Serialize};

/// Stored marker for an entry whose fetch is in flight.
///
/// The leading `!` can never start a data-URI, so the marker cannot collide
/// with a cached payload.
pub const PENDING_SENTINEL: &str = "!pending";

/// Stored marker for an entry whose last fill attempt failed.
pub const ERROR_SENTINEL: &str = "!error";

/// Bare pending marker written by older stores; still recognized on read.
pub const LEGACY_PENDING: &str = "pending";

/// Bare error marker written by older stores; still recognized on read.
pub const LEGACY_ERROR: &str = "error";

/// Semantic state of a single cache entry.
///
/// Transitions: `Absent -> Pending -> {Cached | Error}`. `Cached` returns to
/// `Pending` only on a forced refresh; `Error` and `Unusable` are re-fetched
/// by any fill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum EntryState {
    /// No entry exists for the key.
    Absent,
    /// A fetch/encode cycle is in flight.
    Pending,
    /// A validated data-URI payload.
    Cached(String),
    /// The last attempt failed.
    Error,
    /// Text is present but is neither a sentinel nor a usable payload
    /// (truncated, corrupted, or written by something else).
    Unusable(String),
}

impl EntryState {
    /// Recognize a sentinel in stored text. Returns `None` for anything that
    /// is not a sentinel.
    pub fn from_sentinel(text: &str) -> Option<Self> {
        match text {
            PENDING_SENTINEL | LEGACY_PENDING => Some(Self::Pending),
            ERROR_SENTINEL | LEGACY_ERROR => Some(Self::Error),
            _ => None,
        }
    }

    /// Returns `true` if `text` is any pending or error marker.
    pub fn is_sentinel(text: &str) -> bool {
        Self::from_sentinel(text).is_some()
    }

    /// The text written to the store for this state. `Absent` has none.
    pub fn to_stored(&self) -> Option<String> {
        match self {
            Self::Absent => None,
            Self::Pending => Some(PENDING_SENTINEL.to_string()),
            Self::Error => Some(ERROR_SENTINEL.to_string()),
            Self::Cached(payload) => Some(payload.clone()),
            Self::Unusable(raw) => Some(raw.clone()),
        }
    }

    /// The cached payload, if this entry holds one.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Cached(payload) => Some(payload),
            _ => None,
        }
    }

    /// Short lowercase name of the state.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Pending => "pending",
            Self::Cached(_) => "cached",
            Self::Error => "error",
            Self::Unusable(_) => "unusable",
        }
    }
}
