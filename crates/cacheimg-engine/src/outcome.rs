use std::fmt;

/// Why a fill did not end with a cached payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FillFailure {
    /// Neither the request nor the target named anything to cache.
    NoIdentifier,
    /// Another fill for the same key is already running.
    InFlight,
    /// The identifier's extension is not a cacheable image type.
    UnsupportedType(String),
    /// Non-success status or network failure.
    Transport(String),
    /// The encoded result failed validation.
    InvalidPayload(String),
    /// The store could not be read or written.
    Store(String),
    /// The fill was dropped before it finished.
    Cancelled,
}

impl FillFailure {
    /// Failures after a fetch was attempted. These leave the error marker in
    /// the store and trigger the default-image fallback.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidPayload(_))
    }
}

impl fmt::Display for FillFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIdentifier => write!(f, "no identifier to cache"),
            Self::InFlight => write!(f, "caching already in progress"),
            Self::UnsupportedType(id) => write!(f, "not a cacheable image type: {id}"),
            Self::Transport(reason) => write!(f, "fetch failed: {reason}"),
            Self::InvalidPayload(reason) => write!(f, "invalid payload: {reason}"),
            Self::Store(reason) => write!(f, "store failure: {reason}"),
            Self::Cancelled => write!(f, "fill cancelled"),
        }
    }
}

/// Result of one fill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FillOutcome {
    /// The target now shows this data-URI.
    Cached(String),
    Failed(FillFailure),
}

impl FillOutcome {
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Cached(payload) => Some(payload),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FillFailure> {
        match self {
            Self::Cached(_) => None,
            Self::Failed(reason) => Some(reason),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}
