//! Usability checks for cached payloads.
//!
//! A stored value is only ever served when it passes [`check`]:
//! - not empty, not a pending/error sentinel, not a bare `http` URL
//! - (optionally) shaped as `data:image...;base64,<payload>`
//! - the payload is non-empty and survives a strict decode followed by a
//!   re-encode unchanged
//!
//! The round-trip catches truncated writes and any stored text that only
//! looks like base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cacheimg_types::EntryState;
use thiserror::Error;
use tracing::trace;

use crate::datauri::{payload_of, DATA_IMAGE_PREFIX};
use crate::encoder::encode;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("empty value")]
    Empty,

    #[error("value is a pending or error marker")]
    Sentinel,

    #[error("value is a bare URL")]
    BareUrl,

    #[error("missing \"data:image\" prefix")]
    MissingDataPrefix,

    #[error("missing \";base64,\" marker")]
    MissingBase64Marker,

    #[error("no encoded payload")]
    EmptyPayload,

    #[error("invalid base64: {0}")]
    Undecodable(String),

    #[error("payload does not re-encode identically")]
    NotCanonical,
}

/// Check a candidate, returning the first reason it is unusable.
///
/// With `require_data_prefix` the candidate must be a full image data-URI;
/// without it the candidate is treated as bare base64 text.
pub fn check(candidate: &str, require_data_prefix: bool) -> Result<(), Rejection> {
    if candidate.is_empty() {
        return Err(Rejection::Empty);
    }
    if EntryState::is_sentinel(candidate) {
        return Err(Rejection::Sentinel);
    }
    if candidate.starts_with("http") {
        return Err(Rejection::BareUrl);
    }

    let payload = if require_data_prefix {
        if !candidate.starts_with(DATA_IMAGE_PREFIX) {
            return Err(Rejection::MissingDataPrefix);
        }
        payload_of(candidate).ok_or(Rejection::MissingBase64Marker)?
    } else {
        candidate
    };

    if payload.is_empty() {
        return Err(Rejection::EmptyPayload);
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Rejection::Undecodable(e.to_string()))?;
    if encode(&bytes) != payload {
        return Err(Rejection::NotCanonical);
    }
    Ok(())
}

/// Returns `true` if `candidate` may be served as a cached payload.
///
/// # Examples
///
/// ```
/// use cacheimg_codec::is_usable;
///
/// assert!(is_usable("data:image/png;base64,Zm9v", true));
/// assert!(!is_usable("image/png;base64,Zm9v", true));
/// assert!(!is_usable("http://x/y.png", false));
/// assert!(!is_usable("pending", false));
/// ```
pub fn is_usable(candidate: &str, require_data_prefix: bool) -> bool {
    match check(candidate, require_data_prefix) {
        Ok(()) => true,
        Err(reason) => {
            trace!(%reason, len = candidate.len(), "rejected cached value");
            false
        }
    }
}

/// Map raw stored text (or its absence) onto an [`EntryState`].
pub fn classify(stored: Option<&str>) -> EntryState {
    let Some(text) = stored else {
        return EntryState::Absent;
    };
    if let Some(state) = EntryState::from_sentinel(text) {
        return state;
    }
    if is_usable(text, true) {
        EntryState::Cached(text.to_string())
    } else {
        EntryState::Unusable(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacheimg_types::{ERROR_SENTINEL, PENDING_SENTINEL};
    use proptest::prelude::*;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn rejects_reserved_values() {
        assert!(!is_usable("", false));
        assert!(!is_usable("pending", false));
        assert!(!is_usable("error", false));
        assert!(!is_usable(PENDING_SENTINEL, false));
        assert!(!is_usable(ERROR_SENTINEL, false));
        assert!(!is_usable("http://x/y.png", false));
        assert!(!is_usable("https://x/y.png", true));
    }

    #[test]
    fn rejection_reasons() {
        assert_eq!(check("", true), Err(Rejection::Empty));
        assert_eq!(check("!pending", true), Err(Rejection::Sentinel));
        assert_eq!(check("http://x", true), Err(Rejection::BareUrl));
        assert_eq!(check("iVBORw0KGgo=", true), Err(Rejection::MissingDataPrefix));
        assert_eq!(
            check("data:image/png,iVBORw0KGgo=", true),
            Err(Rejection::MissingBase64Marker)
        );
        assert_eq!(check("data:image/png;base64,", true), Err(Rejection::EmptyPayload));
        assert!(matches!(
            check("data:image/png;base64,@@@@", true),
            Err(Rejection::Undecodable(_))
        ));
    }

    #[test]
    fn accepts_valid_data_uri() {
        assert!(is_usable(PNG_URI, true));
        assert_eq!(check(PNG_URI, true), Ok(()));
    }

    #[test]
    fn data_prefix_is_required_when_asked() {
        assert!(!is_usable("iVBORw0KGgo=", true));
        assert!(is_usable("iVBORw0KGgo=", false));
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        assert!(!is_usable("Data:image/png;base64,iVBORw0KGgo=", true));
        assert!(!is_usable("data:image/png;BASE64,iVBORw0KGgo=", true));
    }

    #[test]
    fn truncated_payload_rejected() {
        // Dropping the padding leaves a length that is not a multiple of 4.
        assert!(!is_usable("data:image/png;base64,iVBORw0KGgo", true));
        assert!(!is_usable("data:image/png;base64,iVBORw0KGg", true));
    }

    #[test]
    fn non_canonical_trailing_bits_rejected() {
        // "Zh==" decodes leniently to "f" but re-encodes as "Zg==".
        assert!(!is_usable("Zh==", false));
    }

    #[test]
    fn embedded_whitespace_rejected() {
        assert!(!is_usable("data:image/png;base64,iVBO Rw0KGgo=", true));
        assert!(!is_usable("data:image/png;base64,iVBORw0K\nGgo=", true));
    }

    #[test]
    fn classify_states() {
        assert_eq!(classify(None), EntryState::Absent);
        assert_eq!(classify(Some("!pending")), EntryState::Pending);
        assert_eq!(classify(Some("pending")), EntryState::Pending);
        assert_eq!(classify(Some("!error")), EntryState::Error);
        assert_eq!(classify(Some(PNG_URI)), EntryState::Cached(PNG_URI.into()));
        assert_eq!(
            classify(Some("data:image/png;base64,###")),
            EntryState::Unusable("data:image/png;base64,###".into())
        );
        assert_eq!(classify(Some("")), EntryState::Unusable(String::new()));
    }

    proptest! {
        #[test]
        fn encoded_bytes_always_usable(bytes in proptest::collection::vec(any::<u8>(), 1..256)) {
            let uri = crate::data_uri(cacheimg_types::MediaSubtype::Png, &bytes);
            prop_assert!(is_usable(&uri, true));
        }

        #[test]
        fn reencode_is_stable(bytes in proptest::collection::vec(any::<u8>(), 1..256)) {
            let payload = encode(&bytes);
            let reencoded = encode(&STANDARD.decode(&payload).unwrap());
            prop_assert_eq!(&reencoded, &payload);
            let reencoded_uri = format!("data:image/png;base64,{reencoded}");
            prop_assert!(is_usable(&reencoded_uri, true));
        }

        #[test]
        fn check_never_panics(s in ".*") {
            let _ = check(&s, true);
            let _ = check(&s, false);
        }
    }
}
