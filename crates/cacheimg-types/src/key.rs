use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Prefix used when the caller does not configure one.
pub const DEFAULT_PREFIX: &str = "cached";

/// Separator between the namespace prefix and the resource identifier.
pub const KEY_SEPARATOR: char = ':';

/// Namespaced key of a single cache entry.
///
/// Rendered as `<prefix>:<identifier>`. The identifier is usually a URL and
/// may itself contain `:` characters; only the first separator after the
/// prefix is structural.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreKey {
    prefix: String,
    identifier: String,
}

impl StoreKey {
    /// Compose a key from a prefix and a resource identifier.
    pub fn new(prefix: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            identifier: identifier.into(),
        }
    }

    /// Parse a full key that is expected to live under `prefix`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheimg_types::StoreKey;
    ///
    /// let key = StoreKey::parse("cached:http://ex.com/a.png", "cached").unwrap();
    /// assert_eq!(key.identifier(), "http://ex.com/a.png");
    /// assert!(StoreKey::parse("other:x", "cached").is_err());
    /// ```
    pub fn parse(raw: &str, prefix: &str) -> Result<Self, TypesError> {
        let identifier = raw
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix(KEY_SEPARATOR))
            .ok_or_else(|| TypesError::InvalidKey {
                key: raw.to_string(),
                reason: format!("expected prefix {prefix:?}"),
            })?;
        Ok(Self::new(prefix, identifier))
    }

    /// The namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The resource identifier (typically a URL).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns `true` if `raw` is a key inside `prefix`'s namespace.
    pub fn in_namespace(raw: &str, prefix: &str) -> bool {
        raw.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(KEY_SEPARATOR))
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, KEY_SEPARATOR, self.identifier)
    }
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreKey({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_with_separator() {
        let key = StoreKey::new("cached", "http://ex.com/a.png");
        assert_eq!(key.to_string(), "cached:http://ex.com/a.png");
    }

    #[test]
    fn parse_keeps_colons_in_identifier() {
        let key = StoreKey::parse("cached:https://ex.com:8080/a.png", "cached").unwrap();
        assert_eq!(key.prefix(), "cached");
        assert_eq!(key.identifier(), "https://ex.com:8080/a.png");
    }

    #[test]
    fn parse_rejects_foreign_prefix() {
        let err = StoreKey::parse("other:x.png", "cached").unwrap_err();
        assert!(matches!(err, TypesError::InvalidKey { .. }));
    }

    #[test]
    fn parse_rejects_prefix_without_separator() {
        assert!(StoreKey::parse("cachedx.png", "cached").is_err());
    }

    #[test]
    fn namespace_check_requires_separator() {
        assert!(StoreKey::in_namespace("cached:a.png", "cached"));
        assert!(!StoreKey::in_namespace("cachedfoo:a.png", "cached"));
        assert!(!StoreKey::in_namespace("cached", "cached"));
        assert!(!StoreKey::in_namespace("other:a.png", "cached"));
    }

    #[test]
    fn debug_format() {
        let key = StoreKey::new("p", "i");
        assert_eq!(format!("{key:?}"), "StoreKey(p:i)");
    }

    #[test]
    fn serde_roundtrip() {
        let key = StoreKey::new("cached", "a.gif");
        let json = serde_json::to_string(&key).unwrap();
        let back: StoreKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
