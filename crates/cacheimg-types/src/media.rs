use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Image subtypes that can be cached.
///
/// The subtype is derived from the identifier's file extension and becomes
/// the `<subtype>` segment of `data:image/<subtype>;base64,`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSubtype {
    Jpeg,
    Png,
    Gif,
}

impl MediaSubtype {
    /// Derive the subtype from the final extension of an identifier.
    ///
    /// Matching is case-insensitive and `jpg` maps to `jpeg`. The extension
    /// must end the identifier, so query strings or fragments make it
    /// uncacheable.
    ///
    /// # Examples
    ///
    /// ```
    /// use cacheimg_types::MediaSubtype;
    ///
    /// assert_eq!(MediaSubtype::from_identifier("http://x/a.JPG"), Some(MediaSubtype::Jpeg));
    /// assert_eq!(MediaSubtype::from_identifier("http://x/a.png?v=2"), None);
    /// ```
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let (_, ext) = identifier.rsplit_once('.')?;
        ext.parse().ok()
    }

    /// The lowercase subtype name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    /// Full mime type, e.g. `image/png`.
    pub fn mime(&self) -> String {
        format!("image/{}", self.as_str())
    }

    /// Whether bitmap re-encoding may be used for this subtype.
    ///
    /// Animated GIFs lose their frames when drawn to a bitmap.
    pub fn canvas_safe(&self) -> bool {
        !matches!(self, Self::Gif)
    }
}

impl FromStr for MediaSubtype {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            _ => Err(TypesError::UnsupportedSubtype(s.to_string())),
        }
    }
}

impl fmt::Display for MediaSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
