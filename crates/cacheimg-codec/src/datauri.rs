use cacheimg_types::MediaSubtype;

use crate::encoder::encode;

/// Every cached payload starts with this.
pub const DATA_IMAGE_PREFIX: &str = "data:image";

/// Separates the mime segment from the base64 text.
pub const BASE64_MARKER: &str = ";base64,";

/// Build `data:image/<subtype>;base64,<encoded bytes>`.
pub fn data_uri(subtype: MediaSubtype, bytes: &[u8]) -> String {
    format!(
        "{DATA_IMAGE_PREFIX}/{}{BASE64_MARKER}{}",
        subtype.as_str(),
        encode(bytes)
    )
}

/// The base64 text of an image data-URI, or `None` if `uri` does not start
/// with `data:image` followed somewhere by `;base64,`.
///
/// The marker is searched only after the `data:image` prefix, and the text
/// after its first occurrence is returned as is (possibly empty).
pub fn payload_of(uri: &str) -> Option<&str> {
    let rest = uri.strip_prefix(DATA_IMAGE_PREFIX)?;
    let at = rest.find(BASE64_MARKER)?;
    Some(&rest[at + BASE64_MARKER.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_uri_with_subtype() {
        assert_eq!(data_uri(MediaSubtype::Png, b"foo"), "data:image/png;base64,Zm9v");
        assert_eq!(data_uri(MediaSubtype::Jpeg, b""), "data:image/jpeg;base64,");
    }

    #[test]
    fn payload_isolated_after_marker() {
        assert_eq!(payload_of("data:image/gif;base64,R0lGOD"), Some("R0lGOD"));
        assert_eq!(payload_of("data:image/png;base64,"), Some(""));
    }

    #[test]
    fn payload_requires_prefix_and_marker() {
        assert_eq!(payload_of("image/png;base64,Zm9v"), None);
        assert_eq!(payload_of("data:text/plain;base64,Zm9v"), None);
        assert_eq!(payload_of("data:image/png,Zm9v"), None);
        assert_eq!(payload_of("DATA:IMAGE/png;base64,Zm9v"), None);
    }

    #[test]
    fn first_marker_wins() {
        assert_eq!(
            payload_of("data:image/png;base64,;base64,Zm9v"),
            Some(";base64,Zm9v")
        );
    }
}
