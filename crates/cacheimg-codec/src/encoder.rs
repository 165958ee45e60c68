use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode raw bytes as standard, padded base64 with no line wrapping.
///
/// # Examples
///
/// ```
/// use cacheimg_codec::encode;
///
/// assert_eq!(encode(b""), "");
/// assert_eq!(encode(b"f"), "Zg==");
/// assert_eq!(encode(b"fo"), "Zm8=");
/// assert_eq!(encode(b"foo"), "Zm9v");
/// ```
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // RFC 4648 section 10 test vectors.
    #[test]
    fn rfc4648_vectors() {
        let vectors: [(&[u8], &str); 7] = [
            (b"", ""),
            (b"f", "Zg=="),
            (b"fo", "Zm8="),
            (b"foo", "Zm9v"),
            (b"foob", "Zm9vYg=="),
            (b"fooba", "Zm9vYmE="),
            (b"foobar", "Zm9vYmFy"),
        ];
        for (input, expected) in vectors {
            assert_eq!(encode(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn uses_plus_and_slash() {
        assert_eq!(encode(&[0xfb, 0xff]), "+/8=");
        assert_eq!(encode(&[0xff, 0xff, 0xff]), "////");
    }

    #[test]
    fn no_line_wrapping_for_long_input() {
        let data = vec![0xa5u8; 3000];
        let text = encode(&data);
        assert_eq!(text.len(), 4000);
        assert!(!text.contains('\n'));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn png_signature() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
        assert_eq!(encode(&png_header), "iVBORw0KGgo=");
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let text = encode(&bytes);
            let decoded = STANDARD.decode(&text).unwrap();
            prop_assert_eq!(decoded, bytes);
        }

        #[test]
        fn output_length_is_padded(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let text = encode(&bytes);
            prop_assert_eq!(text.len() % 4, 0);
            prop_assert_eq!(text.len(), bytes.len().div_ceil(3) * 4);
        }

        #[test]
        fn deterministic(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            prop_assert_eq!(encode(&bytes), encode(&bytes));
        }
    }
}
