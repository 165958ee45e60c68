use std::io::Cursor;

use cacheimg_codec::data_uri;
use cacheimg_types::MediaSubtype;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// Re-encodes fetched image bytes through a decoded bitmap.
///
/// This is the "draw to canvas, read back a data-URI" path: the output is a
/// fresh encoding of the pixels rather than the original file. GIF is never
/// accepted since animation frames would be lost.
pub trait CanvasEncoder: Send + Sync {
    /// Decode `bytes` and return `data:image/<subtype>;base64,...`.
    fn encode(&self, bytes: &[u8], subtype: MediaSubtype) -> FetchResult<String>;
}

/// [`CanvasEncoder`] backed by the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageCanvas;

impl ImageCanvas {
    pub fn new() -> Self {
        Self
    }
}

impl CanvasEncoder for ImageCanvas {
    fn encode(&self, bytes: &[u8], subtype: MediaSubtype) -> FetchResult<String> {
        let format = match subtype {
            MediaSubtype::Png => ImageFormat::Png,
            MediaSubtype::Jpeg => ImageFormat::Jpeg,
            MediaSubtype::Gif => {
                return Err(FetchError::CanvasUnsupported(subtype.to_string()));
            }
        };

        let bitmap = image::load_from_memory(bytes)?;
        let (width, height) = (bitmap.width(), bitmap.height());
        if width == 0 || height == 0 {
            return Err(FetchError::Canvas("empty bitmap".into()));
        }

        // JPEG has no alpha channel.
        let bitmap = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(bitmap.to_rgb8()),
            _ => bitmap,
        };

        let mut out = Cursor::new(Vec::new());
        bitmap.write_to(&mut out, format)?;
        let encoded = out.into_inner();
        debug!(width, height, %subtype, bytes = encoded.len(), "canvas re-encode");
        Ok(data_uri(subtype, &encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cacheimg_codec::is_usable;
    use image::{Rgba, RgbaImage};

    fn tiny_png() -> Vec<u8> {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn png_reencodes_to_png_uri() {
        let uri = ImageCanvas.encode(&tiny_png(), MediaSubtype::Png).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(is_usable(&uri, true));
    }

    #[test]
    fn jpeg_drops_alpha() {
        let uri = ImageCanvas.encode(&tiny_png(), MediaSubtype::Jpeg).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert!(is_usable(&uri, true));
    }

    #[test]
    fn gif_is_refused() {
        let err = ImageCanvas.encode(&tiny_png(), MediaSubtype::Gif).unwrap_err();
        assert!(matches!(err, FetchError::CanvasUnsupported(_)));
    }

    #[test]
    fn garbage_bytes_fail() {
        let err = ImageCanvas
            .encode(b"definitely not an image", MediaSubtype::Png)
            .unwrap_err();
        assert!(matches!(err, FetchError::Image(_)));
    }
}
