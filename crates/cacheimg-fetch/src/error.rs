use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("canvas encoding failed: {0}")]
    Canvas(String),

    #[error("subtype {0} cannot be encoded on a canvas")]
    CanvasUnsupported(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type FetchResult<T> = Result<T, FetchError>;
