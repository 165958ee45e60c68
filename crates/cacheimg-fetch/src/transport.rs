use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{FetchError, FetchResult};

/// Default per-request timeout for [`HttpTransport`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the raw bytes behind a resource identifier.
///
/// A non-success status must surface as [`FetchError::Status`]; the engine
/// treats every `Err` the same way (error marker plus fallback).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>>;
}

/// [`Transport`] over HTTP(S) using a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Transport with [`DEFAULT_TIMEOUT`].
    pub fn new() -> FetchResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cacheimg/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        debug!(url, "fetching image bytes");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("request to '{url}' failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("reading body of '{url}' failed: {e}")))?;
        debug!(url, bytes = bytes.len(), "fetched image bytes");
        Ok(bytes.to_vec())
    }
}
