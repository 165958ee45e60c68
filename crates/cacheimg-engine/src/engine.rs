use std::path::Path;
use std::sync::Arc;

use cacheimg_codec::{check, data_uri, is_usable};
use cacheimg_fetch::{CanvasEncoder, HttpTransport, ImageCanvas, Transport};
use cacheimg_store::{KeyValueStore, StoreAdapter, StoreError};
use cacheimg_types::{EntryState, MediaSubtype, StoreKey};
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, ConfigOverrides, DefaultImage};
use crate::error::EngineResult;
use crate::flight::SingleFlight;
use crate::outcome::{FillFailure, FillOutcome};
use crate::target::{ImageTarget, Target};

/// Fetches images, encodes them as data-URIs, and caches them in a
/// key-value store.
///
/// Each key moves `Absent -> Pending -> Cached | Error`. A fill never
/// fetches a key another fill has marked Pending.
pub struct CacheEngine {
    config: CacheConfig,
    store: StoreAdapter,
    transport: Arc<dyn Transport>,
    canvas: Option<Arc<dyn CanvasEncoder>>,
    flights: SingleFlight,
}

impl CacheEngine {
    /// An engine with the default configuration and no canvas encoder.
    pub fn new(store: Arc<dyn KeyValueStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: CacheConfig::default(),
            store: StoreAdapter::new(store),
            transport,
            canvas: None,
            flights: SingleFlight::new(),
        }
    }

    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_canvas(mut self, canvas: Arc<dyn CanvasEncoder>) -> Self {
        self.canvas = Some(canvas);
        self
    }

    /// Open the backend `config` names, fetching over HTTP and re-encoding
    /// with [`ImageCanvas`].
    pub fn open(config: CacheConfig, path: Option<&Path>) -> EngineResult<Self> {
        let store = config.backend()?.open(path)?;
        let transport = Arc::new(HttpTransport::new()?);
        Ok(Self::new(store, transport)
            .with_config(config)
            .with_canvas(Arc::new(ImageCanvas::new())))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &StoreAdapter {
        &self.store
    }

    /// Cache whatever `target` shows (or the `url` override) and point the
    /// target at the cached payload.
    ///
    /// Never returns an error: every failure becomes
    /// [`FillOutcome::Failed`] after the `fail` and `always` callbacks. A fill
    /// dropped mid-flight still runs `fail` with [`FillFailure::Cancelled`]
    /// and then `always`.
    pub async fn fill(&self, target: &dyn Target, overrides: &ConfigOverrides) -> FillOutcome {
        let config = self.config.merge(overrides);
        let completion = config.callbacks.begin();

        let outcome = match resolve_identifier(target, &config) {
            None => FillOutcome::Failed(FillFailure::NoIdentifier),
            Some(identifier) => {
                let outcome = self.attempt(target, &config, &identifier).await;
                if outcome.failure().is_some_and(FillFailure::is_fetch_failure) {
                    self.fall_back(target, &config, &identifier).await;
                }
                outcome
            }
        };

        report(&config, &outcome);
        completion.finish(&outcome);
        outcome
    }

    /// Cache `url` through a hidden, throwaway target.
    pub async fn cache_url(&self, url: &str, overrides: &ConfigOverrides) -> FillOutcome {
        let target = ImageTarget::transient();
        let overrides = ConfigOverrides {
            url: Some(url.to_string()),
            ..overrides.clone()
        };
        self.fill(&target, &overrides).await
    }

    async fn attempt(
        &self,
        target: &dyn Target,
        config: &CacheConfig,
        identifier: &str,
    ) -> FillOutcome {
        if let Some(shown) = target.current_source().filter(|s| is_usable(s, true)) {
            debug!(identifier, "already displaying cached image");
            return FillOutcome::Cached(shown);
        }

        let key = StoreKey::new(config.storage_prefix.as_str(), identifier);
        let entry = match self.store.entry(&key) {
            Ok(entry) => entry,
            Err(e) => return store_failure(&key, e),
        };
        match entry {
            EntryState::Cached(payload) if !config.force_save => {
                debug!(key = %key, "cache hit");
                target.apply(&payload);
                target.remember_source(identifier);
                return FillOutcome::Cached(payload);
            }
            EntryState::Pending => {
                debug!(key = %key, "caching already in progress");
                return FillOutcome::Failed(FillFailure::InFlight);
            }
            _ => {}
        }

        target.clear();
        let Some(subtype) = MediaSubtype::from_identifier(identifier) else {
            debug!(identifier, "not a cacheable image type");
            return FillOutcome::Failed(FillFailure::UnsupportedType(identifier.to_string()));
        };

        // Claim and mark Pending before the first await.
        let Some(_guard) = self.flights.try_acquire(&key) else {
            debug!(key = %key, "caching already in progress");
            return FillOutcome::Failed(FillFailure::InFlight);
        };
        target.remember_source(identifier);
        if let Err(e) = self.store.set_state(&key, &EntryState::Pending) {
            return store_failure(&key, e);
        }

        let payload = match self.encode_remote(identifier, subtype, config).await {
            Ok(payload) => payload,
            Err(failure) => {
                warn!(key = %key, error = %failure, "caching failed");
                self.mark_error(&key);
                return FillOutcome::Failed(failure);
            }
        };

        if let Err(rejection) = check(&payload, true) {
            warn!(key = %key, error = %rejection, "encoded payload rejected");
            self.mark_error(&key);
            return FillOutcome::Failed(FillFailure::InvalidPayload(rejection.to_string()));
        }

        if let Err(e) = self.store.set_state(&key, &EntryState::Cached(payload.clone())) {
            if let Err(release) = self.store.set_state(&key, &EntryState::Absent) {
                warn!(key = %key, error = %release, "could not release pending mark");
            }
            return store_failure(&key, e);
        }
        target.apply(&payload);
        if target.is_transient() {
            target.remove();
        }
        FillOutcome::Cached(payload)
    }

    async fn encode_remote(
        &self,
        url: &str,
        subtype: MediaSubtype,
        config: &CacheConfig,
    ) -> Result<String, FillFailure> {
        let bytes = self
            .transport
            .fetch(url)
            .await
            .map_err(|e| FillFailure::Transport(e.to_string()))?;
        debug!(identifier = url, subtype = %subtype, bytes = bytes.len(), "fetched");

        match &self.canvas {
            Some(canvas) if config.encode_on_canvas && subtype.canvas_safe() => canvas
                .encode(&bytes, subtype)
                .map_err(|e| FillFailure::InvalidPayload(e.to_string())),
            _ => Ok(data_uri(subtype, &bytes)),
        }
    }

    /// Show the default image after a failed fetch. A remote default gets a
    /// single fill of its own that never falls back again.
    async fn fall_back(&self, target: &dyn Target, config: &CacheConfig, identifier: &str) {
        match config.default_image() {
            None => {}
            Some(DefaultImage::Inline(payload)) => target.apply(&payload),
            Some(DefaultImage::Remote(url)) => {
                if url == identifier {
                    return;
                }
                let nested = config.for_default(&url);
                target.clear();
                let outcome = self.attempt(target, &nested, &url).await;
                if let FillOutcome::Failed(reason) = outcome {
                    debug!(identifier = %url, error = %reason, "default image unavailable");
                }
            }
        }
    }

    fn mark_error(&self, key: &StoreKey) {
        if let Err(e) = self.store.set_state(key, &EntryState::Error) {
            warn!(key = %key, error = %e, "could not record failure");
        }
    }
}

impl std::fmt::Debug for CacheEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEngine")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("canvas", &self.canvas.is_some())
            .finish()
    }
}

/// The `url` override (clearing the target), else what the target shows,
/// else what it showed before it was cached.
fn resolve_identifier(target: &dyn Target, config: &CacheConfig) -> Option<String> {
    if let Some(url) = config.url.as_deref().filter(|u| !u.is_empty()) {
        target.clear();
        return Some(url.to_string());
    }
    target
        .current_source()
        .or_else(|| target.original_source())
        .filter(|s| !s.is_empty())
}

fn store_failure(key: &StoreKey, e: StoreError) -> FillOutcome {
    warn!(key = %key, error = %e, "store failure");
    FillOutcome::Failed(FillFailure::Store(e.to_string()))
}

fn report(config: &CacheConfig, outcome: &FillOutcome) {
    let url = config.url.as_deref().unwrap_or("");
    match outcome {
        FillOutcome::Cached(payload) if config.debug => {
            info!(url, bytes = payload.len(), "image cached")
        }
        FillOutcome::Cached(payload) => debug!(url, bytes = payload.len(), "image cached"),
        FillOutcome::Failed(reason) if config.debug => info!(url, error = %reason, "fill failed"),
        FillOutcome::Failed(reason) => debug!(url, error = %reason, "fill failed"),
    }
}
