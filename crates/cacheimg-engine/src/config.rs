use std::fmt;
use std::path::Path;
use std::sync::Arc;

use cacheimg_codec::is_usable;
use cacheimg_store::StorageBackend;
use cacheimg_types::DEFAULT_PREFIX;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::outcome::{FillFailure, FillOutcome};

/// Built-in fallback image: a tiny blank JPEG.
pub const BUILTIN_DEFAULT_IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAgAAZABkAAD/7AARRHVja3kAAQAEAAAAHgAA/+4ADkFkb2JlAGTAAAAAAf/bAIQAEAsLCwwLEAwMEBcPDQ8XGxQQEBQbHxcXFxcXHx4XGhoaGhceHiMlJyUjHi8vMzMvL0BAQEBAQEBAQEBAQEBAQAERDw8RExEVEhIVFBEUERQaFBYWFBomGhocGhomMCMeHh4eIzArLicnJy4rNTUwMDU1QEA/QEBAQEBAQEBAQEBA/8AAEQgAZABkAwEiAAIRAQMRAf/EAEsAAQEAAAAAAAAAAAAAAAAAAAAFAQEAAAAAAAAAAAAAAAAAAAAAEAEAAAAAAAAAAAAAAAAAAAAAEQEAAAAAAAAAAAAAAAAAAAAA/9oADAMBAAIRAxEAPwCwAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAD//2Q==";

pub type HookFn = Arc<dyn Fn() + Send + Sync>;
pub type DoneFn = Arc<dyn Fn(&str) + Send + Sync>;
pub type FailFn = Arc<dyn Fn(&FillFailure) + Send + Sync>;

/// Completion hooks for a fill.
///
/// `start` runs when a fill begins. Exactly one of `done` or `fail` runs
/// when it ends, followed by `always`.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub start: Option<HookFn>,
    pub done: Option<DoneFn>,
    pub fail: Option<FailFn>,
    pub always: Option<HookFn>,
}

impl Callbacks {
    /// No hooks at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.start = Some(Arc::new(f));
        self
    }

    pub fn on_done(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.done = Some(Arc::new(f));
        self
    }

    pub fn on_fail(mut self, f: impl Fn(&FillFailure) + Send + Sync + 'static) -> Self {
        self.fail = Some(Arc::new(f));
        self
    }

    pub fn on_always(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.always = Some(Arc::new(f));
        self
    }

    /// Run `start` and return the guard that owes the completion hooks.
    pub(crate) fn begin(&self) -> Completion {
        if let Some(start) = &self.start {
            start();
        }
        Completion {
            callbacks: self.clone(),
            armed: true,
        }
    }

    /// Run `done`/`fail` for `outcome`, then `always`.
    fn finish(&self, outcome: &FillOutcome) {
        match outcome {
            FillOutcome::Cached(payload) => {
                if let Some(done) = &self.done {
                    done(payload);
                }
            }
            FillOutcome::Failed(reason) => {
                if let Some(fail) = &self.fail {
                    fail(reason);
                }
            }
        }
        if let Some(always) = &self.always {
            always();
        }
    }
}

/// Completion hooks still owed by a running fill.
///
/// Dropped without [`finish`](Self::finish), e.g. when the fill future is
/// cancelled, it reports [`FillFailure::Cancelled`].
pub(crate) struct Completion {
    callbacks: Callbacks,
    armed: bool,
}

impl Completion {
    pub(crate) fn finish(mut self, outcome: &FillOutcome) {
        self.armed = false;
        self.callbacks.finish(outcome);
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.armed {
            self.callbacks
                .finish(&FillOutcome::Failed(FillFailure::Cancelled));
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("start", &self.start.is_some())
            .field("done", &self.done.is_some())
            .field("fail", &self.fail.is_some())
            .field("always", &self.always.is_some())
            .finish()
    }
}

/// Fallback shown when a fill fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefaultImage {
    /// A ready data-URI, applied directly.
    Inline(String),
    /// A URL, cached under its own key on first use.
    Remote(String),
}

impl DefaultImage {
    /// Classify a configured value. Empty means no default.
    pub fn parse(value: &str) -> Option<Self> {
        if value.is_empty() {
            None
        } else if is_usable(value, true) {
            Some(Self::Inline(value.to_string()))
        } else {
            Some(Self::Remote(value.to_string()))
        }
    }
}

/// Configuration of the cache engine.
///
/// The engine holds one base value; each fill merges its
/// [`ConfigOverrides`] onto a copy. The base is never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    /// Report every fill outcome at `info` instead of `debug`.
    pub debug: bool,
    /// Data-URI or URL used when a fill fails. Empty disables fallback.
    pub default_image: String,
    /// Re-encode through a decoded bitmap instead of the raw bytes.
    pub encode_on_canvas: bool,
    /// Fetch even when a usable value is cached.
    pub force_save: bool,
    /// Storage backend selector, read once by [`CacheEngine::open`].
    ///
    /// [`CacheEngine::open`]: crate::CacheEngine::open
    #[serde(rename = "storageDB")]
    pub storage_db: String,
    /// Namespace prefix of every key.
    pub storage_prefix: String,
    /// Identifier to cache instead of the target's own source.
    pub url: Option<String>,
    #[serde(skip)]
    pub callbacks: Callbacks,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            debug: false,
            default_image: BUILTIN_DEFAULT_IMAGE.to_string(),
            encode_on_canvas: false,
            force_save: false,
            storage_db: "localStorage".to_string(),
            storage_prefix: DEFAULT_PREFIX.to_string(),
            url: None,
            callbacks: Callbacks::default(),
        }
    }
}

impl CacheConfig {
    /// Read the serializable fields from a TOML file. Missing fields keep
    /// their defaults.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| EngineError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// A copy with `overrides` applied.
    pub fn merge(&self, overrides: &ConfigOverrides) -> Self {
        let mut merged = self.clone();
        if let Some(debug) = overrides.debug {
            merged.debug = debug;
        }
        if let Some(default_image) = &overrides.default_image {
            merged.default_image = default_image.clone();
        }
        if let Some(canvas) = overrides.encode_on_canvas {
            merged.encode_on_canvas = canvas;
        }
        if let Some(force) = overrides.force_save {
            merged.force_save = force;
        }
        if let Some(prefix) = &overrides.storage_prefix {
            merged.storage_prefix = prefix.clone();
        }
        if let Some(url) = &overrides.url {
            merged.url = Some(url.clone());
        }
        if let Some(callbacks) = &overrides.callbacks {
            merged.callbacks = callbacks.clone();
        }
        merged
    }

    pub fn default_image(&self) -> Option<DefaultImage> {
        DefaultImage::parse(&self.default_image)
    }

    pub fn backend(&self) -> EngineResult<StorageBackend> {
        Ok(self.storage_db.parse()?)
    }

    /// The configuration of the one-level fallback fill for `url`.
    pub(crate) fn for_default(&self, url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            force_save: false,
            callbacks: Callbacks::none(),
            ..self.clone()
        }
    }
}

/// Per-call overrides. `None` keeps the engine's base value.
///
/// The storage backend is fixed when the engine is opened, so `storageDB`
/// has no per-call override.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub debug: Option<bool>,
    pub default_image: Option<String>,
    pub encode_on_canvas: Option<bool>,
    pub force_save: Option<bool>,
    pub storage_prefix: Option<String>,
    pub url: Option<String>,
    /// Replaces the base callbacks wholesale.
    pub callbacks: Option<Callbacks>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn force_save(mut self, force: bool) -> Self {
        self.force_save = Some(force);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = Some(prefix.into());
        self
    }

    pub fn encode_on_canvas(mut self, canvas: bool) -> Self {
        self.encode_on_canvas = Some(canvas);
        self
    }

    pub fn default_image(mut self, image: impl Into<String>) -> Self {
        self.default_image = Some(image.into());
        self
    }

    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = Some(callbacks);
        self
    }
}
