use cacheimg_types::StoreKey;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigOverrides, DefaultImage};
use crate::engine::CacheEngine;
use crate::error::EngineResult;

/// Result of a [`CacheEngine::purge`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// The single identifier purged, or `None` for the whole namespace.
    pub identifier: Option<String>,
    pub removed: usize,
}

impl CacheEngine {
    /// Remove cached entries under `prefix` (default: the configured one).
    ///
    /// With an identifier only the exact key `prefix:identifier` goes; without
    /// one every key in the namespace does. Keys of other namespaces are
    /// never touched.
    pub fn purge(
        &self,
        identifier: Option<&str>,
        prefix: Option<&str>,
    ) -> EngineResult<PurgeReport> {
        let prefix = prefix.unwrap_or(self.config().storage_prefix.as_str());
        let exact = identifier.map(|id| StoreKey::new(prefix, id).to_string());

        let mut removed = 0;
        for key in self.store().list_keys(prefix)? {
            if exact.as_ref().is_some_and(|e| *e != key) {
                continue;
            }
            self.store().remove(&key)?;
            debug!(key = %key, "purged");
            removed += 1;
        }

        info!(prefix, identifier, removed, "purge complete");
        Ok(PurgeReport {
            identifier: identifier.map(str::to_string),
            removed,
        })
    }

    /// [`purge`](Self::purge), then hand the report to `callback`, even when
    /// nothing matched.
    pub fn purge_then<F>(
        &self,
        identifier: Option<&str>,
        prefix: Option<&str>,
        callback: F,
    ) -> EngineResult<PurgeReport>
    where
        F: FnOnce(&PurgeReport),
    {
        let report = self.purge(identifier, prefix)?;
        callback(&report);
        Ok(report)
    }

    /// A usable payload for `identifier`, refilling once if needed.
    ///
    /// Falls back to the inline default image, or to the cached copy of a
    /// remote default. `None` when neither is available.
    pub async fn resolve_or_fallback(
        &self,
        identifier: &str,
        prefix: Option<&str>,
    ) -> EngineResult<Option<String>> {
        let prefix = prefix.unwrap_or(self.config().storage_prefix.as_str());
        let key = StoreKey::new(prefix, identifier);

        if let Some(payload) = self.store().entry(&key)?.payload() {
            return Ok(Some(payload.to_string()));
        }

        debug!(key = %key, "missing or unusable, refilling");
        let overrides = ConfigOverrides::new().force_save(true).prefix(prefix);
        self.cache_url(identifier, &overrides).await;

        if let Some(payload) = self.store().entry(&key)?.payload() {
            return Ok(Some(payload.to_string()));
        }

        match self.config().default_image() {
            Some(DefaultImage::Inline(payload)) => Ok(Some(payload)),
            Some(DefaultImage::Remote(url)) => {
                let entry = self.store().entry(&StoreKey::new(prefix, url))?;
                Ok(entry.payload().map(str::to_string))
            }
            None => Ok(None),
        }
    }
}
