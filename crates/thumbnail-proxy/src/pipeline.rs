//! Per-request fetch, resize and serve orchestration
//!
//! A miss is written under a private staged name and only renamed to its key
//! once fetched and resized. Admission to the recency cache follows the
//! rename, so a key in the cache always names a finished file, and a request
//! racing on the same key never sees another request's partial bytes.

use crate::error::{Result, ThumbnailError};
use crate::fetcher::Fetcher;
use crate::request::ThumbnailRequest;
use crate::resizer::Transformer;
use crate::storage::BlobStore;
use axum::http::HeaderMap;
use recency_cache::{Admission, CacheStats, RecencyCache};
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, warn};

/// A finished thumbnail ready to be sent to the client
#[derive(Debug)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub from_cache: bool,
}

pub struct Pipeline {
    cache: RecencyCache,
    store: Arc<dyn BlobStore>,
    fetcher: Arc<dyn Fetcher>,
    transformer: Arc<dyn Transformer>,
}

impl Pipeline {
    pub fn new(
        cache: RecencyCache,
        store: Arc<dyn BlobStore>,
        fetcher: Arc<dyn Fetcher>,
        transformer: Arc<dyn Transformer>,
    ) -> Self {
        Self {
            cache,
            store,
            fetcher,
            transformer,
        }
    }

    /// Serve the thumbnail described by a `/fill/{w}/{h}/{url}` path.
    ///
    /// `headers` are the inbound request headers, forwarded to the origin on
    /// a miss.
    pub async fn process(&self, path: &str, headers: &HeaderMap) -> Result<Thumbnail> {
        let request = ThumbnailRequest::parse(path)?;
        self.transformer.check_size(request.width, request.height)?;
        self.store.ensure_root().await?;

        let key = request.key();
        if self.cache.lookup(&key).await {
            return self.serve_cached(&key).await;
        }

        self.materialize(&request, &key, headers).await
    }

    async fn serve_cached(&self, key: &str) -> Result<Thumbnail> {
        // The cleaner may have deleted the file between lookup and open
        let mut file = self.store.open(key).await.map_err(|e| {
            warn!(key, error = %e, "Cached thumbnail missing from storage");
            ThumbnailError::from(e)
        })?;

        let bytes = read_to_end(&mut file).await?;
        debug!(key, size = bytes.len(), "Serving thumbnail from cache");
        Ok(Thumbnail {
            bytes,
            from_cache: true,
        })
    }

    async fn materialize(
        &self,
        request: &ThumbnailRequest,
        key: &str,
        headers: &HeaderMap,
    ) -> Result<Thumbnail> {
        let mut staged = self.store.create(key).await?;

        self.fetcher
            .fetch(&request.source, headers, &mut staged.file)
            .await?;
        self.transformer
            .resize_in_place(&mut staged.file, request.width, request.height)
            .await?;
        let mut file = self.store.publish(staged, key).await?;

        match self.cache.admit(key).await {
            Admission::Evicted(victim) => debug!(key, victim = %victim, "Admitted thumbnail"),
            _ => debug!(key, "Admitted thumbnail"),
        }

        // Read through the handle we wrote with, which stays valid even if
        // the file is unlinked by a concurrent eviction
        let bytes = read_to_end(&mut file).await?;
        Ok(Thumbnail {
            bytes,
            from_cache: false,
        })
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    #[cfg(test)]
    pub fn cache(&self) -> &RecencyCache {
        &self.cache
    }
}

async fn read_to_end(file: &mut File) -> Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0)).await?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).await?;
    Ok(bytes)
}
