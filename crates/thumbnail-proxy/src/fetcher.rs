//! Downloading source images from their origin

use crate::error::{Result, ThumbnailError};
use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName};
use reqwest::Client;
use std::io::SeekFrom;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};
use url::Url;

/// Source of original image bytes
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `source` into `dest`, replacing whatever it held.
    ///
    /// Returns the number of bytes written.
    async fn fetch(&self, source: &Url, headers: &HeaderMap, dest: &mut File) -> Result<u64>;
}

/// HTTP client for fetching images from origin servers
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ThumbnailError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source: &Url, headers: &HeaderMap, dest: &mut File) -> Result<u64> {
        debug!(url = %source, "Fetching source image");

        let mut response = self
            .client
            .get(source.clone())
            .headers(forwarded_headers(headers))
            .send()
            .await
            .map_err(|e| {
                warn!(url = %source, error = %e, "Origin unreachable");
                ThumbnailError::OriginUnreachable(e.to_string())
            })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            warn!(url = %source, status = %status, "Origin returned error status");
            return Err(ThumbnailError::OriginError(status.as_u16()));
        }

        dest.set_len(0).await.map_err(download_failed)?;
        dest.seek(SeekFrom::Start(0)).await.map_err(download_failed)?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ThumbnailError::DownloadFailed(e.to_string()))?
        {
            dest.write_all(&chunk).await.map_err(download_failed)?;
            written += chunk.len() as u64;
        }
        dest.flush().await.map_err(download_failed)?;

        debug!(url = %source, size = written, "Fetched source image");
        Ok(written)
    }
}

fn download_failed(err: std::io::Error) -> ThumbnailError {
    ThumbnailError::DownloadFailed(err.to_string())
}

/// Inbound headers that are safe to pass on to the origin.
///
/// Hop-by-hop headers and `Host` describe the inbound connection. Encodings
/// are dropped because the body is stored as received.
fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    inbound
        .iter()
        .filter(|(name, _)| is_forwardable(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn is_forwardable(name: &HeaderName) -> bool {
    let hop_by_hop = [
        header::HOST,
        header::CONNECTION,
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::TE,
        header::TRAILER,
        header::UPGRADE,
        header::PROXY_AUTHORIZATION,
        header::ACCEPT_ENCODING,
    ];
    !hop_by_hop.contains(name) && name.as_str() != "keep-alive"
}
