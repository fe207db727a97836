//! Thumbnail Proxy - on-demand image resizing with a bounded disk cache
//!
//! Fetches JPEGs from their origin, resizes them to the requested size and
//! keeps the most recently used thumbnails on local disk.

mod cleaner;
mod config;
mod error;
mod fetcher;
mod key;
mod pipeline;
mod request;
mod resizer;
mod server;
mod storage;
#[cfg(test)]
mod test_support;
mod types;

use crate::cleaner::CleanupWorker;
use crate::config::ProxyConfig;
use crate::error::{Result, ThumbnailError};
use crate::fetcher::HttpFetcher;
use crate::pipeline::Pipeline;
use crate::resizer::ImageResizer;
use crate::server::{start_server, ServerState, SharedState};
use crate::storage::{BlobStore, DiskStore};
use recency_cache::RecencyCache;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter =
        EnvFilter::from_default_env().add_directive("thumbnail_proxy=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Thumbnail Proxy...");

    // Load configuration from environment
    let config = ProxyConfig::from_env()?;
    info!("Listen: {}:{}", config.host, config.port);
    info!("Storage dir: {:?}", config.storage_dir);
    info!("Cache capacity: {} thumbnails", config.cache_capacity);
    info!(
        "Width range: {}-{}, height range: {}-{}",
        config.bounds.min_width,
        config.bounds.max_width,
        config.bounds.min_height,
        config.bounds.max_height
    );

    let host: IpAddr = config
        .host
        .parse()
        .map_err(|e| ThumbnailError::Config(format!("Invalid HOST {:?}: {}", config.host, e)))?;
    let addr = SocketAddr::new(host, config.port);

    let store: Arc<dyn BlobStore> = Arc::new(DiskStore::new(config.storage_dir.clone()));
    store.ensure_root().await?;

    // The worker is the only consumer of evictions
    let (eviction_tx, eviction_rx) = mpsc::channel(config.eviction_queue_size);
    let cache = RecencyCache::new(config.cache_capacity, eviction_tx);

    let pipeline = Pipeline::new(
        cache,
        store.clone(),
        Arc::new(HttpFetcher::new(config.fetch_timeout)?),
        Arc::new(ImageResizer::new(config.bounds, config.jpeg_quality)),
    );
    let state: SharedState = Arc::new(ServerState::new(pipeline));

    let shutdown = CancellationToken::new();
    let cleaner = tokio::spawn(CleanupWorker::new(eviction_rx, store).run(shutdown.clone()));
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    // Start HTTP server (blocking until shutdown)
    let served = start_server(state, addr, shutdown.clone()).await;
    shutdown.cancel();

    if let Err(e) = cleaner.await {
        warn!(error = %e, "Cleanup worker panicked");
    }

    served.map_err(|e| ThumbnailError::Config(format!("Server error: {}", e)))?;
    info!("Thumbnail Proxy stopped");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C, or SIGTERM/SIGHUP on Unix
async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
            (Ok(mut term), Ok(mut hup)) => {
                tokio::select! {
                    _ = term.recv() => {}
                    _ = hup.recv() => {}
                }
            }
            _ => {
                warn!("Failed to install SIGTERM/SIGHUP handlers");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
