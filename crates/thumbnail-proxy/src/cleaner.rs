//! Background deletion of evicted thumbnails
//!
//! The recency cache only forgets a thumbnail; this worker is what removes
//! the file. Deletions are best-effort: failures are logged and dropped, the
//! worst outcome being a file left behind on disk.
//!
//! # Lifecycle
//!
//! `Running` waits on the next eviction or the shutdown token, whichever is
//! ready first. Cancellation (or every sender going away) moves the worker to
//! `Stopping`, which closes the queue without draining it, then `Stopped`.

use crate::storage::BlobStore;
use recency_cache::Eviction;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Stopping,
    Stopped,
}

/// Counts reported when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub deleted: u64,
    pub failed: u64,
}

pub struct CleanupWorker {
    evictions: mpsc::Receiver<Eviction>,
    store: Arc<dyn BlobStore>,
    state: WorkerState,
    summary: CleanupSummary,
}

impl CleanupWorker {
    pub fn new(evictions: mpsc::Receiver<Eviction>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            evictions,
            store,
            state: WorkerState::Running,
            summary: CleanupSummary::default(),
        }
    }

    /// Process evictions until `shutdown` is cancelled or the queue closes
    pub async fn run(mut self, shutdown: CancellationToken) -> CleanupSummary {
        info!("Cleanup worker started");

        while self.state == WorkerState::Running {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Cleanup worker received shutdown signal");
                    self.state = WorkerState::Stopping;
                }

                next = self.evictions.recv() => match next {
                    Some(eviction) => self.reclaim(&eviction.key).await,
                    None => {
                        info!("Eviction queue closed");
                        self.state = WorkerState::Stopping;
                    }
                },
            }
        }

        // Anything still queued is abandoned; blocked senders are released.
        self.evictions.close();
        self.state = WorkerState::Stopped;

        info!(
            deleted = self.summary.deleted,
            failed = self.summary.failed,
            "Cleanup worker stopped"
        );
        self.summary
    }

    async fn reclaim(&mut self, key: &str) {
        match self.store.delete(key).await {
            Ok(()) => {
                self.summary.deleted += 1;
                debug!(key, "Deleted evicted thumbnail");
            }
            Err(e) => {
                self.summary.failed += 1;
                warn!(key, error = %e, "Failed to delete evicted thumbnail");
            }
        }
    }
}
