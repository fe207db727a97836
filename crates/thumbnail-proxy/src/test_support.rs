//! Helpers shared by unit tests

use crate::error::{Result, ThumbnailError};
use crate::fetcher::Fetcher;
use async_trait::async_trait;
use axum::http::HeaderMap;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::io::SeekFrom;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Notify;
use url::Url;

/// Encode a gradient JPEG of the given size
pub fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, 90)
        .encode_image(&image)
        .unwrap();
    encoded
}

/// In-memory origin; `None` behaves like a host that refuses connections
pub struct FakeFetcher {
    body: Mutex<Option<Vec<u8>>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn serving(body: Vec<u8>) -> Self {
        Self {
            body: Mutex::new(Some(body)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            body: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_body(&self, body: Option<Vec<u8>>) {
        *self.body.lock().unwrap() = body;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, _source: &Url, _headers: &HeaderMap, dest: &mut File) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self.body.lock().unwrap().clone();
        let body = body.ok_or_else(|| {
            ThumbnailError::OriginUnreachable("connection refused".to_string())
        })?;

        dest.set_len(0).await.unwrap();
        dest.seek(SeekFrom::Start(0)).await.unwrap();
        dest.write_all(&body).await.unwrap();
        dest.flush().await.unwrap();
        Ok(body.len() as u64)
    }
}

/// In-memory origin that can pause one download halfway through
pub struct GatedFetcher {
    body: Vec<u8>,
    hold: AtomicBool,
    stalled: Notify,
    release: Notify,
}

impl GatedFetcher {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            hold: AtomicBool::new(false),
            stalled: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Make the next fetch stop after writing half of the body
    pub fn hold_next(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    /// Wait until a held fetch has written its first half
    pub async fn stalled(&self) {
        self.stalled.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl Fetcher for GatedFetcher {
    async fn fetch(&self, _source: &Url, _headers: &HeaderMap, dest: &mut File) -> Result<u64> {
        let (head, tail) = self.body.split_at(self.body.len() / 2);

        dest.set_len(0).await.unwrap();
        dest.seek(SeekFrom::Start(0)).await.unwrap();
        dest.write_all(head).await.unwrap();
        dest.flush().await.unwrap();

        if self.hold.swap(false, Ordering::SeqCst) {
            self.stalled.notify_one();
            self.release.notified().await;
        }

        dest.write_all(tail).await.unwrap();
        dest.flush().await.unwrap();
        Ok(self.body.len() as u64)
    }
}
