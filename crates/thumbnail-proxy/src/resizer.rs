//! JPEG resizing

use crate::error::{Result, ThumbnailError};
use crate::types::SizeBounds;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};
use std::io::{Cursor, SeekFrom};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

/// Turns a downloaded source image into a thumbnail
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Reject dimensions outside the configured bounds
    fn check_size(&self, width: u32, height: u32) -> Result<()>;

    /// Replace the image held by `file` with a `width` x `height` version
    async fn resize_in_place(&self, file: &mut File, width: u32, height: u32) -> Result<()>;
}

/// Lanczos3 resizer producing baseline JPEGs
pub struct ImageResizer {
    bounds: SizeBounds,
    quality: u8,
}

impl ImageResizer {
    pub fn new(bounds: SizeBounds, quality: u8) -> Self {
        Self { bounds, quality }
    }
}

#[async_trait]
impl Transformer for ImageResizer {
    fn check_size(&self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 || !self.bounds.contains(width, height) {
            return Err(ThumbnailError::SizeOutOfRange { width, height });
        }
        Ok(())
    }

    async fn resize_in_place(&self, file: &mut File, width: u32, height: u32) -> Result<()> {
        self.check_size(width, height)?;

        file.seek(SeekFrom::Start(0)).await?;
        let mut source = Vec::new();
        file.read_to_end(&mut source).await?;

        let quality = self.quality;
        let encoded =
            tokio::task::spawn_blocking(move || resize_jpeg(&source, width, height, quality))
                .await
                .map_err(|e| ThumbnailError::DecodeError(format!("resize task failed: {}", e)))??;

        file.set_len(0).await?;
        file.seek(SeekFrom::Start(0)).await?;
        file.write_all(&encoded).await?;
        file.flush().await?;

        debug!(width, height, size = encoded.len(), "Resized image");
        Ok(())
    }
}

fn resize_jpeg(source: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    // Header probe first so undersized sources are rejected without decoding
    let (source_width, source_height) =
        ImageReader::with_format(Cursor::new(source), ImageFormat::Jpeg)
            .into_dimensions()
            .map_err(decode_error)?;

    if source_width < width || source_height < height {
        return Err(ThumbnailError::SourceTooSmall {
            requested: (width, height),
            actual: (source_width, source_height),
        });
    }

    let image = image::load_from_memory_with_format(source, ImageFormat::Jpeg)
        .map_err(decode_error)?;
    let resized = image.resize_exact(width, height, FilterType::Lanczos3).to_rgb8();

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality)
        .encode_image(&resized)
        .map_err(decode_error)?;
    Ok(encoded)
}

fn decode_error(err: image::ImageError) -> ThumbnailError {
    ThumbnailError::DecodeError(err.to_string())
}
