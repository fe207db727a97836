//! Configuration loaded from environment variables

use crate::error::{Result, ThumbnailError};
use crate::types::SizeBounds;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the thumbnail proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: PathBuf,
    /// Maximum number of thumbnails kept on disk
    pub cache_capacity: usize,
    /// Pending eviction notifications before admissions start to wait
    pub eviction_queue_size: usize,
    pub bounds: SizeBounds,
    pub jpeg_quality: u8,
    pub fetch_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            storage_dir: PathBuf::from("./cache/thumbnails"),
            cache_capacity: 100,
            eviction_queue_size: 100,
            bounds: SizeBounds::default(),
            jpeg_quality: 75,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl ProxyConfig {
    /// Parse configuration from environment variables.
    ///
    /// Missing or unparseable values fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let number = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: number("PORT")
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(defaults.port),
            storage_dir: lookup("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            cache_capacity: number("CACHE_CAPACITY")
                .map(|v| v as usize)
                .unwrap_or(defaults.cache_capacity),
            eviction_queue_size: number("EVICTION_QUEUE_SIZE")
                .map(|v| v as usize)
                .unwrap_or(defaults.eviction_queue_size),
            bounds: SizeBounds {
                min_width: number("MIN_WIDTH")
                    .map(saturating_u32)
                    .unwrap_or(defaults.bounds.min_width),
                max_width: number("MAX_WIDTH")
                    .map(saturating_u32)
                    .unwrap_or(defaults.bounds.max_width),
                min_height: number("MIN_HEIGHT")
                    .map(saturating_u32)
                    .unwrap_or(defaults.bounds.min_height),
                max_height: number("MAX_HEIGHT")
                    .map(saturating_u32)
                    .unwrap_or(defaults.bounds.max_height),
            },
            jpeg_quality: number("JPEG_QUALITY")
                .map(|v| v.min(u8::MAX as u64) as u8)
                .unwrap_or(defaults.jpeg_quality),
            fetch_timeout: number("FETCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(ThumbnailError::Config(
                "CACHE_CAPACITY must be greater than zero".to_string(),
            ));
        }
        if self.eviction_queue_size == 0 {
            return Err(ThumbnailError::Config(
                "EVICTION_QUEUE_SIZE must be greater than zero".to_string(),
            ));
        }
        if self.bounds.min_width > self.bounds.max_width {
            return Err(ThumbnailError::Config(format!(
                "MIN_WIDTH ({}) exceeds MAX_WIDTH ({})",
                self.bounds.min_width, self.bounds.max_width
            )));
        }
        if self.bounds.min_height > self.bounds.max_height {
            return Err(ThumbnailError::Config(format!(
                "MIN_HEIGHT ({}) exceeds MAX_HEIGHT ({})",
                self.bounds.min_height, self.bounds.max_height
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ThumbnailError::Config(format!(
                "JPEG_QUALITY must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ProxyConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProxyConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage_dir, PathBuf::from("./cache/thumbnails"));
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.eviction_queue_size, 100);
        assert_eq!(config.jpeg_quality, 75);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.bounds, SizeBounds::default());
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_environment_overrides() {
        let config = load(&[
            ("PORT", "9000"),
            ("STORAGE_DIR", "/var/cache/thumbs"),
            ("CACHE_CAPACITY", "5"),
            ("MIN_WIDTH", "50"),
            ("MAX_HEIGHT", "800"),
            ("FETCH_TIMEOUT_SECS", "3"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.storage_dir, PathBuf::from("/var/cache/thumbs"));
        assert_eq!(config.cache_capacity, 5);
        assert_eq!(config.bounds.min_width, 50);
        assert_eq!(config.bounds.max_height, 800);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = load(&[("PORT", "not-a-port"), ("CACHE_CAPACITY", "-3")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_capacity, 100);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = load(&[("CACHE_CAPACITY", "0")]).unwrap_err();
        assert!(err.to_string().contains("CACHE_CAPACITY"));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let err = load(&[("MIN_WIDTH", "500"), ("MAX_WIDTH", "100")]).unwrap_err();
        assert!(matches!(err, ThumbnailError::Config(_)));
    }

    #[test]
    fn test_rejects_bad_quality() {
        assert!(load(&[("JPEG_QUALITY", "0")]).is_err());
        assert!(load(&[("JPEG_QUALITY", "101")]).is_err());
    }
}
