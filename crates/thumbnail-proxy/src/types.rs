//! Core types for the thumbnail proxy

use recency_cache::CacheStats;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

/// Allowed range for requested thumbnail dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBounds {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl SizeBounds {
    pub fn contains(&self, width: u32, height: u32) -> bool {
        (self.min_width..=self.max_width).contains(&width)
            && (self.min_height..=self.max_height).contains(&height)
    }
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self {
            min_width: 16,
            max_width: 4096,
            min_height: 16,
            max_height: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = SizeBounds {
            min_width: 10,
            max_width: 100,
            min_height: 20,
            max_height: 200,
        };
        assert!(bounds.contains(10, 20));
        assert!(bounds.contains(100, 200));
        assert!(!bounds.contains(9, 50));
        assert!(!bounds.contains(50, 201));
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            cache: CacheStats {
                entries: 12,
                capacity: 100,
                hits: 500,
                misses: 50,
                evictions: 3,
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("3600"));
        assert!(json.contains("\"capacity\":100"));
    }
}
