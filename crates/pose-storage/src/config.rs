//! Cache configuration.

use chrono::Duration;
use pose_models::CacheNamespace;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::redis_store::DEFAULT_KEY_PREFIX;

/// Where cache entries live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackend::Memory => "memory",
            CacheBackend::Redis => "redis",
        }
    }
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend: {}", other)),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    pub key_prefix: String,
    /// Idle days before a pose analysis entry is swept.
    pub pose_analysis_ttl_days: i64,
    /// Idle days before a sequence match entry is swept.
    pub sequence_match_ttl_days: i64,
    /// Idle days before an overlay placement entry is swept.
    pub overlay_ttl_days: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            pose_analysis_ttl_days: CacheNamespace::PoseAnalysis.default_ttl().num_days(),
            sequence_match_ttl_days: CacheNamespace::SequenceMatch.default_ttl().num_days(),
            overlay_ttl_days: CacheNamespace::OverlayPlacement.default_ttl().num_days(),
        }
    }
}

impl CacheConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: std::env::var("POSE_CACHE_BACKEND")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.backend),
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            key_prefix: std::env::var("POSE_CACHE_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            pose_analysis_ttl_days: std::env::var("POSE_CACHE_ANALYSIS_TTL_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|d: &i64| *d > 0)
                .unwrap_or(defaults.pose_analysis_ttl_days),
            sequence_match_ttl_days: std::env::var("POSE_CACHE_MATCH_TTL_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|d: &i64| *d > 0)
                .unwrap_or(defaults.sequence_match_ttl_days),
            overlay_ttl_days: std::env::var("POSE_CACHE_OVERLAY_TTL_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|d: &i64| *d > 0)
                .unwrap_or(defaults.overlay_ttl_days),
        }
    }

    /// Idle time before entries in `namespace` are swept.
    pub fn ttl(&self, namespace: CacheNamespace) -> Duration {
        let days = match namespace {
            CacheNamespace::PoseAnalysis => self.pose_analysis_ttl_days,
            CacheNamespace::SequenceMatch => self.sequence_match_ttl_days,
            CacheNamespace::OverlayPlacement => self.overlay_ttl_days,
        };
        Duration::days(days)
    }
}
