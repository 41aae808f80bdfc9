//! Engine configuration.

use pose_queue::QueueConfig;
use pose_storage::CacheConfig;
use pose_vision::LandmarkLayout;
use serde::{Deserialize, Serialize};

/// Everything needed to assemble a [`PoseEngine`](crate::PoseEngine).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub queue: QueueConfig,
    pub cache: CacheConfig,
    /// How raw landmark frames map to key points
    pub layout: LandmarkLayout,
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            queue: QueueConfig::from_env(),
            cache: CacheConfig::from_env(),
            layout: std::env::var("POSE_LANDMARK_LAYOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    pub fn with_layout(mut self, layout: LandmarkLayout) -> Self {
        self.layout = layout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.layout, LandmarkLayout::Positional);
        assert_eq!(config.queue.max_workers, 2);
        assert_eq!(config.cache.pose_analysis_ttl_days, 30);
    }

    #[test]
    fn test_serializes_layout_snake_case() {
        let config = EngineConfig::default().with_layout(LandmarkLayout::Auto);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["layout"], "auto");
    }
}
