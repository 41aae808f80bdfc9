//! Queue configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{QueueError, QueueResult};

/// Processing queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Jobs processed concurrently
    pub max_workers: usize,
    /// Jobs allowed to wait before enqueue fails
    pub max_queue_size: usize,
    /// Frames sampled when a job does not say
    pub default_max_frames: usize,
    /// How long finished jobs stay queryable
    pub job_retention: Duration,
    /// Period of the background cleanup task
    pub cleanup_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_workers: 2,
            max_queue_size: 100,
            default_max_frames: 30,
            job_retention: Duration::from_secs(24 * 60 * 60),
            cleanup_interval: Duration::from_secs(60 * 60),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_workers: std::env::var("POSE_QUEUE_MAX_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_workers),
            max_queue_size: std::env::var("POSE_QUEUE_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_queue_size),
            default_max_frames: std::env::var("POSE_QUEUE_DEFAULT_MAX_FRAMES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.default_max_frames),
            job_retention: std::env::var("POSE_QUEUE_JOB_RETENTION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_retention),
            cleanup_interval: std::env::var("POSE_QUEUE_CLEANUP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u64| *n > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Reject settings the dispatcher and cleanup task cannot run with.
    pub fn validate(&self) -> QueueResult<()> {
        if self.max_workers == 0 {
            return Err(QueueError::invalid_config("max_workers must be at least 1"));
        }
        if self.cleanup_interval.is_zero() {
            return Err(QueueError::invalid_config("cleanup_interval must be non-zero"));
        }
        Ok(())
    }
}
