//! Queue error types.

use pose_vision::VisionError;
use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue is full ({capacity} jobs waiting)")]
    QueueFull { capacity: usize },

    #[error("Queue is not running")]
    NotRunning,

    #[error("Queue is already running")]
    AlreadyRunning,

    #[error("Invalid queue config: {0}")]
    InvalidConfig(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Pipeline failed: {0}")]
    PipelineFailed(String),

    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),
}

impl QueueError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn invalid_job(msg: impl Into<String>) -> Self {
        Self::InvalidJob(msg.into())
    }

    pub fn pipeline_failed(msg: impl Into<String>) -> Self {
        Self::PipelineFailed(msg.into())
    }

    pub fn worker_panicked(msg: impl Into<String>) -> Self {
        Self::WorkerPanicked(msg.into())
    }
}
