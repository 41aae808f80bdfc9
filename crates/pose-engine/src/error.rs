//! Engine error types.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Queue error: {0}")]
    Queue(#[from] pose_queue::QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] pose_storage::StorageError),

    #[error("Vision error: {0}")]
    Vision(#[from] pose_vision::VisionError),
}
