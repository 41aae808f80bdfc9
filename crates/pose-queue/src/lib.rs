//! In-process analysis job queue.
//!
//! This crate provides:
//! - Bounded priority queue with FIFO ordering within a priority
//! - Fixed-size worker pool running the pose analysis pipeline
//! - Job status, progress callbacks and results
//! - Periodic pruning of finished jobs and expired cache entries

mod cleanup;
pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod queue;

pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};
pub use job::{AnalysisJob, JobRecord};
pub use logging::JobLogger;
pub use pipeline::{AnalysisPipeline, ProgressFn};
pub use progress::{
    JobEvent, ProgressCallback, PROGRESS_ANALYZED, PROGRESS_CACHED, PROGRESS_DONE,
    PROGRESS_EXTRACTED, PROGRESS_NORMALIZED, PROGRESS_STARTED,
};
pub use queue::{MaintenanceReport, ProcessingQueue, QueueStats};
