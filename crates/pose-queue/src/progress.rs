//! Job progress events.
//!
//! Callers may attach a callback to a job; it receives an event on every
//! status change and progress milestone. Callbacks run on the worker task
//! and should return quickly.

use pose_models::{JobId, JobStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Progress after the job is picked up.
pub const PROGRESS_STARTED: f64 = 0.1;
/// Progress once landmarks have been extracted.
pub const PROGRESS_EXTRACTED: f64 = 0.6;
/// Progress once frames have been normalized.
pub const PROGRESS_NORMALIZED: f64 = 0.8;
/// Progress once the movement summary is computed.
pub const PROGRESS_ANALYZED: f64 = 0.9;
/// Progress once the analysis has been handed to the cache.
pub const PROGRESS_CACHED: f64 = 0.95;
/// Progress of a completed job.
pub const PROGRESS_DONE: f64 = 1.0;

/// Snapshot of a job emitted to its callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: f64,
    pub message: String,
}

/// Progress callback type.
pub type ProgressCallback = Arc<dyn Fn(JobEvent) + Send + Sync>;
