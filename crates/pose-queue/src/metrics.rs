//! Queue metrics.

use metrics::{counter, gauge, histogram};

/// Metric names.
pub mod names {
    /// Jobs finished successfully.
    pub const JOBS_COMPLETED_TOTAL: &str = "pose_jobs_completed_total";

    /// Jobs that ended in failure.
    pub const JOBS_FAILED_TOTAL: &str = "pose_jobs_failed_total";

    /// Jobs cancelled while queued.
    pub const JOBS_CANCELLED_TOTAL: &str = "pose_jobs_cancelled_total";

    /// Jobs rejected because the queue was full.
    pub const JOBS_REJECTED_TOTAL: &str = "pose_jobs_rejected_total";

    /// Wall time from pickup to completion, in seconds.
    pub const JOB_DURATION_SECONDS: &str = "pose_job_duration_seconds";

    /// Jobs waiting for a worker.
    pub const QUEUE_DEPTH: &str = "pose_queue_depth";
}

pub fn record_completed(duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "status" => "completed").record(duration_secs);
}

pub fn record_failed(duration_secs: f64) {
    counter!(names::JOBS_FAILED_TOTAL).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "status" => "failed").record(duration_secs);
}

pub fn record_cancelled() {
    counter!(names::JOBS_CANCELLED_TOTAL).increment(1);
}

pub fn record_rejected() {
    counter!(names::JOBS_REJECTED_TOTAL).increment(1);
}

pub fn set_queue_depth(depth: usize) {
    gauge!(names::QUEUE_DEPTH).set(depth as f64);
}
