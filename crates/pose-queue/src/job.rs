//! Analysis job definitions and status records.

use chrono::{DateTime, Utc};
use pose_models::{JobId, JobPriority, JobStatus, VideoId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::progress::{JobEvent, ProgressCallback};

/// A request to analyze the poses in one video.
#[derive(Clone)]
pub struct AnalysisJob {
    pub video_id: VideoId,
    pub source: PathBuf,
    pub priority: JobPriority,
    /// Frames to sample; `None` uses the queue default.
    pub max_frames: Option<usize>,
    /// Recompute even if a cached analysis exists.
    pub force_refresh: bool,
    pub callback: Option<ProgressCallback>,
}

impl AnalysisJob {
    pub fn new(video_id: impl Into<VideoId>, source: impl Into<PathBuf>) -> Self {
        Self {
            video_id: video_id.into(),
            source: source.into(),
            priority: JobPriority::default(),
            max_frames: None,
            force_refresh: false,
            callback: None,
        }
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn with_force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    pub fn with_callback(mut self, callback: ProgressCallback) -> Self {
        self.callback = Some(callback);
        self
    }
}

impl fmt::Debug for AnalysisJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisJob")
            .field("video_id", &self.video_id)
            .field("source", &self.source)
            .field("priority", &self.priority)
            .field("max_frames", &self.max_frames)
            .field("force_refresh", &self.force_refresh)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Queryable state of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub video_id: VideoId,
    pub source: PathBuf,
    pub priority: JobPriority,
    pub max_frames: usize,
    pub status: JobStatus,
    /// Fraction complete in [0, 1]; never decreases.
    pub progress: f64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub processing_time_ms: Option<u64>,
    pub error: Option<String>,
    /// Whether an analysis result is available for this job.
    pub has_result: bool,
}

impl JobRecord {
    pub fn new(job_id: JobId, job: &AnalysisJob, max_frames: usize, now: DateTime<Utc>) -> Self {
        Self {
            job_id,
            video_id: job.video_id.clone(),
            source: job.source.clone(),
            priority: job.priority,
            max_frames,
            status: JobStatus::Queued,
            progress: 0.0,
            message: "queued".to_string(),
            created_at: now,
            started_at: None,
            completed_at: None,
            processing_time_ms: None,
            error: None,
            has_result: false,
        }
    }

    /// Move to `next` if the state machine allows it.
    ///
    /// Stamps `started_at` on entering processing and `completed_at` on
    /// reaching a terminal state. Returns `false` and changes nothing for
    /// an illegal transition.
    pub fn transition(&mut self, next: JobStatus, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        if next == JobStatus::Processing {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
            if let Some(started) = self.started_at {
                self.processing_time_ms = Some((now - started).num_milliseconds().max(0) as u64);
            }
        }
        true
    }

    /// Raise progress to `progress`, clamped to [0, 1].
    ///
    /// Lower values are ignored. Returns whether progress changed.
    pub fn advance(&mut self, progress: f64, message: impl Into<String>) -> bool {
        let progress = progress.clamp(0.0, 1.0);
        if progress <= self.progress {
            return false;
        }
        self.progress = progress;
        self.message = message.into();
        true
    }

    pub fn event(&self) -> JobEvent {
        JobEvent {
            job_id: self.job_id.clone(),
            status: self.status,
            progress: self.progress,
            message: self.message.clone(),
        }
    }
}
