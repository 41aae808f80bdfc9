//! Bounded priority queue with a fixed worker pool.

use chrono::{DateTime, Utc};
use pose_models::{CleanupStats, JobId, JobPriority, JobStatus, VideoId, VideoPoseAnalysis};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{watch, Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use crate::cleanup;
use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult};
use crate::job::{AnalysisJob, JobRecord};
use crate::logging::JobLogger;
use crate::metrics;
use crate::pipeline::AnalysisPipeline;
use crate::progress::{JobEvent, ProgressCallback, PROGRESS_DONE, PROGRESS_STARTED};

/// Snapshot of queue counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs waiting for a worker
    pub queued: usize,
    /// Jobs currently running
    pub processing: usize,
    /// Jobs of any status still tracked
    pub tracked: usize,
    pub jobs_processed: u64,
    pub jobs_failed: u64,
    pub jobs_cancelled: u64,
    pub total_processing_time_ms: u64,
    /// Mean over successfully processed jobs
    pub average_processing_time_ms: f64,
    /// Most jobs ever waiting at once
    pub queue_high_water: usize,
    pub max_workers: usize,
    pub max_queue_size: usize,
    pub is_running: bool,
}

/// Result of one maintenance pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaintenanceReport {
    pub jobs_pruned: usize,
    pub cache: CleanupStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingJob {
    priority: JobPriority,
    seq: u64,
    job_id: JobId,
}

// Max-heap: higher priority first, then lower sequence (FIFO).
impl Ord for PendingJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct JobEntry {
    record: JobRecord,
    force_refresh: bool,
    callback: Option<ProgressCallback>,
    result: Option<VideoPoseAnalysis>,
}

#[derive(Default)]
struct Counters {
    processed: u64,
    failed: u64,
    cancelled: u64,
    total_processing_ms: u64,
    high_water: usize,
}

#[derive(Default)]
struct QueueState {
    pending: BinaryHeap<PendingJob>,
    jobs: HashMap<JobId, JobEntry>,
    next_seq: u64,
    counters: Counters,
}

/// Everything a worker needs once a job leaves the heap.
#[derive(Clone)]
struct StartedJob {
    job_id: JobId,
    video_id: VideoId,
    source: PathBuf,
    max_frames: usize,
    force_refresh: bool,
    callback: Option<ProgressCallback>,
    event: JobEvent,
}

struct QueueInner {
    config: QueueConfig,
    pipeline: AnalysisPipeline,
    state: Mutex<QueueState>,
    job_available: Notify,
    workers: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    running: AtomicBool,
}

/// In-process analysis queue.
///
/// Jobs are dispatched highest priority first, FIFO within a priority, to
/// at most `max_workers` concurrent pipeline runs. Clones share the same
/// queue.
#[derive(Clone)]
pub struct ProcessingQueue {
    inner: Arc<QueueInner>,
}

impl ProcessingQueue {
    pub fn new(config: QueueConfig, pipeline: AnalysisPipeline) -> Self {
        let max_workers = config.max_workers;
        let config = config.with_max_workers(max_workers);
        let workers = Arc::new(Semaphore::new(config.max_workers));
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(QueueInner {
                config,
                pipeline,
                state: Mutex::new(QueueState::default()),
                job_available: Notify::new(),
                workers,
                shutdown,
                tasks: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &AnalysisPipeline {
        &self.inner.pipeline
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(AtomicOrdering::SeqCst)
    }

    /// Start the dispatcher and the periodic cleanup task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> QueueResult<()> {
        self.inner.config.validate()?;
        if self.inner.running.swap(true, AtomicOrdering::SeqCst) {
            return Err(QueueError::AlreadyRunning);
        }
        self.inner.shutdown.send_replace(false);

        let dispatcher = tokio::spawn(dispatch_loop(
            Arc::clone(&self.inner),
            self.inner.shutdown.subscribe(),
        ));
        let cleanup = cleanup::spawn_cleanup_task(
            self.clone(),
            self.inner.config.cleanup_interval,
            self.inner.shutdown.subscribe(),
        );
        lock(&self.inner.tasks).extend([dispatcher, cleanup]);

        info!(
            max_workers = self.inner.config.max_workers,
            max_queue_size = self.inner.config.max_queue_size,
            "Processing queue started"
        );
        Ok(())
    }

    /// Stop dispatching and wait for in-flight jobs to finish.
    ///
    /// Jobs still queued stay queued and run after the next `start`.
    pub async fn stop(&self) -> QueueResult<()> {
        if !self.inner.running.swap(false, AtomicOrdering::SeqCst) {
            return Err(QueueError::NotRunning);
        }
        self.inner.shutdown.send_replace(true);

        let tasks = std::mem::take(&mut *lock(&self.inner.tasks));
        for task in tasks {
            if let Err(e) = task.await {
                warn!("Queue task ended abnormally: {}", e);
            }
        }

        info!("Waiting for in-flight jobs to complete...");
        let all = self.inner.config.max_workers as u32;
        if let Ok(permits) = self.inner.workers.acquire_many(all).await {
            drop(permits);
        }

        info!("Processing queue stopped");
        Ok(())
    }

    /// Add a job. Fails with [`QueueError::QueueFull`] when `max_queue_size`
    /// jobs are already waiting.
    pub fn enqueue(&self, job: AnalysisJob) -> QueueResult<JobId> {
        if job.source.as_os_str().is_empty() {
            return Err(QueueError::invalid_job("source path is empty"));
        }
        if job.max_frames == Some(0) {
            return Err(QueueError::invalid_job("max_frames must be positive"));
        }
        let max_frames = job.max_frames.unwrap_or(self.inner.config.default_max_frames);
        let job_id = JobId::new();

        let (callback, event, depth) = {
            let mut guard = self.inner.lock_state();
            let state = &mut *guard;
            let capacity = self.inner.config.max_queue_size;
            if state.pending.len() >= capacity {
                metrics::record_rejected();
                warn!(video_id = %job.video_id, capacity, "Queue full, job rejected");
                return Err(QueueError::QueueFull { capacity });
            }

            let record = JobRecord::new(job_id.clone(), &job, max_frames, Utc::now());
            let event = record.event();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.push(PendingJob {
                priority: job.priority,
                seq,
                job_id: job_id.clone(),
            });
            state.counters.high_water = state.counters.high_water.max(state.pending.len());
            state.jobs.insert(
                job_id.clone(),
                JobEntry {
                    record,
                    force_refresh: job.force_refresh,
                    callback: job.callback.clone(),
                    result: None,
                },
            );
            (job.callback, event, state.pending.len())
        };

        metrics::set_queue_depth(depth);
        self.inner.job_available.notify_one();
        info!(
            job_id = %job_id,
            video_id = %job.video_id,
            priority = %job.priority,
            "Job enqueued"
        );
        emit(callback.as_ref(), event);
        Ok(job_id)
    }

    /// Convenience wrapper around [`enqueue`](Self::enqueue).
    pub fn enqueue_analysis_job(
        &self,
        video_id: impl Into<VideoId>,
        source: impl Into<PathBuf>,
        priority: JobPriority,
        max_frames: Option<usize>,
        callback: Option<ProgressCallback>,
    ) -> QueueResult<JobId> {
        let mut job = AnalysisJob::new(video_id, source).with_priority(priority);
        job.max_frames = max_frames;
        job.callback = callback;
        self.enqueue(job)
    }

    /// Cancel a job that has not started. Returns `false` for unknown,
    /// running or finished jobs.
    pub fn cancel_job(&self, job_id: &JobId) -> bool {
        let (callback, event, depth) = {
            let mut guard = self.inner.lock_state();
            let state = &mut *guard;
            let Some(entry) = state.jobs.get_mut(job_id) else {
                return false;
            };
            if !entry.record.transition(JobStatus::Cancelled, Utc::now()) {
                return false;
            }
            entry.record.message = "cancelled".to_string();
            let event = entry.record.event();
            let callback = entry.callback.clone();
            state.pending.retain(|pending| &pending.job_id != job_id);
            state.counters.cancelled += 1;
            (callback, event, state.pending.len())
        };

        metrics::record_cancelled();
        metrics::set_queue_depth(depth);
        info!(job_id = %job_id, "Job cancelled");
        emit(callback.as_ref(), event);
        true
    }

    pub fn get_job_status(&self, job_id: &JobId) -> Option<JobRecord> {
        self.inner
            .lock_state()
            .jobs
            .get(job_id)
            .map(|entry| entry.record.clone())
    }

    /// The analysis produced by a completed job.
    pub fn get_job_result(&self, job_id: &JobId) -> Option<VideoPoseAnalysis> {
        self.inner
            .lock_state()
            .jobs
            .get(job_id)
            .and_then(|entry| entry.result.clone())
    }

    pub fn get_queue_stats(&self) -> QueueStats {
        let state = self.inner.lock_state();
        let processing = state
            .jobs
            .values()
            .filter(|entry| entry.record.status == JobStatus::Processing)
            .count();
        let counters = &state.counters;
        let average = if counters.processed > 0 {
            counters.total_processing_ms as f64 / counters.processed as f64
        } else {
            0.0
        };

        QueueStats {
            queued: state.pending.len(),
            processing,
            tracked: state.jobs.len(),
            jobs_processed: counters.processed,
            jobs_failed: counters.failed,
            jobs_cancelled: counters.cancelled,
            total_processing_time_ms: counters.total_processing_ms,
            average_processing_time_ms: average,
            queue_high_water: counters.high_water,
            max_workers: self.inner.config.max_workers,
            max_queue_size: self.inner.config.max_queue_size,
            is_running: self.is_running(),
        }
    }

    /// Forget finished jobs whose completion is older than the retention
    /// period, measured from `now`.
    pub fn prune_finished(&self, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(self.inner.config.job_retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
        else {
            return 0;
        };

        let mut state = self.inner.lock_state();
        let before = state.jobs.len();
        state.jobs.retain(|_, entry| {
            !(entry.record.status.is_terminal()
                && entry.record.completed_at.is_some_and(|done| done <= cutoff))
        });
        before - state.jobs.len()
    }

    /// Prune old jobs and sweep expired cache entries.
    pub async fn run_maintenance(&self) -> MaintenanceReport {
        let jobs_pruned = self.prune_finished(Utc::now());
        let cache = self.inner.pipeline.cache().cleanup_expired().await;
        if jobs_pruned > 0 || cache.total() > 0 {
            info!(
                jobs_pruned,
                cache_entries_removed = cache.total(),
                "Queue maintenance finished"
            );
        }
        MaintenanceReport { jobs_pruned, cache }
    }
}

impl QueueInner {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        lock(&self.state)
    }

    /// Pop the best waiting job and mark it processing.
    fn take_next(&self) -> Option<StartedJob> {
        let mut guard = self.lock_state();
        let state = &mut *guard;
        while let Some(pending) = state.pending.pop() {
            let Some(entry) = state.jobs.get_mut(&pending.job_id) else {
                continue;
            };
            if !entry.record.transition(JobStatus::Processing, Utc::now()) {
                continue;
            }
            entry.record.advance(PROGRESS_STARTED, "processing started");
            metrics::set_queue_depth(state.pending.len());
            return Some(StartedJob {
                job_id: pending.job_id,
                video_id: entry.record.video_id.clone(),
                source: entry.record.source.clone(),
                max_frames: entry.record.max_frames,
                force_refresh: entry.force_refresh,
                callback: entry.callback.clone(),
                event: entry.record.event(),
            });
        }
        None
    }

    /// Run a job on its own task so a panicking collaborator fails the job
    /// instead of leaving it in `processing`.
    async fn run_job(self: Arc<Self>, job: StartedJob) {
        let started = Instant::now();
        let worker = Arc::clone(&self);
        let handle = tokio::spawn({
            let job = job.clone();
            async move { worker.execute(job).await }
        });

        if let Err(e) = handle.await {
            let message = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                "worker task cancelled".to_string()
            };
            let logger = JobLogger::new(&job.job_id, &job.video_id);
            logger.log_warning(&format!("worker aborted: {}", message));
            self.finish(
                &job,
                Err(QueueError::worker_panicked(message)),
                started,
                &logger,
            );
        }
    }

    async fn execute(&self, job: StartedJob) {
        let logger = JobLogger::new(&job.job_id, &job.video_id);
        let span = logger.create_span();

        async {
            logger.log_start(&format!("source={}", job.source.display()));
            emit(job.callback.as_ref(), job.event.clone());

            let started = Instant::now();
            let report = |progress: f64, message: &str| {
                if self.update_progress(&job.job_id, progress, message) {
                    logger.log_progress(progress, message);
                }
            };
            let result = self
                .pipeline
                .run(
                    &job.video_id,
                    &job.source,
                    job.max_frames,
                    job.force_refresh,
                    &report,
                )
                .await;

            self.finish(&job, result, started, &logger);
        }
        .instrument(span)
        .await
    }

    /// Record pipeline progress; returns whether it advanced.
    fn update_progress(&self, job_id: &JobId, progress: f64, message: &str) -> bool {
        let (callback, event) = {
            let mut state = self.lock_state();
            let Some(entry) = state.jobs.get_mut(job_id) else {
                return false;
            };
            if entry.record.status != JobStatus::Processing
                || !entry.record.advance(progress, message)
            {
                return false;
            }
            (entry.callback.clone(), entry.record.event())
        };
        emit(callback.as_ref(), event);
        true
    }

    fn finish(
        &self,
        job: &StartedJob,
        result: QueueResult<VideoPoseAnalysis>,
        started: Instant,
        logger: &JobLogger,
    ) {
        let elapsed_secs = started.elapsed().as_secs_f64();
        let outcome = match &result {
            Ok(analysis) => Ok(analysis.frame_count),
            Err(e) => Err(e.to_string()),
        };

        let (callback, event) = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            let Some(entry) = state.jobs.get_mut(&job.job_id) else {
                return;
            };
            if entry.record.status != JobStatus::Processing {
                return;
            }
            let now = Utc::now();
            match result {
                Ok(analysis) => {
                    entry.record.transition(JobStatus::Completed, now);
                    entry.record.advance(PROGRESS_DONE, "completed");
                    entry.record.has_result = true;
                    entry.result = Some(analysis);
                    state.counters.processed += 1;
                    state.counters.total_processing_ms +=
                        entry.record.processing_time_ms.unwrap_or(0);
                }
                Err(e) => {
                    entry.record.transition(JobStatus::Failed, now);
                    entry.record.message = "failed".to_string();
                    entry.record.error = Some(e.to_string());
                    state.counters.failed += 1;
                }
            }
            (entry.callback.clone(), entry.record.event())
        };

        match outcome {
            Ok(frames) => {
                metrics::record_completed(elapsed_secs);
                logger.log_completion(&format!("{} pose frames", frames));
            }
            Err(message) => {
                metrics::record_failed(elapsed_secs);
                logger.log_error(&message);
            }
        }
        emit(callback.as_ref(), event);
    }
}

/// Hand waiting jobs to workers until shutdown.
async fn dispatch_loop(inner: Arc<QueueInner>, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let permit = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            permit = Arc::clone(&inner.workers).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let next = loop {
            if let Some(next) = inner.take_next() {
                break Some(next);
            }
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break None;
                    }
                }
                _ = inner.job_available.notified() => {}
            }
        };
        let Some(job) = next else {
            break;
        };

        debug!(job_id = %job.job_id, "Dispatching job");
        let inner = Arc::clone(&inner);
        tokio::spawn(async move {
            let _permit = permit;
            inner.run_job(job).await;
        });
    }
    debug!("Dispatcher stopped");
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn emit(callback: Option<&ProgressCallback>, event: JobEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
