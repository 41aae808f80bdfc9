//! The engine facade.

use pose_models::{
    CleanupStats, JobId, JobPriority, MovementAnalysis, NormalizedFrame, OverlayDimensions,
    OverlayPlacement, RawFrame, SequenceMatch, VideoId, VideoPoseAnalysis,
};
use pose_queue::{
    AnalysisJob, AnalysisPipeline, JobRecord, ProcessingQueue, ProgressCallback, QueueStats,
};
use pose_storage::PoseCacheManager;
use pose_vision::{
    normalize_sequence_with_layout, plan_overlay_placement, sequence_match_with_layout,
    FrameSampler, LandmarkExtractor, LandmarkLayout,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Pose normalization, matching, caching and background analysis behind
/// one handle.
///
/// Clones share the cache and the queue.
#[derive(Clone)]
pub struct PoseEngine {
    layout: LandmarkLayout,
    cache: PoseCacheManager,
    queue: ProcessingQueue,
}

impl PoseEngine {
    /// Build an engine whose cache backend comes from `config`.
    pub fn new(
        config: EngineConfig,
        sampler: Arc<dyn FrameSampler>,
        extractor: Arc<dyn LandmarkExtractor>,
    ) -> EngineResult<Self> {
        let cache = PoseCacheManager::from_config(config.cache.clone())?;
        Ok(Self::with_cache(config, cache, sampler, extractor))
    }

    /// Build an engine around an existing cache manager.
    pub fn with_cache(
        config: EngineConfig,
        cache: PoseCacheManager,
        sampler: Arc<dyn FrameSampler>,
        extractor: Arc<dyn LandmarkExtractor>,
    ) -> Self {
        info!(
            cache_backend = cache.backend_name(),
            sampler = sampler.name(),
            extractor = extractor.name(),
            layout = config.layout.as_str(),
            "Creating pose engine"
        );
        let pipeline =
            AnalysisPipeline::new(sampler, extractor, cache.clone()).with_layout(config.layout);
        let queue = ProcessingQueue::new(config.queue, pipeline);

        Self {
            layout: config.layout,
            cache,
            queue,
        }
    }

    pub fn layout(&self) -> LandmarkLayout {
        self.layout
    }

    pub fn cache(&self) -> &PoseCacheManager {
        &self.cache
    }

    pub fn queue(&self) -> &ProcessingQueue {
        &self.queue
    }

    // ------------------------------------------------------------------
    // Normalization and matching
    // ------------------------------------------------------------------

    /// Normalize raw landmark frames, dropping frames that cannot be.
    pub fn normalize_sequence<F: AsRef<[f64]>>(&self, frames: &[F]) -> Vec<NormalizedFrame> {
        normalize_sequence_with_layout(frames, self.layout)
    }

    /// Best sliding-window similarity of `short` within `long`, in [0, 1].
    pub fn match_sequence<F: AsRef<[f64]>>(&self, long: &[F], short: &[F]) -> f64 {
        sequence_match_with_layout(long, short, self.layout)
    }

    /// [`match_sequence`](Self::match_sequence) through the match cache.
    ///
    /// Lookups ignore argument order, so a score stored for `(a, b)` is
    /// also returned for `(b, a)`.
    pub async fn match_sequence_cached<F: AsRef<[f64]>>(&self, long: &[F], short: &[F]) -> f64 {
        if let Some(hit) = self.cache.get_cached_sequence_match(long, short).await {
            debug!(score = hit.similarity_score, "Sequence match served from cache");
            return hit.similarity_score;
        }

        let started = Instant::now();
        let score = self.match_sequence(long, short);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.cache
            .put_cached_sequence_match(long, short, score, elapsed_ms)
            .await;
        score
    }

    // ------------------------------------------------------------------
    // Cache
    // ------------------------------------------------------------------

    pub async fn get_cached_video_analysis(&self, video_id: &VideoId) -> Option<VideoPoseAnalysis> {
        self.cache.get_cached_video_analysis(video_id).await
    }

    pub async fn put_cached_video_analysis(
        &self,
        video_id: &VideoId,
        pose_sequences: Vec<RawFrame>,
        normalized_poses: Vec<NormalizedFrame>,
        movement_analysis: MovementAnalysis,
        processing_time_ms: u64,
    ) -> bool {
        self.cache
            .put_cached_video_analysis(
                video_id,
                pose_sequences,
                normalized_poses,
                movement_analysis,
                processing_time_ms,
            )
            .await
    }

    pub async fn get_cached_sequence_match<F: AsRef<[f64]>>(
        &self,
        sequence_a: &[F],
        sequence_b: &[F],
    ) -> Option<SequenceMatch> {
        self.cache.get_cached_sequence_match(sequence_a, sequence_b).await
    }

    pub async fn put_cached_sequence_match<F: AsRef<[f64]>>(
        &self,
        sequence_a: &[F],
        sequence_b: &[F],
        similarity_score: f64,
        computation_time_ms: u64,
    ) -> bool {
        self.cache
            .put_cached_sequence_match(sequence_a, sequence_b, similarity_score, computation_time_ms)
            .await
    }

    pub async fn get_cached_overlay_placement(
        &self,
        video_id: &VideoId,
        overlay_type: &str,
        width: u32,
        height: u32,
    ) -> Option<OverlayPlacement> {
        self.cache
            .get_cached_overlay_placement(video_id, overlay_type, width, height)
            .await
    }

    pub async fn put_cached_overlay_placement(&self, placement: &OverlayPlacement) -> bool {
        self.cache.put_cached_overlay_placement(placement).await
    }

    /// Cached placement for an overlay, computed from the video's cached
    /// analysis on a miss.
    ///
    /// Returns `None` when the video has not been analyzed.
    pub async fn overlay_placement(
        &self,
        video_id: &VideoId,
        overlay_type: &str,
        dimensions: OverlayDimensions,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<OverlayPlacement> {
        if let Some(cached) = self
            .cache
            .get_cached_overlay_placement(video_id, overlay_type, dimensions.width, dimensions.height)
            .await
        {
            return Some(cached);
        }

        let analysis = self.cache.get_cached_video_analysis(video_id).await?;
        let placement = plan_overlay_placement(
            video_id.clone(),
            overlay_type,
            dimensions,
            frame_width,
            frame_height,
            &analysis,
        );
        self.cache.put_cached_overlay_placement(&placement).await;
        Some(placement)
    }

    /// Sweep expired entries from every cache namespace.
    pub async fn cleanup_expired(&self) -> CleanupStats {
        self.cache.cleanup_expired().await
    }

    // ------------------------------------------------------------------
    // Queue
    // ------------------------------------------------------------------

    pub fn start(&self) -> EngineResult<()> {
        self.queue.start()?;
        Ok(())
    }

    pub async fn stop(&self) -> EngineResult<()> {
        self.queue.stop().await?;
        Ok(())
    }

    pub fn enqueue_analysis_job(
        &self,
        video_id: impl Into<VideoId>,
        source: impl Into<PathBuf>,
        priority: JobPriority,
        max_frames: Option<usize>,
        callback: Option<ProgressCallback>,
    ) -> EngineResult<JobId> {
        Ok(self
            .queue
            .enqueue_analysis_job(video_id, source, priority, max_frames, callback)?)
    }

    pub fn enqueue(&self, job: AnalysisJob) -> EngineResult<JobId> {
        Ok(self.queue.enqueue(job)?)
    }

    pub fn get_job_status(&self, job_id: &JobId) -> Option<JobRecord> {
        self.queue.get_job_status(job_id)
    }

    pub fn get_job_result(&self, job_id: &JobId) -> Option<VideoPoseAnalysis> {
        self.queue.get_job_result(job_id)
    }

    pub fn cancel_job(&self, job_id: &JobId) -> bool {
        self.queue.cancel_job(job_id)
    }

    pub fn get_queue_stats(&self) -> QueueStats {
        self.queue.get_queue_stats()
    }
}
