//! The per-job analysis pipeline.
//!
//! sample -> extract -> normalize -> movement summary -> cache write.
//! Each step reports a fixed progress milestone.

use chrono::Utc;
use pose_models::{VideoId, VideoPoseAnalysis};
use pose_storage::PoseCacheManager;
use pose_vision::{
    analyze_movement, extract_pose_sequence, normalize_sequence_with_layout, FrameSampler,
    LandmarkExtractor, LandmarkLayout,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::QueueResult;
use crate::progress::{
    PROGRESS_ANALYZED, PROGRESS_CACHED, PROGRESS_EXTRACTED, PROGRESS_NORMALIZED,
};

/// Reports `(progress, message)` at each milestone.
pub type ProgressFn<'a> = &'a (dyn Fn(f64, &str) + Send + Sync);

/// Runs pose analysis for one video with injected collaborators.
#[derive(Clone)]
pub struct AnalysisPipeline {
    sampler: Arc<dyn FrameSampler>,
    extractor: Arc<dyn LandmarkExtractor>,
    cache: PoseCacheManager,
    layout: LandmarkLayout,
}

impl AnalysisPipeline {
    pub fn new(
        sampler: Arc<dyn FrameSampler>,
        extractor: Arc<dyn LandmarkExtractor>,
        cache: PoseCacheManager,
    ) -> Self {
        Self {
            sampler,
            extractor,
            cache,
            layout: LandmarkLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: LandmarkLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn cache(&self) -> &PoseCacheManager {
        &self.cache
    }

    pub fn layout(&self) -> LandmarkLayout {
        self.layout
    }

    /// Analyze `source`, reusing a cached analysis unless `force_refresh`.
    ///
    /// A failed cache write is logged and does not fail the run.
    pub async fn run(
        &self,
        video_id: &VideoId,
        source: &Path,
        max_frames: usize,
        force_refresh: bool,
        progress: ProgressFn<'_>,
    ) -> QueueResult<VideoPoseAnalysis> {
        let started = Instant::now();

        if !force_refresh {
            if let Some(cached) = self.cache.get_cached_video_analysis(video_id).await {
                debug!(video_id = %video_id, "Reusing cached pose analysis");
                progress(PROGRESS_ANALYZED, "loaded cached analysis");
                return Ok(cached);
            }
        }

        let raw = extract_pose_sequence(
            self.sampler.as_ref(),
            Arc::clone(&self.extractor),
            source,
            max_frames,
        )
        .await?;
        progress(
            PROGRESS_EXTRACTED,
            &format!("extracted {} pose frames", raw.len()),
        );

        let normalized = normalize_sequence_with_layout(&raw, self.layout);
        progress(
            PROGRESS_NORMALIZED,
            &format!("normalized {} frames", normalized.len()),
        );

        let mut movement = analyze_movement(&raw, &normalized);
        movement.analyzed_at = Some(Utc::now());
        progress(
            PROGRESS_ANALYZED,
            &format!("movement: {}", movement.movement_type),
        );

        let file_size = tokio::fs::metadata(source)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        let analysis = VideoPoseAnalysis::new(
            video_id.clone(),
            raw,
            normalized,
            movement,
            started.elapsed().as_millis() as u64,
        )
        .with_file_size(file_size);

        if self.cache.put_video_analysis(&analysis).await {
            progress(PROGRESS_CACHED, "cached analysis");
        } else {
            warn!(video_id = %video_id, "Pose analysis not cached");
            progress(PROGRESS_CACHED, "analysis not cached");
        }

        Ok(analysis)
    }
}
