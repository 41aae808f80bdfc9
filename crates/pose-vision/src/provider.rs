//! Collaborator traits for frame sampling and landmark extraction.
//!
//! Neither video decoding nor landmark detection lives in this crate.
//! Callers inject implementations of these traits; the extractor is a
//! shared, read-only resource and must be `Send + Sync`.

use async_trait::async_trait;
use image::RgbImage;
use pose_models::RawFrame;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{VisionError, VisionResult};

/// A decoded frame handed from the sampler to the extractor.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Position of the frame in the source, in seconds.
    pub timestamp_secs: f64,
    pub image: RgbImage,
}

impl SampledFrame {
    pub fn new(timestamp_secs: f64, image: RgbImage) -> Self {
        Self {
            timestamp_secs,
            image,
        }
    }
}

/// Frame sampling provider.
///
/// Decodes up to `max_frames` frames spread across the source.
#[async_trait]
pub trait FrameSampler: Send + Sync {
    async fn sample_frames(&self, source: &Path, max_frames: usize)
        -> VisionResult<Vec<SampledFrame>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Landmark extraction provider.
///
/// Returns `Ok(None)` when no person is detected in the frame. Extraction
/// is CPU-bound and is run on the blocking pool.
pub trait LandmarkExtractor: Send + Sync {
    fn extract(&self, frame: &SampledFrame) -> VisionResult<Option<RawFrame>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Sample a source and extract one raw frame per detected pose.
///
/// Frames without a detection are skipped, so the result may be shorter
/// than the number of sampled frames.
pub async fn extract_pose_sequence(
    sampler: &dyn FrameSampler,
    extractor: Arc<dyn LandmarkExtractor>,
    source: &Path,
    max_frames: usize,
) -> VisionResult<Vec<RawFrame>> {
    let frames = sampler.sample_frames(source, max_frames).await?;
    let sampled = frames.len();

    let sequence = tokio::task::spawn_blocking(move || -> VisionResult<Vec<RawFrame>> {
        let mut sequence = Vec::with_capacity(frames.len());
        for frame in &frames {
            if let Some(raw) = extractor.extract(frame)? {
                sequence.push(raw);
            }
        }
        Ok(sequence)
    })
    .await
    .map_err(|e| VisionError::extraction_failed(format!("extraction task panicked: {e}")))??;

    if sequence.is_empty() && sampled > 0 {
        warn!(
            source = %source.display(),
            sampled,
            sampler = sampler.name(),
            "No poses detected in sampled frames"
        );
    } else {
        debug!(
            source = %source.display(),
            sampled,
            detected = sequence.len(),
            "Extracted pose sequence"
        );
    }

    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct FixedSampler {
        count: usize,
    }

    #[async_trait]
    impl FrameSampler for FixedSampler {
        async fn sample_frames(
            &self,
            source: &Path,
            max_frames: usize,
        ) -> VisionResult<Vec<SampledFrame>> {
            if source.as_os_str().is_empty() {
                return Err(VisionError::SourceNotFound(source.to_path_buf()));
            }
            Ok((0..self.count.min(max_frames))
                .map(|i| SampledFrame::new(i as f64, RgbImage::new(4, 4)))
                .collect())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    /// Detects a pose on even timestamps only.
    struct EvenExtractor;

    impl LandmarkExtractor for EvenExtractor {
        fn extract(&self, frame: &SampledFrame) -> VisionResult<Option<RawFrame>> {
            if (frame.timestamp_secs as usize) % 2 == 0 {
                Ok(Some(vec![0.5; 28]))
            } else {
                Ok(None)
            }
        }

        fn name(&self) -> &'static str {
            "even"
        }
    }

    struct FailingExtractor;

    impl LandmarkExtractor for FailingExtractor {
        fn extract(&self, _frame: &SampledFrame) -> VisionResult<Option<RawFrame>> {
            Err(VisionError::extraction_failed("model not loaded"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_skips_frames_without_pose() {
        let sampler = FixedSampler { count: 5 };
        let sequence =
            extract_pose_sequence(&sampler, Arc::new(EvenExtractor), Path::new("a.mp4"), 30)
                .await
                .unwrap();
        assert_eq!(sequence.len(), 3);
    }

    #[tokio::test]
    async fn test_respects_max_frames() {
        let sampler = FixedSampler { count: 10 };
        let sequence =
            extract_pose_sequence(&sampler, Arc::new(EvenExtractor), Path::new("a.mp4"), 4)
                .await
                .unwrap();
        assert_eq!(sequence.len(), 2);
    }

    #[tokio::test]
    async fn test_propagates_errors() {
        let sampler = FixedSampler { count: 3 };
        let err = extract_pose_sequence(&sampler, Arc::new(FailingExtractor), Path::new("a.mp4"), 30)
            .await
            .unwrap_err();
        assert!(matches!(err, VisionError::ExtractionFailed { .. }));

        let err = extract_pose_sequence(&sampler, Arc::new(EvenExtractor), &PathBuf::new(), 30)
            .await
            .unwrap_err();
        assert!(matches!(err, VisionError::SourceNotFound(_)));
    }
}
