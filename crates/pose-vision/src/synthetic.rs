//! Synthetic collaborators for self-checks and tests.
//!
//! [`SyntheticSampler`] produces blank frames without touching the source
//! and [`SyntheticExtractor`] returns a deterministic waving pose derived
//! from each frame's timestamp.

use async_trait::async_trait;
use image::RgbImage;
use pose_models::{raw_frame_from_landmarks, Landmark, RawFrame};
use std::path::Path;

use crate::error::VisionResult;
use crate::provider::{FrameSampler, LandmarkExtractor, SampledFrame};

/// Samples `frame_count` blank frames at `fps`.
#[derive(Debug, Clone)]
pub struct SyntheticSampler {
    pub frame_count: usize,
    pub fps: f64,
}

impl Default for SyntheticSampler {
    fn default() -> Self {
        Self {
            frame_count: 30,
            fps: 10.0,
        }
    }
}

#[async_trait]
impl FrameSampler for SyntheticSampler {
    async fn sample_frames(&self, _source: &Path, max_frames: usize) -> VisionResult<Vec<SampledFrame>> {
        let fps = if self.fps > 0.0 { self.fps } else { 1.0 };
        Ok((0..self.frame_count.min(max_frames))
            .map(|i| SampledFrame::new(i as f64 / fps, RgbImage::new(8, 8)))
            .collect())
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

/// Emits a seven-landmark pose whose left arm swings with time.
#[derive(Debug, Clone)]
pub struct SyntheticExtractor {
    /// Vertical swing of the left wrist, in image-relative units.
    pub amplitude: f64,
}

impl Default for SyntheticExtractor {
    fn default() -> Self {
        Self { amplitude: 0.1 }
    }
}

impl SyntheticExtractor {
    /// The pose this extractor reports at `t` seconds.
    pub fn pose_at(&self, t: f64) -> RawFrame {
        let swing = self.amplitude * t.sin();
        raw_frame_from_landmarks(&[
            Landmark::new(0.5, 0.2, 0.0, 0.95),
            Landmark::new(0.4, 0.35, 0.0, 0.9),
            Landmark::new(0.6, 0.35, 0.0, 0.9),
            Landmark::new(0.35, 0.5 - swing / 2.0, 0.0, 0.85),
            Landmark::new(0.65, 0.5, 0.0, 0.85),
            Landmark::new(0.3, 0.65 - swing, 0.0, 0.8),
            Landmark::new(0.7, 0.65, 0.0, 0.8),
        ])
    }
}

impl LandmarkExtractor for SyntheticExtractor {
    fn extract(&self, frame: &SampledFrame) -> VisionResult<Option<RawFrame>> {
        Ok(Some(self.pose_at(frame.timestamp_secs)))
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_sequence;

    #[tokio::test]
    async fn test_sampler_caps_frames() {
        let sampler = SyntheticSampler {
            frame_count: 12,
            fps: 4.0,
        };
        let frames = sampler.sample_frames(Path::new("unused"), 5).await.unwrap();
        assert_eq!(frames.len(), 5);
        assert!((frames[4].timestamp_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_poses_normalize() {
        let extractor = SyntheticExtractor::default();
        let frames: Vec<RawFrame> = (0..4).map(|i| extractor.pose_at(i as f64)).collect();
        assert_eq!(normalize_sequence(&frames).len(), 4);
    }
}
