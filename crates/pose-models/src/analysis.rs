//! Movement summaries and the cached per-video pose analysis record.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::pose::{average_visibility, NormalizedFrame, RawFrame};
use crate::video::VideoId;

/// Version of the video pose analysis format.
/// Increment this when normalization changes to invalidate cached analyses.
pub const POSE_ANALYSIS_VERSION: u32 = 1;

/// Coarse activity classification of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// No pose data to classify
    #[default]
    None,
    Static,
    LowActivity,
    ModerateActivity,
    HighActivity,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::None => "none",
            MovementType::Static => "static",
            MovementType::LowActivity => "low_activity",
            MovementType::ModerateActivity => "moderate_activity",
            MovementType::HighActivity => "high_activity",
        }
    }

    /// Motion level in [0, 1] used when ranking overlay placements.
    pub fn motion_level(&self) -> f64 {
        match self {
            MovementType::HighActivity => 0.9,
            MovementType::ModerateActivity => 0.6,
            MovementType::LowActivity => 0.3,
            MovementType::Static => 0.1,
            MovementType::None => 0.4,
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body regions stable enough to anchor an overlay near.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BodyRegion {
    Torso,
    HeadArea,
}

/// Summary of the movement in a pose sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MovementAnalysis {
    pub movement_type: MovementType,
    /// Average landmark visibility over the raw frames
    pub confidence: f64,
    /// Average L1 distance between consecutive normalized frames
    pub variation_score: f64,
    /// Raw frames the summary was computed from
    pub frame_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl MovementAnalysis {
    /// Summary for a video where no pose was detected.
    pub fn none() -> Self {
        Self {
            movement_type: MovementType::None,
            confidence: 0.0,
            variation_score: 0.0,
            frame_count: 0,
            analyzed_at: None,
        }
    }
}

impl Default for MovementAnalysis {
    fn default() -> Self {
        Self::none()
    }
}

/// Cached pose analysis of a whole video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoPoseAnalysis {
    pub video_id: VideoId,
    /// Version of the analysis format for cache invalidation
    pub analysis_version: u32,
    /// Raw landmark frames as returned by the extractor
    pub pose_sequences: Vec<RawFrame>,
    /// Frames that normalized successfully
    pub normalized_poses: Vec<NormalizedFrame>,
    pub movement_analysis: MovementAnalysis,
    pub frame_count: usize,
    pub confidence_avg: f64,
    pub processing_time_ms: u64,
    #[serde(default)]
    pub file_size_bytes: u64,
}

impl VideoPoseAnalysis {
    /// Build a current-version analysis record, deriving frame count and confidence.
    pub fn new(
        video_id: VideoId,
        pose_sequences: Vec<RawFrame>,
        normalized_poses: Vec<NormalizedFrame>,
        movement_analysis: MovementAnalysis,
        processing_time_ms: u64,
    ) -> Self {
        let frame_count = pose_sequences.len();
        let confidence_avg = average_visibility(&pose_sequences);
        Self {
            video_id,
            analysis_version: POSE_ANALYSIS_VERSION,
            pose_sequences,
            normalized_poses,
            movement_analysis,
            frame_count,
            confidence_avg,
            processing_time_ms,
            file_size_bytes: 0,
        }
    }

    /// Set the source file size.
    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size_bytes = bytes;
        self
    }

    /// Check if this analysis is compatible with the current version.
    pub fn is_current_version(&self) -> bool {
        self.analysis_version == POSE_ANALYSIS_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_derives_metadata() {
        let frames = vec![vec![0.5, 0.2, 0.0, 0.9], vec![0.5, 0.2, 0.0, 0.7]];
        let analysis = VideoPoseAnalysis::new(
            VideoId::from("v1"),
            frames,
            Vec::new(),
            MovementAnalysis::none(),
            42,
        );

        assert_eq!(analysis.frame_count, 2);
        assert!((analysis.confidence_avg - 0.8).abs() < 1e-9);
        assert!(analysis.is_current_version());
    }

    #[test]
    fn test_movement_type_serialization() {
        let json = serde_json::to_string(&MovementType::ModerateActivity).unwrap();
        assert_eq!(json, "\"moderate_activity\"");
    }
}
