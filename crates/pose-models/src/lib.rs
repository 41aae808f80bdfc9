//! Shared data models for pose analysis.
//!
//! This crate provides Serde-serializable types for:
//! - Raw landmark frames and normalized pose frames
//! - Video and job identities, job priority and status
//! - Movement summaries and the three cache record kinds
//! - Cache namespaces, entry metadata and cleanup statistics

pub mod analysis;
pub mod cache;
pub mod job;
pub mod matching;
pub mod overlay;
pub mod pose;
pub mod video;

// Re-export common types
pub use analysis::{BodyRegion, MovementAnalysis, MovementType, VideoPoseAnalysis, POSE_ANALYSIS_VERSION};
pub use cache::{CacheNamespace, Cached, CleanupStats, EntryMeta};
pub use job::{JobId, JobPriority, JobStatus};
pub use matching::{MatchConfidence, SequenceMatch, MATCH_ALGORITHM_VERSION};
pub use overlay::{
    OverlayDimensions, OverlayPlacement, OverlayZones, PixelRect, PlacementMetadata,
    PlacementSuggestion, OVERLAY_CACHE_VERSION,
};
pub use pose::{
    average_visibility, raw_frame_from_landmarks, KeyPoint, Landmark, LowerBodySource,
    NormalizedFrame, Point2, RawFrame, FULL_BODY_LANDMARKS, KEY_POINT_COUNT, MIN_LANDMARKS,
    NORMALIZED_FRAME_LEN, VALUES_PER_LANDMARK,
};
pub use video::VideoId;
