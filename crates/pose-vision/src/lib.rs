//! Pose normalization, sequence matching and overlay placement.
//!
//! The numeric core in this crate is pure and synchronous:
//! - [`normalize`]: raw landmark frames to translation/scale invariant frames
//! - [`similarity`]: frame cosine similarity and sliding-window matching
//! - [`movement`]: sequence movement summary and per-frame heuristics
//! - [`placement`]: overlay safe and avoid zones in pixel space
//!
//! [`provider`] defines the sampler and extractor seams that connect the
//! core to real video; [`synthetic`] implements both without any video.

pub mod error;
pub mod landmarks;
pub mod movement;
pub mod normalize;
pub mod placement;
pub mod provider;
pub mod similarity;
pub mod synthetic;

pub use error::{VisionError, VisionResult};
pub use landmarks::{extract_coordinates, select_key_points, LandmarkLayout};
pub use movement::{
    analyze_movement, classify_frame_activity, classify_variation, stable_regions, FrameActivity,
};
pub use normalize::{
    normalize_frame, normalize_frame_with_layout, normalize_raw_frame, normalize_sequence,
    normalize_sequence_with_layout,
};
pub use placement::{plan_overlay_placement, person_bounds, suggestions_for_regions, zones_from_bounds};
pub use provider::{extract_pose_sequence, FrameSampler, LandmarkExtractor, SampledFrame};
pub use similarity::{
    best_window, frame_similarity, sequence_match, sequence_match_with_layout, WindowMatch,
};
pub use synthetic::{SyntheticExtractor, SyntheticSampler};
