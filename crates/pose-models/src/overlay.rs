//! Overlay placement models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::{BodyRegion, MovementType};
use crate::video::VideoId;

/// Version of the overlay placement cache format.
pub const OVERLAY_CACHE_VERSION: u32 = 1;

/// Overlay size in pixels.
///
/// Formats as the canonical `WIDTHxHEIGHT` string used in cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct OverlayDimensions {
    pub width: u32,
    pub height: u32,
}

impl OverlayDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for OverlayDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Regions of a frame that are free for an overlay or occupied by the subject.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct OverlayZones {
    pub safe_areas: Vec<PixelRect>,
    pub avoid_areas: Vec<PixelRect>,
}

/// A candidate overlay position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlacementSuggestion {
    /// Human-readable region label (e.g. "torso_side", "upper_corner")
    pub region: String,
    pub bbox: PixelRect,
    pub confidence: f64,
}

/// Context the placement was computed from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PlacementMetadata {
    pub movement_type: MovementType,
    pub stable_regions: Vec<BodyRegion>,
    pub frames_analyzed: usize,
}

/// Cached overlay placement suggestions for one video, overlay type and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverlayPlacement {
    pub video_id: VideoId,
    /// Overlay kind (e.g. "logo", "text", "effect")
    pub overlay_type: String,
    /// Canonical `WIDTHxHEIGHT`
    pub overlay_dimensions: String,
    pub zones: OverlayZones,
    pub suggestions: Vec<PlacementSuggestion>,
    pub metadata: PlacementMetadata,
    pub confidence_score: f64,
    pub cache_version: u32,
}

impl OverlayPlacement {
    pub fn new(
        video_id: VideoId,
        overlay_type: impl Into<String>,
        dimensions: OverlayDimensions,
        zones: OverlayZones,
    ) -> Self {
        Self {
            video_id,
            overlay_type: overlay_type.into(),
            overlay_dimensions: dimensions.to_string(),
            zones,
            suggestions: Vec::new(),
            metadata: PlacementMetadata::default(),
            confidence_score: 0.0,
            cache_version: OVERLAY_CACHE_VERSION,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<PlacementSuggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_metadata(mut self, metadata: PlacementMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence_score = confidence;
        self
    }

    pub fn is_current_version(&self) -> bool {
        self.cache_version == OVERLAY_CACHE_VERSION
    }
}
