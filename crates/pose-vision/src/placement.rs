//! Overlay safe-zone estimation.
//!
//! Works in pixel space: the person's bounding box is taken from the first
//! seven landmarks of each raw frame, padded, and marked as an avoid area.
//! Bands above, right of and below the person become safe areas when they
//! leave enough room.

use pose_models::{
    BodyRegion, OverlayDimensions, OverlayPlacement, OverlayZones, PixelRect, PlacementMetadata,
    PlacementSuggestion, VideoId, VideoPoseAnalysis, MIN_LANDMARKS,
};
use tracing::debug;

use crate::landmarks::extract_coordinates;
use crate::movement::stable_regions;

/// Padding added around the person bounding box, in pixels.
pub const PERSON_PADDING_PX: f64 = 50.0;

/// Minimum free space for a band to count as a safe area, in pixels.
pub const MIN_FREE_BAND_PX: f64 = 100.0;

/// Gap between the person bounding box and a safe band, in pixels.
pub const BAND_GAP_PX: f64 = 20.0;

const SAFE_AREA_CONFIDENCE: f64 = 0.6;

/// Axis-aligned box in pixels, kept as floats until it is emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PersonBounds {
    fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Bounding box of the first seven landmarks of a raw frame, in pixels.
///
/// Returns `None` for frames with fewer than seven landmarks or non-finite
/// coordinates.
pub fn person_bounds(frame: &[f64], frame_width: u32, frame_height: u32) -> Option<PersonBounds> {
    let coords = extract_coordinates(frame);
    if coords.len() < MIN_LANDMARKS {
        return None;
    }

    let w = frame_width as f64;
    let h = frame_height as f64;
    let mut bounds = PersonBounds {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for p in &coords[..MIN_LANDMARKS] {
        if !p.x.is_finite() || !p.y.is_finite() {
            return None;
        }
        let (x, y) = (p.x * w, p.y * h);
        bounds.min_x = bounds.min_x.min(x);
        bounds.min_y = bounds.min_y.min(y);
        bounds.max_x = bounds.max_x.max(x);
        bounds.max_y = bounds.max_y.max(y);
    }

    Some(bounds)
}

/// Pad the person box into an avoid area and collect the free bands.
pub fn zones_from_bounds(bounds: PersonBounds, frame_width: u32, frame_height: u32) -> OverlayZones {
    let w = frame_width as f64;
    let h = frame_height as f64;

    let min_x = (bounds.min_x - PERSON_PADDING_PX).max(0.0);
    let min_y = (bounds.min_y - PERSON_PADDING_PX).max(0.0);
    let max_x = (bounds.max_x + PERSON_PADDING_PX).min(w);
    let max_y = (bounds.max_y + PERSON_PADDING_PX).min(h);

    let mut zones = OverlayZones::default();
    zones.avoid_areas.push(rect(min_x, min_y, max_x - min_x, max_y - min_y));

    if min_y > MIN_FREE_BAND_PX {
        zones.safe_areas.push(rect(0.0, 0.0, w, min_y - BAND_GAP_PX));
    }
    if w - max_x > MIN_FREE_BAND_PX {
        zones
            .safe_areas
            .push(rect(max_x + BAND_GAP_PX, 0.0, w - max_x - BAND_GAP_PX, h));
    }
    if h - max_y > MIN_FREE_BAND_PX {
        zones
            .safe_areas
            .push(rect(0.0, max_y + BAND_GAP_PX, w, h - max_y - BAND_GAP_PX));
    }

    zones
}

/// Fixed placement suggestions next to stable body regions.
pub fn suggestions_for_regions(
    regions: &[BodyRegion],
    frame_width: u32,
    frame_height: u32,
) -> Vec<PlacementSuggestion> {
    let w = frame_width as f64;
    let h = frame_height as f64;

    regions
        .iter()
        .map(|region| match region {
            BodyRegion::Torso => PlacementSuggestion {
                region: "torso_side".to_string(),
                bbox: rect(0.7 * w, 0.3 * h, 0.25 * w, 0.4 * h),
                confidence: 0.8,
            },
            BodyRegion::HeadArea => PlacementSuggestion {
                region: "upper_corner".to_string(),
                bbox: rect(0.75 * w, 0.1 * h, 0.2 * w, 0.2 * h),
                confidence: 0.7,
            },
        })
        .collect()
}

/// Build a placement record for an overlay of the given size.
///
/// The avoid area is the union of person boxes across all valid frames.
/// Regions count as stable when at least half the normalized frames show
/// them. Safe bands large enough to hold the overlay become suggestions.
pub fn plan_overlay_placement(
    video_id: VideoId,
    overlay_type: &str,
    dimensions: OverlayDimensions,
    frame_width: u32,
    frame_height: u32,
    analysis: &VideoPoseAnalysis,
) -> OverlayPlacement {
    let bounds = analysis
        .pose_sequences
        .iter()
        .filter_map(|frame| person_bounds(frame, frame_width, frame_height))
        .reduce(PersonBounds::union);

    let zones = bounds
        .map(|b| zones_from_bounds(b, frame_width, frame_height))
        .unwrap_or_default();

    let regions = consistent_regions(analysis);
    let mut suggestions = suggestions_for_regions(&regions, frame_width, frame_height);
    suggestions.extend(
        zones
            .safe_areas
            .iter()
            .filter(|area| area.width >= dimensions.width && area.height >= dimensions.height)
            .map(|area| PlacementSuggestion {
                region: "safe_area".to_string(),
                bbox: PixelRect::new(area.x, area.y, dimensions.width, dimensions.height),
                confidence: SAFE_AREA_CONFIDENCE,
            }),
    );

    let confidence = if suggestions.is_empty() {
        0.0
    } else {
        suggestions.iter().map(|s| s.confidence).sum::<f64>() / suggestions.len() as f64
    };

    debug!(
        video_id = %video_id,
        overlay_type,
        safe_areas = zones.safe_areas.len(),
        suggestions = suggestions.len(),
        "Planned overlay placement"
    );

    let metadata = PlacementMetadata {
        movement_type: analysis.movement_analysis.movement_type,
        stable_regions: regions,
        frames_analyzed: analysis.normalized_poses.len(),
    };

    OverlayPlacement::new(video_id, overlay_type, dimensions, zones)
        .with_suggestions(suggestions)
        .with_metadata(metadata)
        .with_confidence(confidence)
}

fn consistent_regions(analysis: &VideoPoseAnalysis) -> Vec<BodyRegion> {
    let frames = &analysis.normalized_poses;
    if frames.is_empty() {
        return Vec::new();
    }

    let per_frame: Vec<Vec<BodyRegion>> = frames.iter().map(|f| stable_regions(f.values())).collect();
    [BodyRegion::Torso, BodyRegion::HeadArea]
        .into_iter()
        .filter(|region| {
            let seen = per_frame.iter().filter(|r| r.contains(region)).count();
            seen * 2 >= frames.len()
        })
        .collect()
}

fn rect(x: f64, y: f64, width: f64, height: f64) -> PixelRect {
    PixelRect::new(
        x.max(0.0).round() as u32,
        y.max(0.0).round() as u32,
        width.max(0.0).round() as u32,
        height.max(0.0).round() as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::analyze_movement;
    use crate::normalize::normalize_sequence;

    /// Person centred horizontally in the middle third of the frame.
    fn centred_frame() -> Vec<f64> {
        [
            [0.5, 0.3],
            [0.45, 0.4],
            [0.55, 0.4],
            [0.42, 0.5],
            [0.58, 0.5],
            [0.4, 0.6],
            [0.6, 0.6],
        ]
        .iter()
        .flat_map(|[x, y]| [*x, *y, 0.0, 0.9])
        .collect()
    }

    fn analysis_for(frames: Vec<Vec<f64>>) -> VideoPoseAnalysis {
        let normalized = normalize_sequence(&frames);
        let movement = analyze_movement(&frames, &normalized);
        VideoPoseAnalysis::new(VideoId::from("v1"), frames, normalized, movement, 10)
    }

    #[test]
    fn test_person_bounds_in_pixels() {
        let bounds = person_bounds(&centred_frame(), 1000, 1000).unwrap();
        assert!((bounds.min_x - 400.0).abs() < 1e-6);
        assert!((bounds.max_x - 600.0).abs() < 1e-6);
        assert!((bounds.min_y - 300.0).abs() < 1e-6);
        assert!((bounds.max_y - 600.0).abs() < 1e-6);

        assert!(person_bounds(&centred_frame()[..24], 1000, 1000).is_none());
    }

    #[test]
    fn test_zones_have_all_bands() {
        let bounds = person_bounds(&centred_frame(), 1000, 1000).unwrap();
        let zones = zones_from_bounds(bounds, 1000, 1000);

        assert_eq!(zones.avoid_areas, vec![PixelRect::new(350, 250, 300, 400)]);
        assert_eq!(
            zones.safe_areas,
            vec![
                PixelRect::new(0, 0, 1000, 230),
                PixelRect::new(670, 0, 330, 1000),
                PixelRect::new(0, 670, 1000, 330),
            ]
        );
    }

    #[test]
    fn test_person_filling_frame_has_no_safe_area() {
        let bounds = PersonBounds {
            min_x: 10.0,
            min_y: 10.0,
            max_x: 990.0,
            max_y: 990.0,
        };
        let zones = zones_from_bounds(bounds, 1000, 1000);
        assert!(zones.safe_areas.is_empty());
        assert_eq!(zones.avoid_areas.len(), 1);
    }

    #[test]
    fn test_region_suggestions() {
        let suggestions = suggestions_for_regions(&[BodyRegion::Torso, BodyRegion::HeadArea], 1000, 500);
        assert_eq!(suggestions[0].region, "torso_side");
        assert_eq!(suggestions[0].bbox, PixelRect::new(700, 150, 250, 200));
        assert_eq!(suggestions[1].region, "upper_corner");
        assert_eq!(suggestions[1].bbox, PixelRect::new(750, 50, 200, 100));
    }

    #[test]
    fn test_plan_overlay_placement() {
        let analysis = analysis_for(vec![centred_frame(), centred_frame()]);
        let placement = plan_overlay_placement(
            VideoId::from("v1"),
            "logo",
            OverlayDimensions::new(200, 150),
            1000,
            1000,
            &analysis,
        );

        assert_eq!(placement.overlay_dimensions, "200x150");
        assert_eq!(
            placement.metadata.stable_regions,
            vec![BodyRegion::Torso, BodyRegion::HeadArea]
        );
        assert_eq!(placement.metadata.frames_analyzed, 2);
        assert!(placement.suggestions.iter().any(|s| s.region == "safe_area"));
        assert!(placement.confidence_score > 0.0 && placement.confidence_score <= 1.0);
    }

    #[test]
    fn test_plan_without_frames() {
        let analysis = analysis_for(Vec::new());
        let placement = plan_overlay_placement(
            VideoId::from("v1"),
            "logo",
            OverlayDimensions::new(200, 150),
            1000,
            1000,
            &analysis,
        );

        assert!(placement.zones.safe_areas.is_empty());
        assert!(placement.suggestions.is_empty());
        assert_eq!(placement.confidence_score, 0.0);
    }
}
