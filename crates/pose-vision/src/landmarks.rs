//! Coordinate extraction and key point selection.

use pose_models::{
    KeyPoint, LowerBodySource, Point2, FULL_BODY_LANDMARKS, KEY_POINT_COUNT, MIN_LANDMARKS,
    VALUES_PER_LANDMARK,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Vertical offset from shoulder to derived hip, in image-relative units.
pub const DERIVED_HIP_OFFSET: f64 = 0.3;

/// Vertical offset from derived hip to derived knee.
pub const DERIVED_KNEE_OFFSET: f64 = 0.4;

/// How landmark positions map to body points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkLayout {
    /// The first seven landmarks are nose, shoulders, elbows and wrists in
    /// that order. Hips and knees are always derived.
    #[default]
    Positional,
    /// Frames with a full 33-landmark detector layout read every key point,
    /// including true hips and knees, from detector indices. Shorter frames
    /// fall back to [`LandmarkLayout::Positional`].
    Auto,
}

impl LandmarkLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkLayout::Positional => "positional",
            LandmarkLayout::Auto => "auto",
        }
    }
}

impl FromStr for LandmarkLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" => Ok(LandmarkLayout::Positional),
            "auto" => Ok(LandmarkLayout::Auto),
            other => Err(format!("unknown landmark layout: {}", other)),
        }
    }
}

/// Pull `(x, y)` out of each four-value landmark group, dropping `z` and visibility.
///
/// A trailing group with fewer than two values is ignored.
pub fn extract_coordinates(frame: &[f64]) -> Vec<Point2> {
    frame
        .chunks(VALUES_PER_LANDMARK)
        .filter(|group| group.len() >= 2)
        .map(|group| Point2::new(group[0], group[1]))
        .collect()
}

/// Select the 11 key points from extracted coordinates.
///
/// Returns `None` when fewer than seven coordinates are available.
pub fn select_key_points(
    coordinates: &[Point2],
    layout: LandmarkLayout,
) -> Option<([Point2; KEY_POINT_COUNT], LowerBodySource)> {
    if coordinates.len() < MIN_LANDMARKS {
        return None;
    }

    if layout == LandmarkLayout::Auto && coordinates.len() >= FULL_BODY_LANDMARKS {
        let mut points = [Point2::default(); KEY_POINT_COUNT];
        for key in KeyPoint::ALL {
            points[key.index()] = coordinates[key.detector_index()];
        }
        return Some((points, LowerBodySource::Detected));
    }

    Some((positional_key_points(coordinates), LowerBodySource::Derived))
}

/// Map the first seven coordinates positionally and derive hips and knees.
///
/// The hip/knee derivation is an approximation: each hip sits a fixed
/// fraction of image height below its shoulder and each knee a further
/// fixed fraction below its hip.
fn positional_key_points(coordinates: &[Point2]) -> [Point2; KEY_POINT_COUNT] {
    let nose = coordinates[0];
    let left_shoulder = coordinates[1];
    let right_shoulder = coordinates[2];
    let left_elbow = coordinates[3];
    let right_elbow = coordinates[4];
    let left_wrist = coordinates[5];
    let right_wrist = coordinates[6];

    let left_hip = left_shoulder.offset(0.0, DERIVED_HIP_OFFSET);
    let right_hip = right_shoulder.offset(0.0, DERIVED_HIP_OFFSET);
    let left_knee = left_hip.offset(0.0, DERIVED_KNEE_OFFSET);
    let right_knee = right_hip.offset(0.0, DERIVED_KNEE_OFFSET);

    [
        nose,
        left_shoulder,
        right_shoulder,
        left_elbow,
        right_elbow,
        left_wrist,
        right_wrist,
        left_hip,
        right_hip,
        left_knee,
        right_knee,
    ]
}
