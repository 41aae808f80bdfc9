//! Movement analysis over a pose sequence and per-frame pose heuristics.

use pose_models::{average_visibility, BodyRegion, KeyPoint, MovementAnalysis, MovementType};
use serde::{Deserialize, Serialize};

/// Average frame-to-frame variation above which movement is high activity.
pub const HIGH_ACTIVITY_THRESHOLD: f64 = 2.0;
/// Variation above which movement is moderate activity.
pub const MODERATE_ACTIVITY_THRESHOLD: f64 = 1.0;
/// Variation above which movement is low activity; anything below is static.
pub const LOW_ACTIVITY_THRESHOLD: f64 = 0.3;

/// Summarize movement across a sequence.
///
/// `raw` supplies visibility for the confidence figure; `normalized`
/// supplies the frame-to-frame variation. `analyzed_at` is left unset for
/// the caller to stamp.
pub fn analyze_movement<R, N>(raw: &[R], normalized: &[N]) -> MovementAnalysis
where
    R: AsRef<[f64]>,
    N: AsRef<[f64]>,
{
    if raw.is_empty() || normalized.is_empty() {
        return MovementAnalysis::none();
    }

    let variation_score = average_variation(normalized);

    MovementAnalysis {
        movement_type: classify_variation(variation_score),
        confidence: average_visibility(raw),
        variation_score,
        frame_count: raw.len(),
        analyzed_at: None,
    }
}

/// Map a variation score onto a movement class.
pub fn classify_variation(variation: f64) -> MovementType {
    if variation > HIGH_ACTIVITY_THRESHOLD {
        MovementType::HighActivity
    } else if variation > MODERATE_ACTIVITY_THRESHOLD {
        MovementType::ModerateActivity
    } else if variation > LOW_ACTIVITY_THRESHOLD {
        MovementType::LowActivity
    } else {
        MovementType::Static
    }
}

/// Mean L1 distance between consecutive frames. Zero for a single frame.
fn average_variation<N: AsRef<[f64]>>(frames: &[N]) -> f64 {
    if frames.len() < 2 {
        return 0.0;
    }

    let total: f64 = frames
        .windows(2)
        .map(|pair| {
            pair[0]
                .as_ref()
                .iter()
                .zip(pair[1].as_ref())
                .map(|(a, b)| (b - a).abs())
                .sum::<f64>()
        })
        .sum();

    total / (frames.len() - 1) as f64
}

/// Activity implied by how far the limbs reach in a single normalized frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameActivity {
    Low,
    Moderate,
    High,
}

/// Classify one normalized frame by limb spread.
///
/// Limb spread is the sum of absolute elbow and wrist coordinates
/// (values 6..14). Returns `None` for frames shorter than that.
pub fn classify_frame_activity(frame: &[f64]) -> Option<FrameActivity> {
    let limbs = frame.get(6..14)?;
    let spread: f64 = limbs.iter().map(|v| v.abs()).sum();

    Some(if spread > 3.0 {
        FrameActivity::High
    } else if spread > 1.5 {
        FrameActivity::Moderate
    } else {
        FrameActivity::Low
    })
}

/// Body regions that look steady enough to anchor an overlay near.
///
/// The torso counts when the shoulders are level to within half a
/// shoulder width; the head area when the nose sits within 0.3 of the
/// shoulder midpoint horizontally.
pub fn stable_regions(frame: &[f64]) -> Vec<BodyRegion> {
    let coord = |key: KeyPoint, axis: usize| frame.get(key.index() * 2 + axis).copied();
    let mut regions = Vec::new();

    if let (Some(left), Some(right)) = (
        coord(KeyPoint::LeftShoulder, 1),
        coord(KeyPoint::RightShoulder, 1),
    ) {
        if (left - right).abs() < 0.5 {
            regions.push(BodyRegion::Torso);
        }
    }

    if let Some(nose_x) = coord(KeyPoint::Nose, 0) {
        if nose_x.abs() < 0.3 {
            regions.push(BodyRegion::HeadArea);
        }
    }

    regions
}
