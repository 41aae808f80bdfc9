//! Pose normalization.
//!
//! Converts raw landmark frames into a translation- and scale-invariant
//! form: every key point is expressed relative to the shoulder midpoint
//! and divided by the shoulder width. Normalization is a pure function of
//! its input; malformed frames produce `None` and are dropped from
//! sequences rather than padded.

use pose_models::{KeyPoint, LowerBodySource, NormalizedFrame, Point2, KEY_POINT_COUNT};

use crate::landmarks::{extract_coordinates, select_key_points, LandmarkLayout};

/// Normalize one frame given as `(x, y)` coordinates in landmark order.
///
/// Uses the positional layout. Returns `None` when fewer than seven
/// coordinates are supplied.
pub fn normalize_frame(coordinates: &[Point2]) -> Option<NormalizedFrame> {
    normalize_frame_with_layout(coordinates, LandmarkLayout::Positional)
}

/// Normalize one frame using an explicit landmark layout.
pub fn normalize_frame_with_layout(
    coordinates: &[Point2],
    layout: LandmarkLayout,
) -> Option<NormalizedFrame> {
    let (points, lower_body) = select_key_points(coordinates, layout)?;
    normalize_key_points(&points, lower_body)
}

/// Normalize a raw four-values-per-landmark frame.
pub fn normalize_raw_frame(frame: &[f64], layout: LandmarkLayout) -> Option<NormalizedFrame> {
    normalize_frame_with_layout(&extract_coordinates(frame), layout)
}

/// Normalize every frame of a sequence, dropping frames that fail.
///
/// The output may be shorter than the input.
pub fn normalize_sequence<F: AsRef<[f64]>>(frames: &[F]) -> Vec<NormalizedFrame> {
    normalize_sequence_with_layout(frames, LandmarkLayout::Positional)
}

/// Normalize a sequence using an explicit landmark layout.
pub fn normalize_sequence_with_layout<F: AsRef<[f64]>>(
    frames: &[F],
    layout: LandmarkLayout,
) -> Vec<NormalizedFrame> {
    frames
        .iter()
        .filter_map(|frame| normalize_raw_frame(frame.as_ref(), layout))
        .collect()
}

fn normalize_key_points(
    points: &[Point2; KEY_POINT_COUNT],
    lower_body: LowerBodySource,
) -> Option<NormalizedFrame> {
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return None;
    }

    let left_shoulder = points[KeyPoint::LeftShoulder.index()];
    let right_shoulder = points[KeyPoint::RightShoulder.index()];

    let origin = left_shoulder.midpoint(right_shoulder);
    let mut width = left_shoulder.distance(right_shoulder);
    if width == 0.0 {
        width = 1.0;
    }

    let normalized = points.map(|p| Point2::new((p.x - origin.x) / width, (p.y - origin.y) / width));
    Some(NormalizedFrame::from_points(&normalized, lower_body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_models::NORMALIZED_FRAME_LEN;

    /// Seven-landmark pose: nose, shoulders, elbows, wrists.
    fn test_frame(scale: f64, offset_x: f64, offset_y: f64) -> Vec<f64> {
        let landmarks = [
            [0.5, 0.2, 0.0, 0.9],
            [0.3, 0.4, 0.0, 0.9],
            [0.7, 0.4, 0.0, 0.9],
            [0.2, 0.6, 0.0, 0.8],
            [0.8, 0.6, 0.0, 0.8],
            [0.1, 0.8, 0.0, 0.7],
            [0.9, 0.8, 0.0, 0.7],
        ];
        landmarks
            .iter()
            .flat_map(|l| [l[0] * scale + offset_x, l[1] * scale + offset_y, l[2], l[3]])
            .collect()
    }

    fn standing_frame() -> Vec<f64> {
        vec![
            0.5, 0.2, 0.0, 0.95, 0.35, 0.4, 0.0, 0.9, 0.65, 0.4, 0.0, 0.9, 0.25, 0.6, 0.0, 0.85,
            0.75, 0.6, 0.0, 0.85, 0.15, 0.8, 0.0, 0.8, 0.85, 0.8, 0.0, 0.8,
        ]
    }

    #[test]
    fn test_standing_frame_is_origin_centered() {
        let normalized = normalize_sequence(&[standing_frame()]);
        assert_eq!(normalized.len(), 1);

        let values = normalized[0].values();
        assert_eq!(values.len(), NORMALIZED_FRAME_LEN);
        assert!((values[2] + values[4]).abs() < 0.1);
        assert!((values[3] + values[5]).abs() < 1e-9);
    }

    #[test]
    fn test_shoulders_map_to_unit_width() {
        let frame = normalize_raw_frame(&standing_frame(), LandmarkLayout::Positional).unwrap();
        let left = frame.point(KeyPoint::LeftShoulder);
        let right = frame.point(KeyPoint::RightShoulder);

        assert!((left.x + 0.5).abs() < 1e-9);
        assert!((right.x - 0.5).abs() < 1e-9);
        assert_eq!(frame.lower_body(), LowerBodySource::Derived);
    }

    #[test]
    fn test_sequence_keeps_valid_frames() {
        let frames = vec![test_frame(1.0, 0.0, 0.0), test_frame(1.1, 0.1, 0.1)];
        let normalized = normalize_sequence(&frames);

        assert_eq!(normalized.len(), 2);
        for frame in &normalized {
            assert_eq!(frame.values().len(), 22);
            assert!(frame.values().iter().all(|v| (-5.0..=5.0).contains(v)));
        }
    }

    #[test]
    fn test_empty_sequence() {
        assert!(normalize_sequence::<Vec<f64>>(&[]).is_empty());
    }

    #[test]
    fn test_degenerate_frames_are_dropped() {
        assert!(normalize_sequence(&[vec![0.5, 0.5, 0.0]]).is_empty());

        let six_landmarks = test_frame(1.0, 0.0, 0.0)[..24].to_vec();
        assert!(normalize_sequence(&[six_landmarks.clone(), six_landmarks]).is_empty());

        let mixed = vec![vec![0.1, 0.2], test_frame(1.0, 0.0, 0.0)];
        assert_eq!(normalize_sequence(&mixed).len(), 1);
    }

    #[test]
    fn test_too_few_coordinates() {
        let coords = vec![Point2::new(0.5, 0.5); 6];
        assert!(normalize_frame(&coords).is_none());
    }

    #[test]
    fn test_zero_shoulder_width_uses_unit_scale() {
        let mut coords = vec![Point2::new(0.4, 0.4); 7];
        coords[0] = Point2::new(0.5, 0.2);
        let frame = normalize_frame(&coords).unwrap();

        let nose = frame.point(KeyPoint::Nose);
        assert!((nose.x - 0.1).abs() < 1e-9);
        assert!((nose.y + 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let mut frame = test_frame(1.0, 0.0, 0.0);
        frame[0] = f64::NAN;
        assert!(normalize_raw_frame(&frame, LandmarkLayout::Positional).is_none());
    }

    #[test]
    fn test_translation_and_scale_are_removed() {
        let base = normalize_raw_frame(&test_frame(1.0, 0.0, 0.0), LandmarkLayout::Positional)
            .unwrap();
        let moved = normalize_raw_frame(&test_frame(1.0, 0.2, -0.1), LandmarkLayout::Positional)
            .unwrap();

        for (a, b) in base.values().iter().zip(moved.values()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let frames = vec![test_frame(1.3, 0.05, 0.0), standing_frame()];
        let first = normalize_sequence(&frames);
        let second = normalize_sequence(&frames);

        for (a, b) in first.iter().zip(&second) {
            let bits_a: Vec<u64> = a.values().iter().map(|v| v.to_bits()).collect();
            let bits_b: Vec<u64> = b.values().iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }
}
