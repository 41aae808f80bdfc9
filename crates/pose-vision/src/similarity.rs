//! Frame similarity and sliding-window sequence matching.

use pose_models::NormalizedFrame;

use crate::landmarks::LandmarkLayout;
use crate::normalize::normalize_sequence_with_layout;

/// Cosine similarity between two normalized frames, remapped to [0, 1].
///
/// Returns exactly 0.0 when the frames differ in length, either is empty,
/// or either has zero norm.
pub fn frame_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
    let score = (cosine + 1.0) / 2.0;
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Best alignment of a short sequence inside a long one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMatch {
    /// Index in the long sequence where the best window starts.
    pub offset: usize,
    /// Average frame similarity of that window.
    pub score: f64,
}

/// Slide `short` over `long` one frame at a time and return the best window.
///
/// Both sequences must already be normalized. Returns `None` when either
/// is empty or `short` is longer than `long`. Ties keep the earliest offset.
pub fn best_window(long: &[NormalizedFrame], short: &[NormalizedFrame]) -> Option<WindowMatch> {
    if long.is_empty() || short.is_empty() || short.len() > long.len() {
        return None;
    }

    let window = short.len();
    let mut best: Option<WindowMatch> = None;

    for offset in 0..=(long.len() - window) {
        let total: f64 = long[offset..offset + window]
            .iter()
            .zip(short)
            .map(|(l, s)| frame_similarity(l.values(), s.values()))
            .sum();
        let score = total / window as f64;

        if best.map_or(true, |b| score > b.score) {
            best = Some(WindowMatch { offset, score });
        }
    }

    best
}

/// Maximum windowed similarity of `short` inside `long`, in [0, 1].
///
/// Both inputs are raw landmark sequences and are normalized independently.
/// Returns exactly 0.0 when either is empty, when `short` is longer than
/// `long`, or when normalization leaves nothing to compare.
pub fn sequence_match<F: AsRef<[f64]>>(long: &[F], short: &[F]) -> f64 {
    sequence_match_with_layout(long, short, LandmarkLayout::Positional)
}

/// [`sequence_match`] with an explicit landmark layout.
pub fn sequence_match_with_layout<F: AsRef<[f64]>>(
    long: &[F],
    short: &[F],
    layout: LandmarkLayout,
) -> f64 {
    if long.is_empty() || short.is_empty() || short.len() > long.len() {
        return 0.0;
    }

    let long = normalize_sequence_with_layout(long, layout);
    let short = normalize_sequence_with_layout(short, layout);

    best_window(&long, &short).map_or(0.0, |m| m.score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(scale: f64, offset_x: f64, offset_y: f64, arm_raise: f64) -> Vec<f64> {
        let landmarks = [
            [0.5, 0.2],
            [0.35, 0.4],
            [0.65, 0.4],
            [0.25, 0.6 - arm_raise],
            [0.75, 0.6],
            [0.15, 0.8 - 2.0 * arm_raise],
            [0.85, 0.8],
        ];
        landmarks
            .iter()
            .flat_map(|[x, y]| [x * scale + offset_x, y * scale + offset_y, 0.0, 0.9])
            .collect()
    }

    fn walking_sequence(frames: usize) -> Vec<Vec<f64>> {
        (0..frames)
            .map(|i| pose(1.0, 0.01 * i as f64, 0.0, 0.05 * i as f64))
            .collect()
    }

    #[test]
    fn test_frame_similarity_identical() {
        let a = [0.1, 0.2, 0.3];
        assert!((frame_similarity(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_similarity_opposite() {
        let a = [1.0, 0.0];
        let b = [-1.0, 0.0];
        assert!(frame_similarity(&a, &b).abs() < 1e-9);
    }

    #[test]
    fn test_frame_similarity_guards() {
        assert_eq!(frame_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(frame_similarity(&[], &[]), 0.0);
        assert_eq!(frame_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_five_by_two_window() {
        let long = walking_sequence(5);
        let short = walking_sequence(2);

        let score = sequence_match(&long, &short);
        assert!(score > 0.5);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_best_window_finds_offset() {
        let long = crate::normalize::normalize_sequence(&walking_sequence(6));
        let short = long[3..5].to_vec();

        let found = best_window(&long, &short).unwrap();
        assert_eq!(found.offset, 3);
        assert!((found.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_invariance() {
        let base = vec![pose(1.0, 0.0, 0.0, 0.1)];
        for k in [0.5, 1.1, 1.5, 2.0] {
            let scaled = vec![pose(k, 0.0, 0.0, 0.1)];
            let score = sequence_match(&base, &scaled);
            assert!(score > 0.9, "scale {k} scored {score}");
        }
    }

    #[test]
    fn test_translation_invariance() {
        let base = vec![pose(1.0, 0.0, 0.0, 0.1)];
        let moved = vec![pose(1.0, 0.2, -0.15, 0.1)];
        let score = sequence_match(&base, &moved);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_similarity() {
        let seq = walking_sequence(4);
        assert!(sequence_match(&seq, &seq) > 0.9);
    }

    #[test]
    fn test_short_longer_than_long_is_zero() {
        let long = walking_sequence(2);
        let short = walking_sequence(5);
        assert_eq!(sequence_match(&long, &short), 0.0);
    }

    #[test]
    fn test_empty_inputs_are_zero() {
        let seq = walking_sequence(3);
        let empty: Vec<Vec<f64>> = Vec::new();
        assert_eq!(sequence_match(&seq, &empty), 0.0);
        assert_eq!(sequence_match(&empty, &seq), 0.0);
        assert_eq!(sequence_match(&empty, &empty), 0.0);
    }

    #[test]
    fn test_degenerate_frames_are_zero() {
        let bad = vec![vec![0.5, 0.5, 0.0]];
        assert_eq!(sequence_match(&bad, &bad), 0.0);

        let seq = walking_sequence(3);
        assert_eq!(sequence_match(&seq, &[vec![0.1, 0.2, 0.0, 0.9]]), 0.0);
    }

    #[test]
    fn test_match_is_deterministic() {
        let long = walking_sequence(6);
        let short = walking_sequence(3);
        let first = sequence_match(&long, &short);
        let second = sequence_match(&long, &short);
        assert_eq!(first.to_bits(), second.to_bits());
    }
}
