//! Landmark and frame models.
//!
//! Raw frames arrive from the landmark extractor as flat `f64` lists with
//! four values per landmark: `x`, `y` (0.0-1.0 relative to the image),
//! `z` (depth, unused here) and `visibility` (0.0-1.0).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Values contributed by a single landmark in a raw frame.
pub const VALUES_PER_LANDMARK: usize = 4;

/// Minimum landmarks required for a frame to normalize.
pub const MIN_LANDMARKS: usize = 7;

/// Landmarks in a full-body detector layout (nose..right foot index).
pub const FULL_BODY_LANDMARKS: usize = 33;

/// Number of key points kept after normalization.
pub const KEY_POINT_COUNT: usize = 11;

/// Length of a normalized frame (11 key points x 2 coordinates).
pub const NORMALIZED_FRAME_LEN: usize = KEY_POINT_COUNT * 2;

/// A raw landmark frame: `[x0, y0, z0, v0, x1, y1, z1, v1, ...]`.
pub type RawFrame = Vec<f64>;

/// A single detected landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// Flatten into the four-value raw frame layout.
    pub fn to_values(self) -> [f64; VALUES_PER_LANDMARK] {
        [self.x, self.y, self.z, self.visibility]
    }
}

/// Build a raw frame from a list of landmarks.
pub fn raw_frame_from_landmarks(landmarks: &[Landmark]) -> RawFrame {
    landmarks.iter().flat_map(|l| l.to_values()).collect()
}

/// A 2D point in image-relative or normalized space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point shifted by the given offsets.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(self, other: Self) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// The 11 key points of a normalized frame, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KeyPoint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
}

impl KeyPoint {
    /// All key points in normalized-frame order.
    pub const ALL: [KeyPoint; KEY_POINT_COUNT] = [
        KeyPoint::Nose,
        KeyPoint::LeftShoulder,
        KeyPoint::RightShoulder,
        KeyPoint::LeftElbow,
        KeyPoint::RightElbow,
        KeyPoint::LeftWrist,
        KeyPoint::RightWrist,
        KeyPoint::LeftHip,
        KeyPoint::RightHip,
        KeyPoint::LeftKnee,
        KeyPoint::RightKnee,
    ];

    /// Position of this point in the normalized frame (x at `2i`, y at `2i + 1`).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Landmark index in the full-body detector layout.
    pub fn detector_index(self) -> usize {
        match self {
            KeyPoint::Nose => 0,
            KeyPoint::LeftShoulder => 11,
            KeyPoint::RightShoulder => 12,
            KeyPoint::LeftElbow => 13,
            KeyPoint::RightElbow => 14,
            KeyPoint::LeftWrist => 15,
            KeyPoint::RightWrist => 16,
            KeyPoint::LeftHip => 23,
            KeyPoint::RightHip => 24,
            KeyPoint::LeftKnee => 25,
            KeyPoint::RightKnee => 26,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyPoint::Nose => "nose",
            KeyPoint::LeftShoulder => "left_shoulder",
            KeyPoint::RightShoulder => "right_shoulder",
            KeyPoint::LeftElbow => "left_elbow",
            KeyPoint::RightElbow => "right_elbow",
            KeyPoint::LeftWrist => "left_wrist",
            KeyPoint::RightWrist => "right_wrist",
            KeyPoint::LeftHip => "left_hip",
            KeyPoint::RightHip => "right_hip",
            KeyPoint::LeftKnee => "left_knee",
            KeyPoint::RightKnee => "right_knee",
        }
    }
}

/// Where the hip and knee points of a normalized frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum LowerBodySource {
    /// Synthesized from shoulder positions with fixed vertical offsets.
    #[default]
    Derived,
    /// Read from true detector landmarks.
    Detected,
}

/// A pose frame translated to the shoulder midpoint and scaled by shoulder width.
///
/// Always holds exactly [`NORMALIZED_FRAME_LEN`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedFrame {
    values: Vec<f64>,
    #[serde(default)]
    lower_body: LowerBodySource,
}

impl NormalizedFrame {
    /// Build from the 11 key points in [`KeyPoint::ALL`] order.
    pub fn from_points(points: &[Point2; KEY_POINT_COUNT], lower_body: LowerBodySource) -> Self {
        let values = points.iter().flat_map(|p| [p.x, p.y]).collect();
        Self { values, lower_body }
    }

    /// Wrap an existing value vector. Returns `None` unless it has exactly 22 values.
    pub fn from_values(values: Vec<f64>, lower_body: LowerBodySource) -> Option<Self> {
        (values.len() == NORMALIZED_FRAME_LEN).then_some(Self { values, lower_body })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn lower_body(&self) -> LowerBodySource {
        self.lower_body
    }

    pub fn point(&self, key: KeyPoint) -> Point2 {
        let i = key.index() * 2;
        Point2::new(self.values[i], self.values[i + 1])
    }
}

impl AsRef<[f64]> for NormalizedFrame {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// Average landmark visibility over a set of raw frames.
///
/// Reads every fourth value starting at index 3. Returns 0.0 when no
/// visibility values are present.
pub fn average_visibility<F: AsRef<[f64]>>(frames: &[F]) -> f64 {
    let (total, count) = frames
        .iter()
        .flat_map(|frame| frame.as_ref().iter().skip(3).step_by(VALUES_PER_LANDMARK))
        .fold((0.0f64, 0usize), |(sum, n), v| (sum + *v, n + 1));

    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
