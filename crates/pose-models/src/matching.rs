//! Cached sequence-match records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Version of the matching algorithm.
/// Increment this when similarity scoring changes to invalidate cached matches.
pub const MATCH_ALGORITHM_VERSION: u32 = 1;

/// Coarse confidence label attached to a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    High,
    #[default]
    Medium,
    Low,
}

impl MatchConfidence {
    /// `High` above 0.8, `Medium` above 0.5, otherwise `Low`.
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            MatchConfidence::High
        } else if score > 0.5 {
            MatchConfidence::Medium
        } else {
            MatchConfidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchConfidence::High => "high",
            MatchConfidence::Medium => "medium",
            MatchConfidence::Low => "low",
        }
    }
}

/// Cached similarity between two raw pose sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SequenceMatch {
    /// Hash of the sequence passed first when the score was stored
    pub sequence_a_hash: String,
    /// Hash of the sequence passed second when the score was stored
    pub sequence_b_hash: String,
    pub similarity_score: f64,
    pub match_confidence: MatchConfidence,
    pub algorithm_version: u32,
    pub computation_time_ms: u64,
}

impl SequenceMatch {
    pub fn new(
        sequence_a_hash: impl Into<String>,
        sequence_b_hash: impl Into<String>,
        similarity_score: f64,
        computation_time_ms: u64,
    ) -> Self {
        Self {
            sequence_a_hash: sequence_a_hash.into(),
            sequence_b_hash: sequence_b_hash.into(),
            similarity_score,
            match_confidence: MatchConfidence::from_score(similarity_score),
            algorithm_version: MATCH_ALGORITHM_VERSION,
            computation_time_ms,
        }
    }

    pub fn is_current_version(&self) -> bool {
        self.algorithm_version == MATCH_ALGORITHM_VERSION
    }
}
