//! Cache namespaces and entry metadata.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three independent cache namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CacheNamespace {
    /// Whole-video pose analysis
    PoseAnalysis,
    /// Pairwise sequence-match scores
    SequenceMatch,
    /// Overlay placement suggestions
    OverlayPlacement,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 3] = [
        CacheNamespace::PoseAnalysis,
        CacheNamespace::SequenceMatch,
        CacheNamespace::OverlayPlacement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::PoseAnalysis => "pose_analysis",
            CacheNamespace::SequenceMatch => "sequence_matches",
            CacheNamespace::OverlayPlacement => "overlay_cache",
        }
    }

    /// Default idle time before an entry is eligible for eviction.
    pub fn default_ttl(&self) -> Duration {
        match self {
            CacheNamespace::PoseAnalysis => Duration::days(30),
            CacheNamespace::SequenceMatch => Duration::days(7),
            CacheNamespace::OverlayPlacement => Duration::days(14),
        }
    }

    /// Access count given to a freshly inserted entry.
    ///
    /// Match entries count their first write as an access.
    pub fn initial_access_count(&self) -> u64 {
        match self {
            CacheNamespace::SequenceMatch => 1,
            _ => 0,
        }
    }

    /// Whether overwriting an existing entry counts as an access.
    pub fn counts_writes(&self) -> bool {
        matches!(self, CacheNamespace::SequenceMatch)
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bookkeeping stored alongside every cache payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntryMeta {
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u64,
}

impl EntryMeta {
    /// Metadata for an entry created at `now`.
    pub fn created(namespace: CacheNamespace, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            last_accessed: now,
            access_count: namespace.initial_access_count(),
        }
    }

    /// Record a cache hit.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
        self.access_count += 1;
    }

    /// Whether the entry has been idle longer than `ttl` at `now`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.last_accessed < now - ttl
    }
}

/// A typed cache payload with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Cached<T> {
    pub value: T,
    pub meta: EntryMeta,
}

/// Entries removed per namespace by one cleanup sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CleanupStats {
    pub pose_analysis: u64,
    pub sequence_matches: u64,
    pub overlay_cache: u64,
}

impl CleanupStats {
    pub fn record(&mut self, namespace: CacheNamespace, removed: u64) {
        match namespace {
            CacheNamespace::PoseAnalysis => self.pose_analysis += removed,
            CacheNamespace::SequenceMatch => self.sequence_matches += removed,
            CacheNamespace::OverlayPlacement => self.overlay_cache += removed,
        }
    }

    pub fn total(&self) -> u64 {
        self.pose_analysis + self.sequence_matches + self.overlay_cache
    }
}
