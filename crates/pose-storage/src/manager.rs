//! Pose cache manager.
//!
//! Memoizes three kinds of results keyed by content and version:
//!
//! | Namespace          | Key                                        |
//! |--------------------|--------------------------------------------|
//! | `pose_analysis`    | video id + analysis version                |
//! | `sequence_matches` | unordered pair of sequence hashes + version|
//! | `overlay_cache`    | video id + overlay type + `WxH` + version  |
//!
//! The cache is never required for correctness. Backend failures are
//! logged and reported as a miss on reads and as a skipped write on puts.

use chrono::{DateTime, Utc};
use pose_models::{
    CacheNamespace, CleanupStats, MovementAnalysis, NormalizedFrame, OverlayDimensions,
    OverlayPlacement, RawFrame, SequenceMatch, VideoId, VideoPoseAnalysis, MATCH_ALGORITHM_VERSION,
    OVERLAY_CACHE_VERSION, POSE_ANALYSIS_VERSION,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{CacheBackend, CacheConfig};
use crate::error::StorageResult;
use crate::hash::generate_sequence_hash;
use crate::memory::InMemoryCacheStore;
use crate::metrics;
use crate::redis_store::RedisCacheStore;
use crate::store::CacheStore;

/// Key for a video's pose analysis.
pub fn video_analysis_key(video_id: &VideoId) -> String {
    format!("{}:v{}", video_id, POSE_ANALYSIS_VERSION)
}

/// Key for a sequence match. Symmetric in its two hashes.
pub fn sequence_match_key(hash_a: &str, hash_b: &str) -> String {
    let (first, second) = if hash_a <= hash_b {
        (hash_a, hash_b)
    } else {
        (hash_b, hash_a)
    };
    format!("{}:{}:v{}", first, second, MATCH_ALGORITHM_VERSION)
}

/// Key for an overlay placement.
pub fn overlay_key(video_id: &VideoId, overlay_type: &str, dimensions: OverlayDimensions) -> String {
    overlay_key_for(video_id, overlay_type, &dimensions.to_string())
}

fn overlay_key_for(video_id: &VideoId, overlay_type: &str, dimensions: &str) -> String {
    format!(
        "{}:{}:{}:v{}",
        video_id, overlay_type, dimensions, OVERLAY_CACHE_VERSION
    )
}

/// Typed front end over a [`CacheStore`].
#[derive(Clone)]
pub struct PoseCacheManager {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl PoseCacheManager {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// In-memory cache with default TTLs.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCacheStore::new()), CacheConfig::default())
    }

    /// Build the backend named by the config.
    pub fn from_config(config: CacheConfig) -> StorageResult<Self> {
        let store: Arc<dyn CacheStore> = match config.backend {
            CacheBackend::Memory => Arc::new(InMemoryCacheStore::new()),
            CacheBackend::Redis => Arc::new(RedisCacheStore::new(
                &config.redis_url,
                config.key_prefix.clone(),
            )?),
        };
        info!(backend = store.name(), "Pose cache initialised");
        Ok(Self::new(store, config))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    // ------------------------------------------------------------------
    // Video pose analysis
    // ------------------------------------------------------------------

    pub async fn get_cached_video_analysis(&self, video_id: &VideoId) -> Option<VideoPoseAnalysis> {
        let key = video_analysis_key(video_id);
        let analysis: VideoPoseAnalysis =
            self.get_typed(CacheNamespace::PoseAnalysis, &key, Utc::now()).await?;
        analysis.is_current_version().then_some(analysis)
    }

    /// Store a video's analysis. Returns `false` if the write was skipped.
    pub async fn put_cached_video_analysis(
        &self,
        video_id: &VideoId,
        pose_sequences: Vec<RawFrame>,
        normalized_poses: Vec<NormalizedFrame>,
        movement_analysis: MovementAnalysis,
        processing_time_ms: u64,
    ) -> bool {
        let analysis = VideoPoseAnalysis::new(
            video_id.clone(),
            pose_sequences,
            normalized_poses,
            movement_analysis,
            processing_time_ms,
        );
        self.put_video_analysis(&analysis).await
    }

    /// Store a prepared analysis record.
    pub async fn put_video_analysis(&self, analysis: &VideoPoseAnalysis) -> bool {
        let key = video_analysis_key(&analysis.video_id);
        self.put_typed(CacheNamespace::PoseAnalysis, &key, analysis, Utc::now())
            .await
    }

    // ------------------------------------------------------------------
    // Sequence matches
    // ------------------------------------------------------------------

    /// Look up a match score. Argument order does not matter.
    pub async fn get_cached_sequence_match<F: AsRef<[f64]>>(
        &self,
        sequence_a: &[F],
        sequence_b: &[F],
    ) -> Option<SequenceMatch> {
        let hash_a = generate_sequence_hash(sequence_a);
        let hash_b = generate_sequence_hash(sequence_b);
        self.get_cached_match_by_hash(&hash_a, &hash_b).await
    }

    pub async fn get_cached_match_by_hash(&self, hash_a: &str, hash_b: &str) -> Option<SequenceMatch> {
        let key = sequence_match_key(hash_a, hash_b);
        let record: SequenceMatch =
            self.get_typed(CacheNamespace::SequenceMatch, &key, Utc::now()).await?;
        record.is_current_version().then_some(record)
    }

    /// Store a match score. Returns `false` if the write was skipped.
    pub async fn put_cached_sequence_match<F: AsRef<[f64]>>(
        &self,
        sequence_a: &[F],
        sequence_b: &[F],
        similarity_score: f64,
        computation_time_ms: u64,
    ) -> bool {
        let record = SequenceMatch::new(
            generate_sequence_hash(sequence_a),
            generate_sequence_hash(sequence_b),
            similarity_score,
            computation_time_ms,
        );
        self.put_sequence_match(&record).await
    }

    pub async fn put_sequence_match(&self, record: &SequenceMatch) -> bool {
        let key = sequence_match_key(&record.sequence_a_hash, &record.sequence_b_hash);
        self.put_typed(CacheNamespace::SequenceMatch, &key, record, Utc::now())
            .await
    }

    // ------------------------------------------------------------------
    // Overlay placement
    // ------------------------------------------------------------------

    pub async fn get_cached_overlay_placement(
        &self,
        video_id: &VideoId,
        overlay_type: &str,
        width: u32,
        height: u32,
    ) -> Option<OverlayPlacement> {
        let key = overlay_key(video_id, overlay_type, OverlayDimensions::new(width, height));
        let placement: OverlayPlacement = self
            .get_typed(CacheNamespace::OverlayPlacement, &key, Utc::now())
            .await?;
        placement.is_current_version().then_some(placement)
    }

    /// Store a placement under its video, type and dimensions.
    pub async fn put_cached_overlay_placement(&self, placement: &OverlayPlacement) -> bool {
        let key = overlay_key_for(
            &placement.video_id,
            &placement.overlay_type,
            &placement.overlay_dimensions,
        );
        self.put_typed(CacheNamespace::OverlayPlacement, &key, placement, Utc::now())
            .await
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Sweep every namespace for entries idle beyond their TTL.
    pub async fn cleanup_expired(&self) -> CleanupStats {
        self.cleanup_expired_at(Utc::now()).await
    }

    /// Sweep as if the current time were `now`.
    ///
    /// A namespace whose sweep fails counts zero removals; the others
    /// still run.
    pub async fn cleanup_expired_at(&self, now: DateTime<Utc>) -> CleanupStats {
        let mut stats = CleanupStats::default();

        for namespace in CacheNamespace::ALL {
            let cutoff = now - self.config.ttl(namespace);
            match self.store.delete_idle_before(namespace, cutoff).await {
                Ok(removed) => {
                    metrics::record_evictions(namespace, removed);
                    stats.record(namespace, removed);
                }
                Err(e) => {
                    metrics::record_error(namespace, "cleanup");
                    warn!(namespace = %namespace, error = %e, "Cache sweep failed");
                }
            }
        }

        info!(
            pose_analysis = stats.pose_analysis,
            sequence_matches = stats.sequence_matches,
            overlay_cache = stats.overlay_cache,
            "Cache cleanup complete"
        );
        stats
    }

    /// Entries currently held in a namespace, or `None` if the backend is unavailable.
    pub async fn entry_count(&self, namespace: CacheNamespace) -> Option<u64> {
        self.store.len(namespace).await.ok()
    }

    async fn get_typed<T: DeserializeOwned>(
        &self,
        namespace: CacheNamespace,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let entry = match self.store.get_and_touch(namespace, key, now).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                metrics::record_miss(namespace);
                debug!(namespace = %namespace, key = %key, "Cache MISS");
                return None;
            }
            Err(e) => {
                metrics::record_error(namespace, "get");
                warn!(namespace = %namespace, key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&entry.payload) {
            Ok(value) => {
                metrics::record_hit(namespace);
                debug!(
                    namespace = %namespace,
                    key = %key,
                    access_count = entry.meta.access_count,
                    "Cache HIT"
                );
                Some(value)
            }
            Err(e) => {
                metrics::record_error(namespace, "decode");
                warn!(namespace = %namespace, key = %key, error = %e, "Corrupt cache payload, treating as miss");
                None
            }
        }
    }

    async fn put_typed<T: Serialize>(
        &self,
        namespace: CacheNamespace,
        key: &str,
        value: &T,
        now: DateTime<Utc>,
    ) -> bool {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                metrics::record_error(namespace, "encode");
                warn!(namespace = %namespace, key = %key, error = %e, "Failed to encode cache payload");
                return false;
            }
        };

        match self.store.upsert(namespace, key, payload, now).await {
            Ok(meta) => {
                metrics::record_write(namespace);
                debug!(
                    namespace = %namespace,
                    key = %key,
                    access_count = meta.access_count,
                    "Cache stored"
                );
                true
            }
            Err(e) => {
                metrics::record_error(namespace, "put");
                warn!(namespace = %namespace, key = %key, error = %e, "Cache write failed, skipping");
                false
            }
        }
    }
}
