//! End-to-end checks of the engine facade.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pose_engine::models::{
    raw_frame_from_landmarks, CacheNamespace, JobId, JobPriority, JobStatus, Landmark,
    MovementAnalysis, OverlayDimensions, RawFrame, VideoId,
};
use pose_engine::queue::{JobEvent, JobRecord, ProgressCallback, QueueConfig, QueueError};
use pose_engine::storage::{CacheBackend, CacheConfig, PoseCacheManager};
use pose_engine::vision::{LandmarkLayout, SyntheticExtractor, SyntheticSampler};
use pose_engine::{EngineConfig, EngineError, PoseEngine};

fn engine_with(config: EngineConfig) -> PoseEngine {
    PoseEngine::with_cache(
        config,
        PoseCacheManager::in_memory(),
        Arc::new(SyntheticSampler::default()),
        Arc::new(SyntheticExtractor::default()),
    )
}

fn engine() -> PoseEngine {
    engine_with(EngineConfig::default())
}

/// Seven-landmark pose scaled by `k` about the origin and shifted by `(dx, dy)`.
fn pose(k: f64, dx: f64, dy: f64, lift: f64) -> RawFrame {
    let points = [
        (0.5, 0.2),
        (0.4, 0.35),
        (0.6, 0.35),
        (0.35, 0.5 - lift / 2.0),
        (0.65, 0.5),
        (0.3, 0.65 - lift),
        (0.7, 0.65),
    ];
    let landmarks: Vec<Landmark> = points
        .iter()
        .map(|(x, y)| Landmark::new(x * k + dx, y * k + dy, 0.0, 0.9))
        .collect();
    raw_frame_from_landmarks(&landmarks)
}

fn wave(len: usize) -> Vec<RawFrame> {
    (0..len).map(|i| pose(1.0, 0.0, 0.0, 0.05 * i as f64)).collect()
}

async fn wait_for_terminal(engine: &PoseEngine, job_id: &JobId) -> JobRecord {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Some(record) = engine.get_job_status(job_id) {
                if record.status.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("job did not finish in time")
}

#[test]
fn test_standing_frame_is_centered() {
    let engine = engine();
    let standing = raw_frame_from_landmarks(&[
        Landmark::new(0.5, 0.1, 0.0, 0.9),
        Landmark::new(0.4, 0.3, 0.0, 0.9),
        Landmark::new(0.6, 0.3, 0.0, 0.9),
        Landmark::new(0.35, 0.5, 0.0, 0.9),
        Landmark::new(0.65, 0.5, 0.0, 0.9),
        Landmark::new(0.3, 0.7, 0.0, 0.9),
        Landmark::new(0.7, 0.7, 0.0, 0.9),
    ]);

    let normalized = engine.normalize_sequence(&[standing]);
    assert_eq!(normalized.len(), 1);
    let values = normalized[0].values();
    assert_eq!(values.len(), 22);
    assert!((values[2] + values[4]).abs() < 0.1);
}

#[test]
fn test_malformed_frames_are_dropped() {
    let engine = engine();
    let frames = vec![vec![0.1, 0.2, 0.0, 0.9], pose(1.0, 0.0, 0.0, 0.0), Vec::new()];
    assert_eq!(engine.normalize_sequence(&frames).len(), 1);
}

#[test]
fn test_match_is_scale_and_translation_invariant() {
    let engine = engine();
    let reference = vec![pose(1.0, 0.0, 0.0, 0.1)];

    for k in [0.5, 1.1, 1.5, 2.0] {
        let scaled = vec![pose(k, 0.0, 0.0, 0.1)];
        let score = engine.match_sequence(&scaled, &reference);
        assert!(score > 0.9, "scale {} scored {}", k, score);
    }

    let shifted = vec![pose(1.0, 0.25, -0.1, 0.1)];
    assert!(engine.match_sequence(&shifted, &reference) > 0.99);
}

#[test]
fn test_match_guards() {
    let engine = engine();
    let long = wave(5);
    let short = wave(2);
    let empty: Vec<RawFrame> = Vec::new();

    assert!(engine.match_sequence(&long, &short) > 0.5);
    assert!(engine.match_sequence(&long, &long) > 0.9);
    assert_eq!(engine.match_sequence(&short, &long), 0.0);
    assert_eq!(engine.match_sequence(&empty, &short), 0.0);
    assert_eq!(engine.match_sequence(&long, &empty), 0.0);
}

#[test]
fn test_auto_layout_is_configurable() {
    let engine = engine_with(EngineConfig::default().with_layout(LandmarkLayout::Auto));
    assert_eq!(engine.layout(), LandmarkLayout::Auto);
    // Seven-landmark frames still normalize under the auto layout.
    assert_eq!(engine.normalize_sequence(&wave(3)).len(), 3);
}

#[test]
fn test_cached_match_is_deterministic() {
    let engine = engine();
    let long = wave(4);
    let short = wave(2);

    let first = tokio_test::block_on(engine.match_sequence_cached(&long, &short));
    let second = tokio_test::block_on(engine.match_sequence_cached(&long, &short));
    assert_eq!(first, second);
    assert!(first > 0.5);
}

#[tokio::test]
async fn test_cached_match_is_stored_and_symmetric() {
    let engine = engine();
    let long = wave(6);
    let short = wave(3);

    assert!(engine.get_cached_sequence_match(&long, &short).await.is_none());
    let score = engine.match_sequence_cached(&long, &short).await;
    assert_eq!(score, engine.match_sequence(&long, &short));

    let record = engine.get_cached_sequence_match(&short, &long).await.unwrap();
    assert_eq!(record.similarity_score, score);
    assert_eq!(engine.match_sequence_cached(&short, &long).await, score);
}

#[tokio::test]
async fn test_cache_round_trip_and_sweep() {
    let engine = engine();
    let video_id = VideoId::from("clip-1");
    let frames = wave(4);
    let normalized = engine.normalize_sequence(&frames);

    assert!(engine.get_cached_video_analysis(&video_id).await.is_none());
    assert!(
        engine
            .put_cached_video_analysis(&video_id, frames.clone(), normalized, MovementAnalysis::none(), 12)
            .await
    );
    let cached = engine.get_cached_video_analysis(&video_id).await.unwrap();
    assert_eq!(cached.pose_sequences, frames);
    assert_eq!(cached.processing_time_ms, 12);

    // Nothing has idled long enough to be swept yet.
    assert_eq!(engine.cleanup_expired().await.total(), 0);

    let later = chrono::Utc::now() + chrono::Duration::days(31);
    let stats = engine.cache().cleanup_expired_at(later).await;
    assert_eq!(stats.pose_analysis, 1);
    assert!(engine.get_cached_video_analysis(&video_id).await.is_none());
    assert_eq!(engine.cache().entry_count(CacheNamespace::PoseAnalysis).await, Some(0));
}

#[tokio::test]
async fn test_analysis_job_then_overlay_placement() {
    let engine = engine();
    let events = Arc::new(Mutex::new(Vec::<JobEvent>::new()));
    let sink = Arc::clone(&events);
    let callback: ProgressCallback =
        Arc::new(move |event: JobEvent| sink.lock().unwrap().push(event));

    engine.start().unwrap();
    let video_id = VideoId::from("clip-2");
    let job_id = engine
        .enqueue_analysis_job(video_id.clone(), "/videos/clip-2.mp4", JobPriority::Urgent, Some(10), Some(callback))
        .unwrap();
    let record = wait_for_terminal(&engine, &job_id).await;
    engine.stop().await.unwrap();

    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.max_frames, 10);
    let result = engine.get_job_result(&job_id).unwrap();
    assert_eq!(result.frame_count, 10);
    assert_eq!(engine.get_cached_video_analysis(&video_id).await, Some(result));

    let progress: Vec<f64> = events.lock().unwrap().iter().map(|e| e.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last().copied(), Some(1.0));

    let dims = OverlayDimensions::new(200, 100);
    assert!(engine
        .get_cached_overlay_placement(&video_id, "logo", 200, 100)
        .await
        .is_none());
    let placement = engine
        .overlay_placement(&video_id, "logo", dims, 1920, 1080)
        .await
        .unwrap();
    assert_eq!(placement.overlay_dimensions, "200x100");
    assert!(!placement.zones.avoid_areas.is_empty());

    let cached = engine
        .get_cached_overlay_placement(&video_id, "logo", 200, 100)
        .await;
    assert_eq!(cached, Some(placement));
}

#[tokio::test]
async fn test_overlay_placement_needs_analysis() {
    let engine = engine();
    let placement = engine
        .overlay_placement(&VideoId::from("unknown"), "logo", OverlayDimensions::new(10, 10), 640, 360)
        .await;
    assert!(placement.is_none());
}

#[tokio::test]
async fn test_queue_errors_surface_through_engine() {
    let config = EngineConfig {
        queue: QueueConfig::default().with_max_queue_size(1),
        ..EngineConfig::default()
    };
    let engine = engine_with(config);

    let first = engine
        .enqueue_analysis_job("a", "/a.mp4", JobPriority::Normal, None, None)
        .unwrap();
    let err = engine
        .enqueue_analysis_job("b", "/b.mp4", JobPriority::High, None, None)
        .unwrap_err();
    assert!(matches!(err, EngineError::Queue(QueueError::QueueFull { capacity: 1 })));

    assert!(engine.cancel_job(&first));
    let stats = engine.get_queue_stats();
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.jobs_cancelled, 1);
    assert!(!stats.is_running);

    assert!(matches!(
        engine.stop().await,
        Err(EngineError::Queue(QueueError::NotRunning))
    ));
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_engine_with_redis_backend() {
    let config = EngineConfig {
        cache: CacheConfig {
            backend: CacheBackend::Redis,
            key_prefix: format!("posetest-{}", std::process::id()),
            ..CacheConfig::from_env()
        },
        ..EngineConfig::default()
    };
    let engine = PoseEngine::new(
        config,
        Arc::new(SyntheticSampler::default()),
        Arc::new(SyntheticExtractor::default()),
    )
    .unwrap();

    let long = wave(5);
    let short = wave(2);
    let score = engine.match_sequence_cached(&long, &short).await;
    let record = engine.get_cached_sequence_match(&short, &long).await.unwrap();
    assert_eq!(record.similarity_score, score);
}
