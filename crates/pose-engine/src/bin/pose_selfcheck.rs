use std::sync::Arc;
use std::time::Duration;

use pose_engine::models::{JobPriority, JobStatus, OverlayDimensions, VideoId};
use pose_engine::vision::{SyntheticExtractor, SyntheticSampler};
use pose_engine::{init_tracing, EngineConfig, PoseEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = EngineConfig::from_env();
    println!(
        "pose-selfcheck: starting with cache={} layout={} workers={}",
        config.cache.backend.as_str(),
        config.layout.as_str(),
        config.queue.max_workers
    );

    let extractor = SyntheticExtractor::default();
    let engine = PoseEngine::new(
        config,
        Arc::new(SyntheticSampler::default()),
        Arc::new(extractor.clone()),
    )?;

    check_matching(&engine, &extractor).await?;
    check_queue(&engine).await?;

    println!("pose-selfcheck: ok");
    Ok(())
}

async fn check_matching(engine: &PoseEngine, extractor: &SyntheticExtractor) -> anyhow::Result<()> {
    let long: Vec<Vec<f64>> = (0..10).map(|i| extractor.pose_at(i as f64 * 0.1)).collect();
    let short = long[3..6].to_vec();

    if engine.normalize_sequence(&long).len() != long.len() {
        anyhow::bail!("normalization dropped well-formed frames");
    }

    let score = engine.match_sequence(&long, &short);
    if score <= 0.9 {
        anyhow::bail!("sub-sequence similarity too low: {:.3}", score);
    }

    let cached = engine.match_sequence_cached(&long, &short).await;
    if (cached - score).abs() > 1e-12 {
        anyhow::bail!("cached score {:.6} differs from {:.6}", cached, score);
    }
    println!("pose-selfcheck: matching ok (score={:.3})", score);
    Ok(())
}

async fn check_queue(engine: &PoseEngine) -> anyhow::Result<()> {
    engine.start()?;
    let video_id = VideoId::from("selfcheck");
    let job_id = engine.enqueue_analysis_job(
        video_id.clone(),
        "selfcheck.mp4",
        JobPriority::High,
        Some(12),
        None,
    )?;

    let record = tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            if let Some(record) = engine.get_job_status(&job_id) {
                if record.status.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("analysis job did not finish"))?;
    engine.stop().await?;

    if record.status != JobStatus::Completed {
        anyhow::bail!(
            "analysis job ended {}: {}",
            record.status,
            record.error.unwrap_or_default()
        );
    }

    let placement = engine
        .overlay_placement(&video_id, "caption", OverlayDimensions::new(320, 80), 1920, 1080)
        .await
        .ok_or_else(|| anyhow::anyhow!("no analysis cached for {}", video_id))?;
    println!(
        "pose-selfcheck: queue ok ({} safe areas, confidence={:.2})",
        placement.zones.safe_areas.len(),
        placement.confidence_score
    );
    Ok(())
}
