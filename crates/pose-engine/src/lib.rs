//! Pose engine.
//!
//! Assembles the normalizer and matcher, the pose cache and the analysis
//! queue into a single [`PoseEngine`], configured from the environment
//! with [`EngineConfig::from_env`].

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;

pub use config::EngineConfig;
pub use engine::PoseEngine;
pub use error::{EngineError, EngineResult};
pub use logging::init_tracing;

pub use pose_models as models;
pub use pose_queue as queue;
pub use pose_storage as storage;
pub use pose_vision as vision;
