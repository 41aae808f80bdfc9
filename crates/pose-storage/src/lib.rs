//! Content-addressed TTL cache for pose analysis results.
//!
//! - [`hash`]: deterministic sequence hashing
//! - [`store`]: backend contract, with [`memory`] and [`redis_store`] backends
//! - [`manager`]: typed get/put for the three namespaces and the TTL sweep

pub mod config;
pub mod error;
pub mod hash;
pub mod manager;
pub mod memory;
pub mod metrics;
pub mod redis_store;
pub mod store;

pub use config::{CacheBackend, CacheConfig};
pub use error::{StorageError, StorageResult};
pub use hash::generate_sequence_hash;
pub use manager::{overlay_key, sequence_match_key, video_analysis_key, PoseCacheManager};
pub use memory::InMemoryCacheStore;
pub use redis_store::{RedisCacheStore, DEFAULT_KEY_PREFIX};
pub use store::{CacheStore, StoredEntry};
