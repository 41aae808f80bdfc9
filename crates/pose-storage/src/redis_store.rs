//! Redis cache backend.
//!
//! Each entry is a hash at `{<prefix>:<namespace>}:<key>` with the fields
//! `payload`, `created_at`, `last_accessed` (epoch milliseconds) and
//! `access_count`. A sorted set at `{<prefix>:<namespace>}:idx` scores every
//! key by `last_accessed` so the sweep can find idle entries without a
//! keyspace scan. All mutations run as Lua scripts and are atomic.
//!
//! The braces are a cluster hash tag: every key of a namespace lands in one
//! slot, and scripts only touch keys passed in `KEYS`, so the store also
//! works against Redis Cluster.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pose_models::{CacheNamespace, EntryMeta};
use redis::aio::MultiplexedConnection;
use redis::Script;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::store::{CacheStore, StoredEntry};

/// Default key prefix for cache entries.
pub const DEFAULT_KEY_PREFIX: &str = "posecache";

const UPSERT_SCRIPT: &str = r#"
local created = redis.call('HGET', KEYS[1], 'created_at')
local count
if created then
    created = tonumber(created)
    count = tonumber(redis.call('HGET', KEYS[1], 'access_count') or '0') + tonumber(ARGV[4])
else
    created = tonumber(ARGV[2])
    count = tonumber(ARGV[3])
end
redis.call('HSET', KEYS[1], 'payload', ARGV[1], 'created_at', created,
    'last_accessed', ARGV[2], 'access_count', count)
redis.call('ZADD', KEYS[2], ARGV[2], ARGV[5])
return {created, count}
"#;

const TOUCH_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return false
end
redis.call('HSET', KEYS[1], 'last_accessed', ARGV[1])
local count = redis.call('HINCRBY', KEYS[1], 'access_count', 1)
redis.call('ZADD', KEYS[2], ARGV[1], ARGV[2])
local fields = redis.call('HMGET', KEYS[1], 'payload', 'created_at')
return {fields[1], tonumber(fields[2]), count}
"#;

// KEYS[i] is the entry for index member ARGV[i] (i >= 2). Members touched
// since the candidate scan are skipped.
const SWEEP_SCRIPT: &str = r#"
local removed = 0
for i = 2, #KEYS do
    local score = redis.call('ZSCORE', KEYS[1], ARGV[i])
    if score and tonumber(score) < tonumber(ARGV[1]) then
        redis.call('DEL', KEYS[i])
        redis.call('ZREM', KEYS[1], ARGV[i])
        removed = removed + 1
    end
end
return removed
"#;

/// Idle entries removed per sweep script call.
const SWEEP_BATCH: usize = 256;

/// Cache backend on Redis (or a protocol-compatible server).
pub struct RedisCacheStore {
    client: redis::Client,
    key_prefix: String,
    conn: OnceCell<MultiplexedConnection>,
}

impl RedisCacheStore {
    /// Create a store for `redis_url`. The connection is opened lazily.
    pub fn new(redis_url: &str, key_prefix: impl Into<String>) -> StorageResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let key_prefix = key_prefix.into();
        info!(key_prefix = %key_prefix, "Configured Redis cache store");
        Ok(Self {
            client,
            key_prefix,
            conn: OnceCell::new(),
        })
    }

    async fn connection(&self) -> StorageResult<MultiplexedConnection> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                self.client
                    .get_multiplexed_async_connection()
                    .await
                    .map_err(|e| StorageError::connection(format!("Redis connection failed: {}", e)))
            })
            .await?;
        Ok(conn.clone())
    }

    fn hash_tag(&self, namespace: CacheNamespace) -> String {
        format!("{{{}:{}}}", self.key_prefix, namespace.as_str())
    }

    fn entry_key(&self, namespace: CacheNamespace, key: &str) -> String {
        format!("{}:{}", self.hash_tag(namespace), key)
    }

    fn index_key(&self, namespace: CacheNamespace) -> String {
        format!("{}:idx", self.hash_tag(namespace))
    }
}

fn from_millis(ms: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StorageError::backend(format!("invalid timestamp: {}", ms)))
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get_and_touch(
        &self,
        namespace: CacheNamespace,
        key: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<StoredEntry>> {
        let mut conn = self.connection().await?;

        let result: Option<(String, i64, u64)> = Script::new(TOUCH_SCRIPT)
            .key(self.entry_key(namespace, key))
            .key(self.index_key(namespace))
            .arg(now.timestamp_millis())
            .arg(key)
            .invoke_async(&mut conn)
            .await?;

        result
            .map(|(payload, created_ms, access_count)| {
                Ok(StoredEntry {
                    payload,
                    meta: EntryMeta {
                        created_at: from_millis(created_ms)?,
                        last_accessed: now,
                        access_count,
                    },
                })
            })
            .transpose()
    }

    async fn upsert(
        &self,
        namespace: CacheNamespace,
        key: &str,
        payload: String,
        now: DateTime<Utc>,
    ) -> StorageResult<EntryMeta> {
        let mut conn = self.connection().await?;
        let write_increment = u64::from(namespace.counts_writes());

        let (created_ms, access_count): (i64, u64) = Script::new(UPSERT_SCRIPT)
            .key(self.entry_key(namespace, key))
            .key(self.index_key(namespace))
            .arg(payload)
            .arg(now.timestamp_millis())
            .arg(namespace.initial_access_count())
            .arg(write_increment)
            .arg(key)
            .invoke_async(&mut conn)
            .await?;

        Ok(EntryMeta {
            created_at: from_millis(created_ms)?,
            last_accessed: now,
            access_count,
        })
    }

    async fn delete_idle_before(
        &self,
        namespace: CacheNamespace,
        cutoff: DateTime<Utc>,
    ) -> StorageResult<u64> {
        let mut conn = self.connection().await?;
        let index_key = self.index_key(namespace);
        let cutoff_ms = cutoff.timestamp_millis();

        let idle: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(&index_key)
            .arg("-inf")
            .arg(format!("({}", cutoff_ms))
            .query_async(&mut conn)
            .await?;

        let script = Script::new(SWEEP_SCRIPT);
        let mut removed = 0u64;
        for batch in idle.chunks(SWEEP_BATCH) {
            let mut invocation = script.prepare_invoke();
            invocation.key(&index_key).arg(cutoff_ms);
            for member in batch {
                invocation.key(self.entry_key(namespace, member)).arg(member);
            }
            let count: u64 = invocation.invoke_async(&mut conn).await?;
            removed += count;
        }

        debug!(namespace = %namespace, removed, "Redis sweep finished");
        Ok(removed)
    }

    async fn len(&self, namespace: CacheNamespace) -> StorageResult<u64> {
        let mut conn = self.connection().await?;
        let count: u64 = redis::cmd("ZCARD")
            .arg(self.index_key(namespace))
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_store() -> RedisCacheStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let prefix = format!("posecache-test-{}", unique_suffix());
        RedisCacheStore::new(&url, prefix).unwrap()
    }

    fn unique_suffix() -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default()
    }

    #[test]
    fn test_key_layout() {
        let store = RedisCacheStore::new("redis://127.0.0.1:6379", "pc").unwrap();
        assert_eq!(
            store.entry_key(CacheNamespace::SequenceMatch, "a:b:v1"),
            "{pc:sequence_matches}:a:b:v1"
        );
        assert_eq!(store.index_key(CacheNamespace::OverlayPlacement), "{pc:overlay_cache}:idx");
    }

    #[test]
    fn test_namespace_keys_share_a_hash_tag() {
        fn tag(key: &str) -> &str {
            let start = key.find('{').map(|i| i + 1).unwrap_or(0);
            let end = key[start..].find('}').map(|i| start + i).unwrap_or(key.len());
            &key[start..end]
        }

        let store = RedisCacheStore::new("redis://127.0.0.1:6379", "pc").unwrap();
        for namespace in CacheNamespace::ALL {
            let index = store.index_key(namespace);
            assert_eq!(tag(&index), format!("pc:{}", namespace.as_str()));
            assert_eq!(tag(&store.entry_key(namespace, "x:y:v1")), tag(&index));
        }
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(RedisCacheStore::new("not a url", DEFAULT_KEY_PREFIX).is_err());
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_round_trip_and_sweep() {
        let store = test_store();
        // Redis keeps millisecond precision.
        let now = from_millis(Utc::now().timestamp_millis()).unwrap();

        let meta = store
            .upsert(CacheNamespace::SequenceMatch, "k", "a".to_string(), now)
            .await
            .unwrap();
        assert_eq!(meta.access_count, 1);

        let later = now + Duration::hours(1);
        let meta = store
            .upsert(CacheNamespace::SequenceMatch, "k", "b".to_string(), later)
            .await
            .unwrap();
        assert_eq!(meta.created_at, now);
        assert_eq!(meta.access_count, 2);

        let entry = store
            .get_and_touch(CacheNamespace::SequenceMatch, "k", later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.payload, "b");
        assert_eq!(entry.meta.access_count, 3);

        let removed = store
            .delete_idle_before(CacheNamespace::SequenceMatch, later + Duration::days(8))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store
            .get_and_touch(CacheNamespace::SequenceMatch, "k", later)
            .await
            .unwrap()
            .is_none());
    }
}
