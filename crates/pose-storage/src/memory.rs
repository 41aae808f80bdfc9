//! In-process cache backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pose_models::{CacheNamespace, EntryMeta};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StorageResult;
use crate::store::{CacheStore, StoredEntry};

type NamespaceMap = HashMap<CacheNamespace, HashMap<String, StoredEntry>>;

/// Cache backend holding entries in a shared map.
///
/// Cloning shares the underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<RwLock<NamespaceMap>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get_and_touch(
        &self,
        namespace: CacheNamespace,
        key: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<StoredEntry>> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&namespace)
            .and_then(|ns| ns.get_mut(key))
            .map(|entry| {
                entry.meta.touch(now);
                entry.clone()
            });
        Ok(entry)
    }

    async fn upsert(
        &self,
        namespace: CacheNamespace,
        key: &str,
        payload: String,
        now: DateTime<Utc>,
    ) -> StorageResult<EntryMeta> {
        let mut entries = self.entries.write().await;
        let ns = entries.entry(namespace).or_default();

        let meta = match ns.get_mut(key) {
            Some(existing) => {
                existing.payload = payload;
                existing.meta.last_accessed = now;
                if namespace.counts_writes() {
                    existing.meta.access_count += 1;
                }
                existing.meta
            }
            None => {
                let meta = EntryMeta::created(namespace, now);
                ns.insert(key.to_string(), StoredEntry { payload, meta });
                meta
            }
        };
        Ok(meta)
    }

    async fn delete_idle_before(
        &self,
        namespace: CacheNamespace,
        cutoff: DateTime<Utc>,
    ) -> StorageResult<u64> {
        let mut entries = self.entries.write().await;
        let Some(ns) = entries.get_mut(&namespace) else {
            return Ok(0);
        };

        let before = ns.len();
        ns.retain(|_, entry| entry.meta.last_accessed >= cutoff);
        Ok((before - ns.len()) as u64)
    }

    async fn len(&self, namespace: CacheNamespace) -> StorageResult<u64> {
        let entries = self.entries.read().await;
        Ok(entries.get(&namespace).map_or(0, |ns| ns.len() as u64))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_upsert_then_get() {
        let store = InMemoryCacheStore::new();
        let now = Utc::now();

        let meta = store
            .upsert(CacheNamespace::PoseAnalysis, "v1", "{}".to_string(), now)
            .await
            .unwrap();
        assert_eq!(meta.access_count, 0);
        assert_eq!(meta.created_at, now);

        let later = now + Duration::minutes(5);
        let entry = store
            .get_and_touch(CacheNamespace::PoseAnalysis, "v1", later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.payload, "{}");
        assert_eq!(entry.meta.access_count, 1);
        assert_eq!(entry.meta.last_accessed, later);
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let store = InMemoryCacheStore::new();
        let hit = store
            .get_and_touch(CacheNamespace::SequenceMatch, "nope", Utc::now())
            .await
            .unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let store = InMemoryCacheStore::new();
        let first = Utc::now();
        let second = first + Duration::hours(1);

        store
            .upsert(CacheNamespace::SequenceMatch, "k", "a".to_string(), first)
            .await
            .unwrap();
        let meta = store
            .upsert(CacheNamespace::SequenceMatch, "k", "b".to_string(), second)
            .await
            .unwrap();

        assert_eq!(meta.created_at, first);
        assert_eq!(meta.last_accessed, second);
        assert_eq!(meta.access_count, 2);

        let meta = store
            .upsert(CacheNamespace::OverlayPlacement, "k", "a".to_string(), first)
            .await
            .unwrap();
        assert_eq!(meta.access_count, 0);
        let meta = store
            .upsert(CacheNamespace::OverlayPlacement, "k", "b".to_string(), second)
            .await
            .unwrap();
        assert_eq!(meta.access_count, 0);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let store = InMemoryCacheStore::new();
        let now = Utc::now();
        store
            .upsert(CacheNamespace::PoseAnalysis, "k", "x".to_string(), now)
            .await
            .unwrap();

        assert_eq!(store.len(CacheNamespace::PoseAnalysis).await.unwrap(), 1);
        assert_eq!(store.len(CacheNamespace::OverlayPlacement).await.unwrap(), 0);
        assert!(store
            .get_and_touch(CacheNamespace::OverlayPlacement, "k", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_idle_before() {
        let store = InMemoryCacheStore::new();
        let now = Utc::now();
        store
            .upsert(CacheNamespace::PoseAnalysis, "old", "x".to_string(), now - Duration::days(40))
            .await
            .unwrap();
        store
            .upsert(CacheNamespace::PoseAnalysis, "new", "y".to_string(), now)
            .await
            .unwrap();

        let removed = store
            .delete_idle_before(CacheNamespace::PoseAnalysis, now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len(CacheNamespace::PoseAnalysis).await.unwrap(), 1);

        let removed = store
            .delete_idle_before(CacheNamespace::SequenceMatch, now)
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
