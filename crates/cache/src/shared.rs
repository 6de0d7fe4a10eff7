//! Best-effort typed wrapper over a [`KeyValueStore`].
//!
//! Contract: no [`KvError`] escapes this type. A failed read is a miss, a
//! failed write means "proceed uncached", and either case logs a warning.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::store::KeyValueStore;

/// Typed, failure-swallowing cache handle shared across the service.
#[derive(Clone)]
pub struct SharedCache {
    store: Arc<dyn KeyValueStore>,
}

impl SharedCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read and decode a JSON value. Any failure is a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cache value failed to decode, treating as miss");
                None
            }
        }
    }

    /// Encode and store a JSON value with a TTL. Returns whether the write
    /// landed; callers proceed either way.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "cache value failed to encode, skipping write");
                return false;
            }
        };
        match self.store.set_ex(key, &raw, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "cache write failed, proceeding uncached");
                false
            }
        }
    }

    /// Atomically create a marker key (set-if-not-exists). Returns `true`
    /// only when this call created the marker; a store failure counts as
    /// "not acquired" so mutual exclusion degrades safely.
    pub async fn acquire_marker(&self, key: &str, value: &str, ttl: Duration) -> bool {
        match self.store.set_nx_ex(key, value, ttl).await {
            Ok(acquired) => acquired,
            Err(e) => {
                warn!(key, error = %e, "marker acquisition failed, treating as held");
                false
            }
        }
    }

    /// Delete a key. Returns whether the delete was confirmed.
    pub async fn clear(&self, key: &str) -> bool {
        match self.store.del(key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "cache delete failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for SharedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde::Deserialize;

    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::KvError;

    /// Store that fails every operation, for degradation tests.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
            Err(KvError::Transport("connection refused".into()))
        }

        async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), KvError> {
            Err(KvError::Transport("connection refused".into()))
        }

        async fn set_nx_ex(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Duration,
        ) -> Result<bool, KvError> {
            Err(KvError::Transport("connection refused".into()))
        }

        async fn del(&self, _key: &str) -> Result<(), KvError> {
            Err(KvError::Transport("connection refused".into()))
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        n: u32,
    }

    #[tokio::test]
    async fn round_trips_typed_values() {
        let cache = SharedCache::new(Arc::new(MemoryStore::new()));
        assert!(
            cache
                .set_json("k", &Payload { n: 7 }, Duration::from_secs(60))
                .await
        );
        assert_eq!(cache.get_json::<Payload>("k").await, Some(Payload { n: 7 }));
    }

    #[tokio::test]
    async fn unreachable_store_degrades_to_miss_and_uncached() {
        let cache = SharedCache::new(Arc::new(BrokenStore));
        assert_eq!(cache.get_json::<Payload>("k").await, None);
        assert!(
            !cache
                .set_json("k", &Payload { n: 1 }, Duration::from_secs(60))
                .await
        );
        assert!(!cache.acquire_marker("lock", "x", Duration::from_secs(60)).await);
        assert!(!cache.clear("k").await);
    }

    #[tokio::test]
    async fn corrupt_value_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_ex("k", "not json at all", Duration::from_secs(60))
            .await
            .unwrap();
        let cache = SharedCache::new(store);
        assert_eq!(cache.get_json::<Payload>("k").await, None);
    }
}
