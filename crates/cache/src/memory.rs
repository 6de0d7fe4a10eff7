//! In-process [`KeyValueStore`] used by tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::store::{KeyValueStore, KvError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// HashMap-backed store with real TTL expiry.
///
/// Uses `tokio::time::Instant` so paused-clock tests can advance time past
/// a TTL deterministically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries (test helper).
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries.values().filter(|e| e.live()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.live() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, KvError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.get(key).is_some_and(|e| e.live()) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(true)
    }

    async fn del(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_their_ttl() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "\"v\"", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("\"v\"".to_string()));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn set_nx_respects_live_entries_but_not_expired_ones() {
        let store = MemoryStore::new();
        assert!(
            store
                .set_nx_ex("lock", "a", Duration::from_secs(10))
                .await
                .unwrap()
        );
        assert!(
            !store
                .set_nx_ex("lock", "b", Duration::from_secs(10))
                .await
                .unwrap()
        );

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(
            store
                .set_nx_ex("lock", "c", Duration::from_secs(10))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn del_removes_a_key() {
        let store = MemoryStore::new();
        store
            .set_ex("k", "1", Duration::from_secs(60))
            .await
            .unwrap();
        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
