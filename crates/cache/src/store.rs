//! Key-value store trait and error type.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a key-value store backend.
///
/// These never cross the [`crate::SharedCache`] boundary; they exist so the
/// wrapper has something concrete to log.
#[derive(Debug, Error)]
pub enum KvError {
    /// Network-level failure reaching the store.
    #[error("kv transport error: {0}")]
    Transport(String),

    /// The store answered, but not in the shape the protocol promises.
    #[error("kv protocol error: {0}")]
    Protocol(String),
}

/// Minimal capability surface over the shared key-value store.
///
/// All values are JSON-encoded strings; encoding/decoding is the caller's
/// concern (see [`crate::SharedCache`] for the typed layer).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value. `Ok(None)` means the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Store a value with a TTL, replacing any existing value.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError>;

    /// Store a value with a TTL only if the key does not exist.
    /// Returns `true` when this call created the key.
    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, KvError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), KvError>;
}
