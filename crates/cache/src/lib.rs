//! `storefront-cache` — shared key-value store capability.
//!
//! A deliberately small surface: get, set-with-ttl, set-if-not-exists,
//! delete. Two implementations ship here:
//! - [`RestStore`]: the shared remote store's REST interface
//! - [`MemoryStore`]: in-process map for tests and local development
//!
//! Callers never consume [`KvError`] directly; they go through
//! [`SharedCache`], which degrades every failure to a miss (reads) or a
//! no-op (writes) with a warning. A flaky cache must never break a page.

pub mod memory;
pub mod rest;
pub mod shared;
pub mod store;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use shared::SharedCache;
pub use store::{KeyValueStore, KvError};
