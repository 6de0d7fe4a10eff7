//! `storefront-stock` — warehouse stock reconciliation cache.
//!
//! Maintains a single warehouse-scoped stock map in the shared key-value
//! store, synchronized in bulk (scheduled or triggered full sync) and on
//! demand (cache-miss fetch + backfill). The contract callers rely on:
//!
//! - an entry exists only for items a sync or backfill actually observed;
//!   absence is never treated as "in stock"
//! - bulk reads never call the upstream, whatever the miss rate — only
//!   writers spend the inventory API's rate budget
//! - the cache prefers returning 0/"unavailable" over guessing; a false
//!   "in stock" is worse than a false "out of stock" for a storefront
//!   that takes payment

pub mod cache;
pub mod source;
pub mod sync;
pub mod types;

pub use cache::{STOCK_MAP_KEY, SYNC_LOCK_KEY, StockCache};
pub use source::StockSource;
pub use types::{
    BulkLookup, FullSyncOptions, QuickSyncReport, SingleStock, StockEntry, StockMap,
    StockOrigin, StockStatus, SyncReport,
};
