//! Read-side operations of the reconciliation cache.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use storefront_cache::SharedCache;
use storefront_core::{ItemId, Tunables};

use crate::source::StockSource;
use crate::types::{BulkLookup, SingleStock, StockEntry, StockOrigin, StockStatus};

/// Shared-store key for the warehouse stock map.
pub const STOCK_MAP_KEY: &str = "stock:warehouse-map";

/// Shared-store key for the full-sync mutual-exclusion marker.
pub const SYNC_LOCK_KEY: &str = "stock:sync-lock";

/// Warehouse stock reconciliation cache.
///
/// One instance per process; all state lives in the shared store, so any
/// number of instances converge on the same map.
pub struct StockCache {
    pub(crate) cache: SharedCache,
    pub(crate) source: Arc<dyn StockSource>,
    pub(crate) tunables: Tunables,
}

impl StockCache {
    pub fn new(cache: SharedCache, source: Arc<dyn StockSource>, tunables: Tunables) -> Self {
        Self {
            cache,
            source,
            tunables,
        }
    }

    pub(crate) async fn load_entry(&self) -> Option<StockEntry> {
        self.cache.get_json(STOCK_MAP_KEY).await
    }

    pub(crate) async fn store_entry(&self, entry: &StockEntry) -> bool {
        self.cache
            .set_json(STOCK_MAP_KEY, entry, self.tunables.stock_ttl())
            .await
    }

    /// Single-item lookup with optional on-demand backfill.
    ///
    /// On a miss with `fetch_on_miss`, fetches the warehouse figure from the
    /// inventory API, patches it into the cached map as a point upsert
    /// (preserving the map's `updated_at`), and reports `source=api`. On a
    /// miss without `fetch_on_miss`, or on any upstream failure, reports
    /// zero stock as `unavailable` — never a guess.
    pub async fn get_single(&self, item_id: &ItemId, fetch_on_miss: bool) -> SingleStock {
        let entry = self.load_entry().await;

        if let Some(entry) = &entry {
            if let Some(&stock) = entry.stock.get(item_id) {
                return SingleStock {
                    stock,
                    source: StockOrigin::Cache,
                };
            }
        }

        if !fetch_on_miss {
            return SingleStock::unavailable();
        }

        match self.source.warehouse_stock(item_id).await {
            Ok(Some(stock)) => {
                self.backfill(entry, item_id.clone(), stock).await;
                SingleStock {
                    stock,
                    source: StockOrigin::Api,
                }
            }
            Ok(None) => {
                // The payload had no figure for our warehouse; nothing to
                // justify a non-zero answer with.
                SingleStock::unavailable()
            }
            Err(e) => {
                warn!(item_id = %item_id, error = %e, "on-demand stock fetch failed");
                SingleStock::unavailable()
            }
        }
    }

    /// Patch one observed figure into the cached map.
    ///
    /// Preserves the existing `updated_at`: a point backfill makes the map
    /// more complete, it does not re-validate the whole map's freshness.
    async fn backfill(&self, entry: Option<StockEntry>, item_id: ItemId, stock: i64) {
        let mut entry = entry.unwrap_or_else(|| StockEntry::new(HashMap::new()));
        entry.stock.insert(item_id, stock);
        entry.item_count = entry.stock.len();
        self.store_entry(&entry).await;
    }

    /// Bulk lookup for listing pages. Cache-only by contract: absent ids
    /// come back as 0 and no upstream call is made, whatever the miss rate.
    pub async fn get_bulk(&self, item_ids: &[ItemId]) -> HashMap<ItemId, i64> {
        self.get_bulk_detailed(item_ids).await.into_stock_map()
    }

    /// Bulk lookup that keeps per-id cache presence, for callers that
    /// account hits vs misses (the composition layer decides from this
    /// whether a fresh full sync is warranted).
    pub async fn get_bulk_detailed(&self, item_ids: &[ItemId]) -> BulkLookup {
        let entry = self.load_entry().await;

        let mut entries = HashMap::with_capacity(item_ids.len());
        for id in item_ids {
            entries.insert(
                id.clone(),
                entry.as_ref().and_then(|e| e.stock.get(id)).copied(),
            );
        }

        let lookup = BulkLookup { entries };
        info!(
            requested = item_ids.len(),
            hits = lookup.hits(),
            misses = lookup.misses(),
            "bulk stock lookup served from cache"
        );
        lookup
    }

    /// Cache health: existence, size, age, staleness.
    pub async fn status(&self) -> StockStatus {
        match self.load_entry().await {
            Some(entry) => StockStatus {
                exists: true,
                item_count: entry.item_count,
                age_seconds: entry.age_seconds(),
                is_stale: entry.is_stale(self.tunables.stock_ttl()),
            },
            None => StockStatus {
                exists: false,
                item_count: 0,
                age_seconds: 0,
                is_stale: true,
            },
        }
    }

    /// Drop the cached map (invalidation hook).
    pub async fn invalidate(&self) -> bool {
        self.cache.clear(STOCK_MAP_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storefront_cache::{MemoryStore, SharedCache};

    use super::*;
    use crate::sync::tests::FakeSource;

    fn harness(source: Arc<FakeSource>) -> StockCache {
        let cache = SharedCache::new(Arc::new(MemoryStore::new()));
        StockCache::new(cache, source, Tunables::default())
    }

    #[tokio::test]
    async fn miss_without_fetch_is_unavailable_and_free() {
        let source = Arc::new(FakeSource::with_stock(&[("z", 12)]));
        let stock = harness(source.clone());

        let answer = stock.get_single(&ItemId::new("z"), false).await;
        assert_eq!(answer, SingleStock::unavailable());
        assert_eq!(source.stock_calls(), 0);
    }

    #[tokio::test]
    async fn miss_with_fetch_backfills_and_later_hits_cache() {
        let source = Arc::new(FakeSource::with_stock(&[("z", 12)]));
        let stock = harness(source.clone());
        let id = ItemId::new("z");

        let first = stock.get_single(&id, true).await;
        assert_eq!(first.stock, 12);
        assert_eq!(first.source, StockOrigin::Api);

        let second = stock.get_single(&id, false).await;
        assert_eq!(second.stock, 12);
        assert_eq!(second.source, StockOrigin::Cache);
        assert_eq!(source.stock_calls(), 1);
    }

    #[tokio::test]
    async fn backfill_preserves_the_maps_updated_at() {
        let source = Arc::new(FakeSource::with_stock(&[("a", 1), ("b", 2)]));
        let cache = SharedCache::new(Arc::new(MemoryStore::new()));
        let stock = StockCache::new(cache.clone(), source, Tunables::default());

        // Seed a map with a known timestamp.
        let seeded = StockEntry {
            stock: [(ItemId::new("a"), 1)].into_iter().collect(),
            updated_at: chrono::Utc::now() - chrono::Duration::minutes(5),
            item_count: 1,
        };
        cache
            .set_json(STOCK_MAP_KEY, &seeded, std::time::Duration::from_secs(1800))
            .await;

        stock.get_single(&ItemId::new("b"), true).await;

        let after: StockEntry = cache.get_json(STOCK_MAP_KEY).await.unwrap();
        assert_eq!(after.item_count, 2);
        assert_eq!(after.updated_at, seeded.updated_at);
    }

    #[tokio::test]
    async fn upstream_failure_degrades_to_unavailable() {
        let source = Arc::new(FakeSource::failing());
        let stock = harness(source);

        let answer = stock.get_single(&ItemId::new("x"), true).await;
        assert_eq!(answer, SingleStock::unavailable());
    }

    #[tokio::test]
    async fn bulk_returns_zero_for_absent_ids_without_upstream_calls() {
        let source = Arc::new(FakeSource::with_stock(&[("x", 5), ("y", 9)]));
        let stock = harness(source.clone());

        // Cache holds only x.
        stock.get_single(&ItemId::new("x"), true).await;
        let calls_before = source.stock_calls();

        let result = stock
            .get_bulk(&[ItemId::new("x"), ItemId::new("y")])
            .await;
        assert_eq!(result[&ItemId::new("x")], 5);
        assert_eq!(result[&ItemId::new("y")], 0);
        assert_eq!(source.stock_calls(), calls_before);
    }

    #[tokio::test]
    async fn status_reflects_empty_and_stale_states() {
        let source = Arc::new(FakeSource::with_stock(&[]));
        let cache = SharedCache::new(Arc::new(MemoryStore::new()));
        let stock = StockCache::new(cache.clone(), source, Tunables::default());

        let empty = stock.status().await;
        assert!(!empty.exists);
        assert!(empty.is_stale);

        let old = StockEntry {
            stock: [(ItemId::new("a"), 3)].into_iter().collect(),
            updated_at: chrono::Utc::now() - chrono::Duration::hours(2),
            item_count: 1,
        };
        cache
            .set_json(STOCK_MAP_KEY, &old, std::time::Duration::from_secs(1800))
            .await;

        let stale = stock.status().await;
        assert!(stale.exists);
        assert_eq!(stale.item_count, 1);
        assert!(stale.is_stale);
        assert!(stale.age_seconds >= 7200);
    }
}
