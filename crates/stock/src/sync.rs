//! Write-side operations: full sync and targeted quick sync.

use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info, warn};
use uuid::Uuid;

use storefront_core::ItemId;
use storefront_erp::ErpResult;

use crate::cache::{STOCK_MAP_KEY, SYNC_LOCK_KEY, StockCache};
use crate::types::{FullSyncOptions, QuickSyncReport, StockEntry, StockMap, SyncReport};

/// Attempts for the quick-sync save loop.
const SAVE_ATTEMPTS: u32 = 3;

/// Wait between quick-sync save attempts.
const SAVE_RETRY_WAIT: Duration = Duration::from_millis(250);

impl StockCache {
    /// Full reconciliation run: list active items, fetch each item's
    /// warehouse figure, merge into the cached map.
    ///
    /// Holds the sync lock for the duration unless `skip_lock` is set
    /// (externally-orchestrated chunked runs own mutual exclusion
    /// themselves). If another run holds the lock the call returns
    /// immediately with `success=false` and touches nothing.
    pub async fn full_sync(&self, options: FullSyncOptions) -> SyncReport {
        let run_id = Uuid::now_v7();

        if !options.skip_lock {
            let marker = format!("{run_id}@{}", Utc::now().to_rfc3339());
            let acquired = self
                .cache
                .acquire_marker(SYNC_LOCK_KEY, &marker, self.tunables.sync_lock_ttl())
                .await;
            if !acquired {
                info!(%run_id, "full sync skipped: another run holds the lock");
                return SyncReport::skipped();
            }
        }

        let report = self.run_sync(run_id, &options).await;

        if !options.skip_lock {
            // Released on every path out of the run, errors included.
            self.cache.clear(SYNC_LOCK_KEY).await;
        }

        report
    }

    async fn run_sync(&self, run_id: Uuid, options: &FullSyncOptions) -> SyncReport {
        let batch_size = options
            .batch_size
            .unwrap_or(self.tunables.sync_batch_size)
            .max(1);
        let delay = options
            .inter_batch_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.tunables.inter_batch_delay());

        info!(
            %run_id,
            offset = options.offset,
            max_items = ?options.max_items,
            batch_size,
            "starting full stock sync"
        );

        let all_ids = match self.list_all_active_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(%run_id, error = %e, "item listing failed, aborting sync");
                return SyncReport::skipped();
            }
        };

        let total = all_ids.len();
        let window: Vec<ItemId> = all_ids
            .into_iter()
            .skip(options.offset)
            .take(options.max_items.unwrap_or(usize::MAX))
            .collect();
        let end = options.offset + window.len();
        let next_offset = (end < total).then_some(end);

        let mut fetched = StockMap::new();
        let mut errors = 0usize;
        for (batch_index, chunk) in window.chunks(batch_size).enumerate() {
            if batch_index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let results = join_all(chunk.iter().map(|id| self.fetch_item_stock(id))).await;
            for (id, result) in chunk.iter().zip(results) {
                match result {
                    Ok(stock) => {
                        fetched.insert(id.clone(), stock);
                    }
                    Err(e) => {
                        warn!(
                            item_id = %id,
                            error = %e,
                            "item fetch failed, recording 0 for this run"
                        );
                        errors += 1;
                        fetched.insert(id.clone(), 0);
                    }
                }
            }
        }

        // Read-merge-write so ids outside this offset window survive;
        // chunked runs union instead of clobbering each other.
        let merged = merge_fetched(self.load_entry().await, fetched);
        let saved = self.store_entry(&merged).await;

        info!(
            %run_id,
            processed = window.len(),
            errors,
            item_count = merged.item_count,
            next_offset = ?next_offset,
            "full stock sync finished"
        );

        SyncReport {
            success: saved,
            processed: window.len(),
            errors,
            next_offset,
        }
    }

    /// Targeted refresh for a small id set (items just viewed, items just
    /// touched by an order).
    ///
    /// Failed items keep their previous cached value rather than being
    /// zeroed: a quick sync refines the map, it never degrades it. The save
    /// gets its own retry loop because silently losing this write
    /// reintroduces the staleness the call was meant to fix.
    pub async fn quick_sync(&self, item_ids: &[ItemId]) -> QuickSyncReport {
        if item_ids.is_empty() {
            return QuickSyncReport {
                updated: 0,
                errors: 0,
            };
        }

        let results = join_all(item_ids.iter().map(|id| self.fetch_item_stock(id))).await;
        let mut updates = StockMap::new();
        let mut errors = 0usize;
        for (id, result) in item_ids.iter().zip(results) {
            match result {
                Ok(stock) => {
                    updates.insert(id.clone(), stock);
                }
                Err(e) => {
                    warn!(item_id = %id, error = %e, "quick sync item fetch failed");
                    errors += 1;
                }
            }
        }

        if updates.is_empty() {
            return QuickSyncReport { updated: 0, errors };
        }
        let updated = updates.len();

        let mut entry = self
            .load_entry()
            .await
            .unwrap_or_else(|| StockEntry::new(StockMap::new()));
        for (id, stock) in updates {
            entry.stock.insert(id, stock);
        }
        entry.item_count = entry.stock.len();

        let mut saved = false;
        for attempt in 1..=SAVE_ATTEMPTS {
            if self.store_entry(&entry).await {
                saved = true;
                break;
            }
            warn!(attempt, max = SAVE_ATTEMPTS, key = STOCK_MAP_KEY, "quick sync save failed");
            if attempt < SAVE_ATTEMPTS {
                tokio::time::sleep(SAVE_RETRY_WAIT).await;
            }
        }

        if saved {
            QuickSyncReport { updated, errors }
        } else {
            QuickSyncReport {
                updated: 0,
                errors: errors + updated,
            }
        }
    }

    /// Walk the listing endpoint to exhaustion, bounded by the page ceiling.
    async fn list_all_active_ids(&self) -> ErpResult<Vec<ItemId>> {
        let per_page = self.tunables.catalog_page_size;
        let mut ids = Vec::new();

        for page in 1..=self.tunables.catalog_max_pages {
            let page_result = self.source.list_active_items(page, per_page).await?;
            let has_more = page_result.has_more();
            let got = page_result.items.len();
            ids.extend(page_result.items.into_iter().map(|item| item.item_id));
            if !has_more || got == 0 {
                break;
            }
        }

        Ok(ids)
    }

    /// Fetch one item's warehouse figure, retrying once on a rate limit.
    /// An item whose payload lacks the warehouse counts as 0 observed stock.
    async fn fetch_item_stock(&self, item_id: &ItemId) -> ErpResult<i64> {
        match self.source.warehouse_stock(item_id).await {
            Ok(stock) => Ok(stock.unwrap_or(0)),
            Err(e) if e.is_rate_limited() => {
                let wait = self.tunables.rate_limit_base_backoff();
                warn!(
                    item_id = %item_id,
                    wait_secs = wait.as_secs(),
                    "item fetch rate limited, retrying once"
                );
                tokio::time::sleep(wait).await;
                Ok(self.source.warehouse_stock(item_id).await?.unwrap_or(0))
            }
            Err(e) => Err(e),
        }
    }
}

/// Merge freshly-fetched figures over the previous map.
///
/// Superset-preserving: every id from the previous map survives unless the
/// fetch observed a newer figure for it. Resets `updated_at` — a sync run
/// re-validates the map's freshness (point backfills do not come through
/// here).
pub(crate) fn merge_fetched(existing: Option<StockEntry>, fetched: StockMap) -> StockEntry {
    let mut entry = existing.unwrap_or_else(|| StockEntry::new(StockMap::new()));
    for (id, stock) in fetched {
        entry.stock.insert(id, stock);
    }
    entry.item_count = entry.stock.len();
    entry.updated_at = Utc::now();
    entry
}
