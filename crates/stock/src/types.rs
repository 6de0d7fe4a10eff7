//! Stock map data model and operation reports.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::ItemId;

/// Item id → available stock at the configured warehouse.
///
/// Quantities may be negative: the ERP represents over-commitment that way
/// and hiding it would mask real oversell.
pub type StockMap = HashMap<ItemId, i64>;

/// The cached stock map with its provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub stock: StockMap,
    pub updated_at: DateTime<Utc>,
    pub item_count: usize,
}

impl StockEntry {
    /// Fresh entry around a just-synced map.
    pub fn new(stock: StockMap) -> Self {
        let item_count = stock.len();
        Self {
            stock,
            updated_at: Utc::now(),
            item_count,
        }
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.updated_at).num_seconds().max(0)
    }

    /// Stale by age, independent of store-level expiry. Used for proactive
    /// re-sync decisions before the store actually drops the key.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.age_seconds() as u64 >= ttl.as_secs()
    }
}

/// Where a single-item answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOrigin {
    Cache,
    Api,
    Unavailable,
}

/// Answer to a single-item lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SingleStock {
    pub stock: i64,
    pub source: StockOrigin,
}

impl SingleStock {
    pub fn unavailable() -> Self {
        Self {
            stock: 0,
            source: StockOrigin::Unavailable,
        }
    }
}

/// Result of a bulk lookup, keeping per-id cache presence so callers can
/// account hits vs misses and tag sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkLookup {
    /// `None` = not in the cache; served to consumers as 0.
    pub entries: HashMap<ItemId, Option<i64>>,
}

impl BulkLookup {
    pub fn hits(&self) -> usize {
        self.entries.values().filter(|v| v.is_some()).count()
    }

    pub fn misses(&self) -> usize {
        self.entries.len() - self.hits()
    }

    /// Figure and origin for one id, per the no-false-in-stock contract.
    pub fn stock_for(&self, item_id: &ItemId) -> (i64, StockOrigin) {
        match self.entries.get(item_id) {
            Some(Some(stock)) => (*stock, StockOrigin::Cache),
            _ => (0, StockOrigin::Unavailable),
        }
    }

    /// Flatten to the plain id → stock map, absent ids as 0.
    pub fn into_stock_map(self) -> StockMap {
        self.entries
            .into_iter()
            .map(|(id, stock)| (id, stock.unwrap_or(0)))
            .collect()
    }
}

/// Cache health snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockStatus {
    pub exists: bool,
    pub item_count: usize,
    pub age_seconds: i64,
    pub is_stale: bool,
}

/// Outcome of a full sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub success: bool,
    pub processed: usize,
    pub errors: usize,
    /// Present when `max_items` stopped the run short of the listing's end;
    /// pass it back as `offset` to resume the chunked sync.
    pub next_offset: Option<usize>,
}

impl SyncReport {
    /// Report for a run that never started (lock held, listing failed).
    pub fn skipped() -> Self {
        Self {
            success: false,
            processed: 0,
            errors: 0,
            next_offset: None,
        }
    }
}

/// Outcome of a targeted refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickSyncReport {
    pub updated: usize,
    pub errors: usize,
}

/// Knobs for one full sync run. `None` fields fall back to the configured
/// tunables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FullSyncOptions {
    pub batch_size: Option<usize>,
    pub inter_batch_delay_ms: Option<u64>,
    pub max_items: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    /// Bypass the sync lock. Only for externally-orchestrated chunked runs
    /// where the orchestrator owns mutual exclusion.
    #[serde(default)]
    pub skip_lock: bool,
}
