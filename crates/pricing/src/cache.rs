//! Per-price-list rate cache.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use tracing::{info, warn};

use storefront_cache::SharedCache;
use storefront_core::{ItemId, PriceListId, Tunables};
use storefront_erp::types::ItemRate;

use crate::source::PriceSource;
use crate::types::{PriceRate, RateMap};

/// Cached rate resolution for one price list.
///
/// The composition layer builds one of these per price-list id and keeps it
/// (see its memo map); constructing a fresh instance per call would work
/// but wastes the point of the memo.
pub struct PriceCache {
    cache: SharedCache,
    source: Arc<dyn PriceSource>,
    price_list_id: PriceListId,
    tunables: Tunables,
}

impl PriceCache {
    pub fn new(
        cache: SharedCache,
        source: Arc<dyn PriceSource>,
        price_list_id: PriceListId,
        tunables: Tunables,
    ) -> Self {
        Self {
            cache,
            source,
            price_list_id,
            tunables,
        }
    }

    pub fn price_list_id(&self) -> &PriceListId {
        &self.price_list_id
    }

    /// Cache key is per price list; an invalidation trigger must target the
    /// specific list to avoid cross-tenant price bleed.
    fn cache_key(&self) -> String {
        format!("price:rates:{}", self.price_list_id)
    }

    /// Resolve rates for the given items.
    ///
    /// Served from the per-list cached map when present; otherwise resolved
    /// in fixed-size batches with a bounded concurrency window and cached
    /// for the long price TTL. Ids absent from the returned map are not in
    /// this price list.
    pub async fn rates(&self, item_ids: &[ItemId]) -> RateMap {
        let key = self.cache_key();
        if let Some(cached) = self.cache.get_json::<RateMap>(&key).await {
            return cached;
        }

        let resolved = self.resolve(item_ids).await;

        // A fully-empty result for a non-empty request almost always means
        // every batch failed; persisting it would pin "contact for price"
        // across the whole catalog for the TTL.
        if resolved.is_empty() && !item_ids.is_empty() {
            warn!(
                price_list_id = %self.price_list_id,
                requested = item_ids.len(),
                "price resolution yielded nothing, skipping cache write"
            );
            return resolved;
        }

        self.cache
            .set_json(&key, &resolved, self.tunables.price_ttl())
            .await;
        resolved
    }

    async fn resolve(&self, item_ids: &[ItemId]) -> RateMap {
        let batch_size = self.tunables.price_batch_size.max(1);
        let concurrency = self.tunables.price_batch_concurrency.max(1);
        let batches: Vec<Vec<ItemId>> =
            item_ids.chunks(batch_size).map(<[ItemId]>::to_vec).collect();
        let batch_count = batches.len();

        let results: Vec<Vec<ItemRate>> = stream::iter(
            batches.into_iter().map(|batch| {
                let source = self.source.clone();
                let price_list_id = self.price_list_id.clone();
                async move {
                    match source.rates(&price_list_id, &batch).await {
                        Ok(rates) => rates,
                        Err(e) => {
                            // Partial pricing beats none; this batch's items
                            // will read as not-priced for this resolution.
                            warn!(
                                price_list_id = %price_list_id,
                                batch_len = batch.len(),
                                error = %e,
                                "price batch failed, treating items as unpriced"
                            );
                            Vec::new()
                        }
                    }
                }
            }),
        )
        .buffer_unordered(concurrency)
        .collect()
        .await;

        let mut map = HashMap::new();
        for rate in results.into_iter().flatten() {
            map.insert(
                rate.item_id.clone(),
                PriceRate {
                    rate: rate.rate,
                    currency: rate.currency,
                },
            );
        }

        info!(
            price_list_id = %self.price_list_id,
            requested = item_ids.len(),
            priced = map.len(),
            batches = batch_count,
            "resolved price list rates"
        );
        map
    }

    /// Drop this list's cached rates (invalidation hook).
    pub async fn invalidate(&self) -> bool {
        self.cache.clear(&self.cache_key()).await
    }
}
