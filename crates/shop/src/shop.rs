//! Cache composition and per-price-list memoization.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, warn};

use storefront_cache::SharedCache;
use storefront_catalog::CatalogCache;
use storefront_core::{ItemId, PriceListId, Tunables};
use storefront_pricing::{PriceCache, PriceEntry, PriceSource};
use storefront_stock::{StockCache, StockOrigin};

use crate::view::{ProductListing, ProductView};

/// Catalog size below which the miss-rate alarm stays quiet; tiny catalogs
/// produce noisy ratios.
const MISS_ALARM_MIN_CATALOG: usize = 50;

/// Composition layer over the three caches.
pub struct Shop {
    catalog: Arc<CatalogCache>,
    stock: Arc<StockCache>,
    cache: SharedCache,
    price_source: Arc<dyn PriceSource>,
    tunables: Tunables,
    /// Price-cache plumbing per price list, built once and looked up —
    /// never reconstructed per call.
    price_caches: RwLock<HashMap<PriceListId, Arc<PriceCache>>>,
}

impl Shop {
    pub fn new(
        catalog: Arc<CatalogCache>,
        stock: Arc<StockCache>,
        cache: SharedCache,
        price_source: Arc<dyn PriceSource>,
        tunables: Tunables,
    ) -> Self {
        Self {
            catalog,
            stock,
            cache,
            price_source,
            tunables,
            price_caches: RwLock::new(HashMap::new()),
        }
    }

    /// Every product with its warehouse stock figure.
    ///
    /// An empty stock cache produces the explicit degraded mode: all stock
    /// forced to zero, `degraded=true`, and an error log directing an
    /// operator to run a sync. Visibly wrong-but-safe.
    pub async fn all_products_complete(&self) -> ProductListing {
        let products = self.catalog.get_all_safe().await;
        let status = self.stock.status().await;

        if !status.exists {
            error!(
                catalog_size = products.len(),
                "stock cache is empty, serving everything as out of stock; run a full sync"
            );
            let products = products
                .into_iter()
                .map(|metadata| ProductView {
                    metadata,
                    stock: 0,
                    stock_source: StockOrigin::Unavailable,
                    price: None,
                })
                .collect();
            return ProductListing {
                products,
                degraded: true,
            };
        }

        let ids: Vec<ItemId> = products.iter().map(|p| p.item_id.clone()).collect();
        let lookup = self.stock.get_bulk_detailed(&ids).await;

        let (hits, misses) = (lookup.hits(), lookup.misses());
        if misses > hits && products.len() >= MISS_ALARM_MIN_CATALOG {
            warn!(
                hits,
                misses,
                catalog_size = products.len(),
                "stock cache misses exceed hits, a fresh full sync is warranted"
            );
        }

        let products = products
            .into_iter()
            .map(|metadata| {
                let (stock, stock_source) = lookup.stock_for(&metadata.item_id);
                ProductView {
                    metadata,
                    stock,
                    stock_source,
                    price: None,
                }
            })
            .collect();

        ProductListing {
            products,
            degraded: false,
        }
    }

    /// Products with stock and the given price list's rates.
    ///
    /// Ids the pricing endpoint did not return come back `in_price_list =
    /// false` with rate 0; the UI renders those as "contact for price".
    pub async fn products_with_prices(&self, price_list_id: &PriceListId) -> ProductListing {
        let mut listing = self.all_products_complete().await;

        let price_cache = self.price_cache_for(price_list_id).await;
        let ids: Vec<ItemId> = listing
            .products
            .iter()
            .map(|p| p.metadata.item_id.clone())
            .collect();
        let rates = price_cache.rates(&ids).await;

        for view in &mut listing.products {
            view.price = Some(PriceEntry::from_lookup(rates.get(&view.metadata.item_id)));
        }

        listing
    }

    /// Memoized per-price-list cache handle.
    async fn price_cache_for(&self, price_list_id: &PriceListId) -> Arc<PriceCache> {
        if let Some(found) = self.price_caches.read().await.get(price_list_id) {
            return found.clone();
        }

        let mut map = self.price_caches.write().await;
        map.entry(price_list_id.clone())
            .or_insert_with(|| {
                Arc::new(PriceCache::new(
                    self.cache.clone(),
                    self.price_source.clone(),
                    price_list_id.clone(),
                    self.tunables.clone(),
                ))
            })
            .clone()
    }

    /// Invalidation hook for one price list's cached rates.
    pub async fn invalidate_price_list(&self, price_list_id: &PriceListId) -> bool {
        self.price_cache_for(price_list_id).await.invalidate().await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use storefront_cache::{MemoryStore, SharedCache};
    use storefront_catalog::CatalogSource;
    use storefront_erp::types::{ItemPage, ItemRate, ItemSummary, PageContext};
    use storefront_erp::{ErpError, ErpResult};
    use storefront_stock::{FullSyncOptions, StockSource};

    use super::*;

    /// One fake upstream serving listing, stock, and prices.
    struct FakeErp {
        items: Vec<(&'static str, i64)>,
        priced: Vec<(&'static str, f64)>,
    }

    impl FakeErp {
        fn summary(id: &str, n: usize) -> ItemSummary {
            ItemSummary {
                item_id: ItemId::new(id),
                name: format!("Product {n}"),
                sku: format!("SKU-{n}"),
                category_name: "General".to_string(),
                brand: String::new(),
                unit: "pcs".to_string(),
                image_name: None,
                status: "active".to_string(),
            }
        }
    }

    #[async_trait]
    impl CatalogSource for FakeErp {
        async fn list_items(&self, page: usize, _per_page: usize) -> ErpResult<ItemPage> {
            if page > 1 {
                return Ok(ItemPage {
                    items: Vec::new(),
                    page_context: None,
                });
            }
            Ok(ItemPage {
                items: self
                    .items
                    .iter()
                    .enumerate()
                    .map(|(n, (id, _))| Self::summary(id, n))
                    .collect(),
                page_context: Some(PageContext {
                    page: 1,
                    has_more_page: false,
                }),
            })
        }
    }

    #[async_trait]
    impl StockSource for FakeErp {
        async fn list_active_items(&self, page: usize, per_page: usize) -> ErpResult<ItemPage> {
            CatalogSource::list_items(self, page, per_page).await
        }

        async fn warehouse_stock(&self, item_id: &ItemId) -> ErpResult<Option<i64>> {
            Ok(self
                .items
                .iter()
                .find(|(id, _)| *id == item_id.as_str())
                .map(|(_, stock)| *stock))
        }
    }

    #[async_trait]
    impl PriceSource for FakeErp {
        async fn rates(
            &self,
            price_list_id: &PriceListId,
            item_ids: &[ItemId],
        ) -> ErpResult<Vec<ItemRate>> {
            if price_list_id.as_str() == "broken" {
                return Err(ErpError::upstream(500, "pricing down"));
            }
            Ok(self
                .priced
                .iter()
                .filter(|(id, _)| item_ids.iter().any(|i| i.as_str() == *id))
                .map(|(id, rate)| ItemRate {
                    item_id: ItemId::new(*id),
                    rate: *rate,
                    currency: Some("USD".to_string()),
                })
                .collect())
        }
    }

    fn build_shop(erp: Arc<FakeErp>) -> (Shop, Arc<StockCache>) {
        let cache = SharedCache::new(Arc::new(MemoryStore::new()));
        let tunables = Tunables::default();
        let catalog = Arc::new(CatalogCache::new(
            cache.clone(),
            erp.clone(),
            tunables.clone(),
        ));
        let stock = Arc::new(StockCache::new(
            cache.clone(),
            erp.clone(),
            tunables.clone(),
        ));
        (
            Shop::new(catalog, stock.clone(), cache, erp, tunables),
            stock,
        )
    }

    #[tokio::test]
    async fn empty_stock_cache_forces_zero_and_flags_degraded() {
        let erp = Arc::new(FakeErp {
            items: vec![("a", 5), ("b", 2)],
            priced: vec![],
        });
        let (shop, _) = build_shop(erp);

        let listing = shop.all_products_complete().await;
        assert!(listing.degraded);
        assert_eq!(listing.products.len(), 2);
        for view in &listing.products {
            assert_eq!(view.stock, 0);
            assert_eq!(view.stock_source, StockOrigin::Unavailable);
        }
    }

    #[tokio::test]
    async fn synced_stock_merges_into_the_listing() {
        let erp = Arc::new(FakeErp {
            items: vec![("a", 5), ("b", 2)],
            priced: vec![],
        });
        let (shop, stock) = build_shop(erp);
        stock.full_sync(FullSyncOptions::default()).await;

        let listing = shop.all_products_complete().await;
        assert!(!listing.degraded);
        let a = listing
            .products
            .iter()
            .find(|p| p.metadata.item_id.as_str() == "a")
            .unwrap();
        assert_eq!(a.stock, 5);
        assert_eq!(a.stock_source, StockOrigin::Cache);
    }

    #[tokio::test]
    async fn unpriced_items_render_contact_for_price() {
        let erp = Arc::new(FakeErp {
            items: vec![("a", 5), ("b", 2)],
            priced: vec![("a", 19.5)],
        });
        let (shop, stock) = build_shop(erp);
        stock.full_sync(FullSyncOptions::default()).await;

        let listing = shop
            .products_with_prices(&PriceListId::new("pl-1"))
            .await;
        let a = listing
            .products
            .iter()
            .find(|p| p.metadata.item_id.as_str() == "a")
            .unwrap();
        let b = listing
            .products
            .iter()
            .find(|p| p.metadata.item_id.as_str() == "b")
            .unwrap();

        let a_price = a.price.as_ref().unwrap();
        assert!(a_price.in_price_list);
        assert_eq!(a_price.rate, 19.5);

        let b_price = b.price.as_ref().unwrap();
        assert!(!b_price.in_price_list);
        assert_eq!(b_price.rate, 0.0);
    }

    #[tokio::test]
    async fn price_cache_plumbing_is_memoized_per_list() {
        let erp = Arc::new(FakeErp {
            items: vec![("a", 5)],
            priced: vec![("a", 1.0)],
        });
        let (shop, _) = build_shop(erp);

        let first = shop.price_cache_for(&PriceListId::new("pl-1")).await;
        let second = shop.price_cache_for(&PriceListId::new("pl-1")).await;
        let other = shop.price_cache_for(&PriceListId::new("pl-2")).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
