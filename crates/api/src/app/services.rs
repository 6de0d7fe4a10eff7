//! Infrastructure wiring: KV store, ERP client, the three caches, and the
//! composition layer, shared across handlers behind one `Arc`.

use std::sync::Arc;

use storefront_cache::{KeyValueStore, RestStore, SharedCache};
use storefront_catalog::CatalogCache;
use storefront_core::Config;
use storefront_erp::ErpClient;
use storefront_shop::Shop;
use storefront_stock::StockCache;

/// Everything a handler needs.
pub struct AppServices {
    pub config: Arc<Config>,
    pub erp: ErpClient,
    pub stock: Arc<StockCache>,
    pub catalog: Arc<CatalogCache>,
    pub shop: Shop,
}

/// Wire production services against the shared REST key-value store.
pub fn build_services(config: Config) -> AppServices {
    let store = Arc::new(RestStore::new(&config.kv_rest_url, &config.kv_rest_token));
    build_services_with_store(config, store)
}

/// Wiring seam used by tests to substitute an in-memory store.
pub fn build_services_with_store(config: Config, store: Arc<dyn KeyValueStore>) -> AppServices {
    let config = Arc::new(config);
    let cache = SharedCache::new(store);
    let erp = ErpClient::new(config.clone(), cache.clone());

    let stock = Arc::new(StockCache::new(
        cache.clone(),
        Arc::new(erp.clone()),
        config.tunables.clone(),
    ));
    let catalog = Arc::new(CatalogCache::new(
        cache.clone(),
        Arc::new(erp.clone()),
        config.tunables.clone(),
    ));
    let shop = Shop::new(
        catalog.clone(),
        stock.clone(),
        cache,
        Arc::new(erp.clone()),
        config.tunables.clone(),
    );

    AppServices {
        config,
        erp,
        stock,
        catalog,
        shop,
    }
}
