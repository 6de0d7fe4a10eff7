//! Catalog cache with the non-empty safeguard.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

use storefront_cache::SharedCache;
use storefront_core::Tunables;
use storefront_erp::ErpError;

use crate::source::CatalogSource;
use crate::types::ProductMetadata;

/// Shared-store key for the product catalog.
pub const CATALOG_KEY: &str = "catalog:products";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog fetch failed: {0}")]
    Upstream(#[from] ErpError),

    /// The listing yielded zero items. Raised instead of cached: a transient
    /// auth hiccup upstream must not replace a good catalog with an empty
    /// one for a whole TTL period.
    #[error("catalog fetch returned zero items, refusing to cache")]
    EmptyCatalog,
}

/// Cached product catalog.
pub struct CatalogCache {
    cache: SharedCache,
    source: Arc<dyn CatalogSource>,
    tunables: Tunables,
}

impl CatalogCache {
    pub fn new(cache: SharedCache, source: Arc<dyn CatalogSource>, tunables: Tunables) -> Self {
        Self {
            cache,
            source,
            tunables,
        }
    }

    /// The full catalog, cached for the catalog TTL.
    ///
    /// The empty-result safeguard is an explicit do-not-store decision made
    /// before any cache write, not an exception thrown to trick a caching
    /// wrapper into skipping persistence.
    pub async fn get_all(&self) -> Result<Vec<ProductMetadata>, CatalogError> {
        if let Some(cached) = self
            .cache
            .get_json::<Vec<ProductMetadata>>(CATALOG_KEY)
            .await
        {
            // An empty cached catalog should be impossible; treat one as a
            // miss rather than serving a blank shop.
            if !cached.is_empty() {
                return Ok(cached);
            }
            warn!("ignoring empty cached catalog");
        }

        let fetched = self.fetch_all().await?;
        if fetched.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        self.cache
            .set_json(CATALOG_KEY, &fetched, self.tunables.catalog_ttl())
            .await;
        Ok(fetched)
    }

    /// Degraded-but-up wrapper: on any cache-path error, serve one direct
    /// uncached fetch so the page still renders.
    pub async fn get_all_safe(&self) -> Vec<ProductMetadata> {
        match self.get_all().await {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "catalog cache path failed, serving direct fetch");
                match self.fetch_all().await {
                    Ok(products) => products,
                    Err(e) => {
                        error!(error = %e, "direct catalog fetch failed");
                        Vec::new()
                    }
                }
            }
        }
    }

    /// Paginate the listing to exhaustion, bounded by the page ceiling.
    async fn fetch_all(&self) -> Result<Vec<ProductMetadata>, CatalogError> {
        let per_page = self.tunables.catalog_page_size;
        let max_pages = self.tunables.catalog_max_pages;
        let mut products = Vec::new();

        for page in 1..=max_pages {
            let page_result = self.source.list_items(page, per_page).await?;
            let has_more = page_result.has_more();
            let got = page_result.items.len();
            products.extend(page_result.items.into_iter().map(ProductMetadata::from));

            if !has_more || got == 0 {
                return Ok(products);
            }
            if page == max_pages {
                warn!(
                    max_pages,
                    collected = products.len(),
                    "catalog page ceiling reached with more pages reported"
                );
            }
        }

        Ok(products)
    }

    /// Drop the cached catalog (invalidation hook).
    pub async fn invalidate(&self) -> bool {
        self.cache.clear(CATALOG_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use storefront_cache::{MemoryStore, SharedCache};
    use storefront_core::ItemId;
    use storefront_erp::ErpResult;
    use storefront_erp::types::{ItemPage, ItemSummary, PageContext};

    use super::*;

    struct FakeCatalog {
        total: usize,
        calls: AtomicUsize,
        endless: bool,
    }

    impl FakeCatalog {
        fn with_items(total: usize) -> Self {
            Self {
                total,
                calls: AtomicUsize::new(0),
                endless: false,
            }
        }

        /// Always reports another page, for ceiling tests.
        fn endless() -> Self {
            Self {
                total: usize::MAX,
                calls: AtomicUsize::new(0),
                endless: true,
            }
        }

        fn pages(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogSource for FakeCatalog {
        async fn list_items(&self, page: usize, per_page: usize) -> ErpResult<ItemPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = (page - 1) * per_page;
            let count = if self.endless {
                per_page
            } else {
                self.total.saturating_sub(start).min(per_page)
            };
            let items = (0..count)
                .map(|n| ItemSummary {
                    item_id: ItemId::new(format!("item-{}", start + n)),
                    name: format!("Product {}", start + n),
                    sku: format!("SKU-{}", start + n),
                    category_name: "General".to_string(),
                    brand: String::new(),
                    unit: "pcs".to_string(),
                    image_name: None,
                    status: "active".to_string(),
                })
                .collect();
            let has_more_page = self.endless || start + count < self.total;
            Ok(ItemPage {
                items,
                page_context: Some(PageContext {
                    page: page as u32,
                    has_more_page,
                }),
            })
        }
    }

    fn tunables(per_page: usize, max_pages: usize) -> Tunables {
        Tunables {
            catalog_page_size: per_page,
            catalog_max_pages: max_pages,
            ..Tunables::default()
        }
    }

    #[tokio::test]
    async fn paginates_to_exhaustion_and_caches() {
        let source = Arc::new(FakeCatalog::with_items(450));
        let store = Arc::new(MemoryStore::new());
        let cache = CatalogCache::new(
            SharedCache::new(store),
            source.clone(),
            tunables(200, 50),
        );

        let products = cache.get_all().await.unwrap();
        assert_eq!(products.len(), 450);
        assert_eq!(source.pages(), 3);

        // Second read comes from the cache.
        let again = cache.get_all().await.unwrap();
        assert_eq!(again.len(), 450);
        assert_eq!(source.pages(), 3);
    }

    #[tokio::test]
    async fn page_ceiling_guarantees_termination() {
        let source = Arc::new(FakeCatalog::endless());
        let cache = CatalogCache::new(
            SharedCache::new(Arc::new(MemoryStore::new())),
            source.clone(),
            tunables(2, 3),
        );

        let products = cache.get_all().await.unwrap();
        assert_eq!(products.len(), 6);
        assert_eq!(source.pages(), 3);
    }

    #[tokio::test]
    async fn empty_fetch_raises_and_persists_nothing() {
        let source = Arc::new(FakeCatalog::with_items(0));
        let store = Arc::new(MemoryStore::new());
        let cache = CatalogCache::new(
            SharedCache::new(store.clone()),
            source,
            tunables(200, 50),
        );

        let err = cache.get_all().await.unwrap_err();
        assert!(matches!(err, CatalogError::EmptyCatalog));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn safe_wrapper_degrades_instead_of_failing() {
        let source = Arc::new(FakeCatalog::with_items(0));
        let cache = CatalogCache::new(
            SharedCache::new(Arc::new(MemoryStore::new())),
            source,
            tunables(200, 50),
        );

        // Zero items everywhere: the safe wrapper serves an empty page
        // rather than an error.
        assert!(cache.get_all_safe().await.is_empty());
    }
}
