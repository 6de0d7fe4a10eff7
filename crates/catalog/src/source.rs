//! Upstream seam for the catalog.

use async_trait::async_trait;

use storefront_erp::types::ItemPage;
use storefront_erp::{ErpClient, ErpResult};

/// One page of the ledger item listing.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_items(&self, page: usize, per_page: usize) -> ErpResult<ItemPage>;
}

#[async_trait]
impl CatalogSource for ErpClient {
    async fn list_items(&self, page: usize, per_page: usize) -> ErpResult<ItemPage> {
        ErpClient::list_items(self, page, per_page, Some("active")).await
    }
}
