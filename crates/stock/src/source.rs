//! Upstream seam for the reconciliation cache.

use async_trait::async_trait;

use storefront_core::ItemId;
use storefront_erp::types::ItemPage;
use storefront_erp::{ErpClient, ErpResult};

/// What the stock cache needs from the upstream: the active-item listing
/// (ledger API) and the warehouse-scoped stock figure (inventory API).
///
/// Tests substitute fakes; production uses [`ErpClient`].
#[async_trait]
pub trait StockSource: Send + Sync {
    /// One page of active items from the listing endpoint.
    async fn list_active_items(&self, page: usize, per_page: usize) -> ErpResult<ItemPage>;

    /// Available-for-sale stock at the configured warehouse, `None` when
    /// the upstream payload does not carry that warehouse.
    async fn warehouse_stock(&self, item_id: &ItemId) -> ErpResult<Option<i64>>;
}

#[async_trait]
impl StockSource for ErpClient {
    async fn list_active_items(&self, page: usize, per_page: usize) -> ErpResult<ItemPage> {
        self.list_items(page, per_page, Some("active")).await
    }

    async fn warehouse_stock(&self, item_id: &ItemId) -> ErpResult<Option<i64>> {
        ErpClient::warehouse_stock(self, item_id).await
    }
}
