//! Upstream seam for price resolution.

use async_trait::async_trait;

use storefront_core::{ItemId, PriceListId};
use storefront_erp::types::ItemRate;
use storefront_erp::{ErpClient, ErpResult};

/// One pricing call: rates for a batch of items within a price list.
/// Items the list does not price are simply absent from the result.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn rates(
        &self,
        price_list_id: &PriceListId,
        item_ids: &[ItemId],
    ) -> ErpResult<Vec<ItemRate>>;
}

#[async_trait]
impl PriceSource for ErpClient {
    async fn rates(
        &self,
        price_list_id: &PriceListId,
        item_ids: &[ItemId],
    ) -> ErpResult<Vec<ItemRate>> {
        self.price_list_rates(price_list_id, item_ids).await
    }
}
