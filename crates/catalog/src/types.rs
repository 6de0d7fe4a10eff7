//! Product metadata as served to the storefront.

use serde::{Deserialize, Serialize};

use storefront_core::ItemId;
use storefront_erp::types::ItemSummary;

/// Catalog row: identity and descriptive fields only.
///
/// No stock and no price: those come from their own caches with their own
/// freshness rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub item_id: ItemId,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub brand: String,
    pub unit: String,
    pub image: Option<String>,
    pub status: String,
}

impl From<ItemSummary> for ProductMetadata {
    fn from(item: ItemSummary) -> Self {
        Self {
            item_id: item.item_id,
            name: item.name,
            sku: item.sku,
            category: item.category_name,
            brand: item.brand,
            unit: item.unit,
            image: item.image_name,
            status: item.status,
        }
    }
}
