//! View model served to the storefront.

use serde::Serialize;

use storefront_catalog::ProductMetadata;
use storefront_pricing::PriceEntry;
use storefront_stock::StockOrigin;

/// One product as a page renders it: metadata, a warehouse stock figure,
/// and (when resolved against a price list) a price state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub metadata: ProductMetadata,
    pub stock: i64,
    pub stock_source: StockOrigin,
    /// `None` when the listing was not resolved against a price list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceEntry>,
}

/// A composed product listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductListing {
    pub products: Vec<ProductView>,
    /// True when the stock cache was empty and every figure was forced to
    /// zero. Visibly wrong-but-safe beats invisible inconsistency; the UI
    /// surfaces this as "availability temporarily unknown".
    pub degraded: bool,
}
