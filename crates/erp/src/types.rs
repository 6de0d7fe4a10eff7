//! Wire types for the ERP's two API surfaces.
//!
//! Field names follow the upstream payloads; `#[serde(default)]` keeps a
//! missing optional field from failing a whole page of items.

use serde::{Deserialize, Serialize};

use storefront_core::ItemId;

/// Pagination envelope returned by every listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PageContext {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub has_more_page: bool,
}

/// One item row from the ledger listing endpoint.
///
/// Deliberately carries no stock figure: the listing's aggregate stock is
/// not warehouse-scoped and must never be mistaken for availability.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSummary {
    pub item_id: ItemId,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// One page of the ledger item listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPage {
    #[serde(default)]
    pub items: Vec<ItemSummary>,
    #[serde(default)]
    pub page_context: Option<PageContext>,
}

impl ItemPage {
    pub fn has_more(&self) -> bool {
        self.page_context
            .as_ref()
            .is_some_and(|ctx| ctx.has_more_page)
    }
}

/// Item category from the ledger API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub category_id: String,
    pub name: String,
}

/// A single priced item inside a price list.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRate {
    pub item_id: ItemId,
    #[serde(rename = "pricebook_rate", default)]
    pub rate: f64,
    #[serde(rename = "currency_code", default)]
    pub currency: Option<String>,
}

/// Per-location stock row from the inventory API item detail.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationStock {
    pub location_id: String,
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub location_available_for_sale_stock: f64,
}

/// Inventory API item detail; the only payload that carries warehouse-level
/// breakdowns.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryItemDetail {
    pub item_id: ItemId,
    #[serde(default)]
    pub name: String,
    /// Aggregate across all locations. Kept for diagnostics only; callers
    /// answering "how many can we sell" must use the warehouse figure.
    #[serde(default)]
    pub available_for_sale_stock: f64,
    #[serde(default)]
    pub locations: Vec<LocationStock>,
}

/// Query filter for ledger listing pass-throughs (orders, invoices,
/// payments, credit notes).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub customer_id: Option<String>,
    pub sort_column: Option<String>,
}

/// Upstream cap on `per_page`.
pub const MAX_PER_PAGE: u32 = 200;

impl ListFilter {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        query.push(("page".to_string(), self.page.unwrap_or(1).to_string()));
        query.push((
            "per_page".to_string(),
            self.per_page.unwrap_or(25).min(MAX_PER_PAGE).to_string(),
        ));
        if let Some(status) = &self.status {
            query.push(("status".to_string(), status.clone()));
        }
        if let Some(customer_id) = &self.customer_id {
            query.push(("customer_id".to_string(), customer_id.clone()));
        }
        if let Some(sort_column) = &self.sort_column {
            query.push(("sort_column".to_string(), sort_column.clone()));
        }
        query
    }
}
