//! Price data model.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use storefront_core::ItemId;

/// A rate the upstream actually returned for an item in a price list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRate {
    pub rate: f64,
    pub currency: Option<String>,
}

/// Resolved rates for one price list. Only ids the upstream priced appear.
pub type RateMap = HashMap<ItemId, PriceRate>;

/// Price state as the composition layer hands it to the UI.
///
/// Invariant: `in_price_list == false` implies `rate == 0.0`, and the UI
/// must render "contact for price" for it — a numeric zero shown as a
/// price would read as "free".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    pub rate: f64,
    pub currency: Option<String>,
    pub in_price_list: bool,
}

impl PriceEntry {
    /// Entry for an id the resolved map does not contain.
    pub fn not_priced() -> Self {
        Self {
            rate: 0.0,
            currency: None,
            in_price_list: false,
        }
    }

    /// Derive the UI-facing entry from a rate-map lookup.
    pub fn from_lookup(found: Option<&PriceRate>) -> Self {
        match found {
            Some(rate) => Self {
                rate: rate.rate,
                currency: rate.currency.clone(),
                in_price_list: true,
            },
            None => Self::not_priced(),
        }
    }
}
