//! `storefront-pricing` — per-price-list item rate resolution.
//!
//! Customers see rates from their assigned price list, resolved in bounded
//! concurrent batches and cached per price-list id. Absence from the
//! resolved map is the authoritative "not in this price list" signal; the
//! UI renders it as "contact for price", never as a zero-currency amount.

pub mod cache;
pub mod source;
pub mod types;

pub use cache::PriceCache;
pub use source::PriceSource;
pub use types::{PriceEntry, PriceRate, RateMap};
