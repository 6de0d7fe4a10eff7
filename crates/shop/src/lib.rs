//! `storefront-shop` — composition layer.
//!
//! Merges the three caches (catalog, stock, prices) into the view model the
//! storefront consumes, and owns the precedence rules between cache, API
//! fallback, and explicit "unavailable"/"not priced" states.

pub mod shop;
pub mod view;

pub use shop::Shop;
pub use view::{ProductListing, ProductView};
