//! `storefront-catalog` — product metadata cache.
//!
//! A 24-hour cache of the catalog (names, SKUs, categories). Metadata
//! deliberately carries no stock figure: stock always resolves through the
//! reconciliation cache, so a long-lived metadata entry can never bake in a
//! stale count, and list and detail views cannot drift apart.

pub mod cache;
pub mod source;
pub mod types;

pub use cache::{CATALOG_KEY, CatalogCache, CatalogError};
pub use source::CatalogSource;
pub use types::ProductMetadata;
