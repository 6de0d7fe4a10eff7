//! `storefront-core` — configuration and shared primitives.
//!
//! This crate contains the pieces every other crate needs: the environment
//! configuration (including the single warehouse identifier), the
//! configuration error type, and the string-typed identifiers used at the
//! upstream boundary.

pub mod config;
pub mod error;
pub mod id;

pub use config::{Config, Tunables};
pub use error::{ConfigError, ConfigResult};
pub use id::{ItemId, PriceListId};
