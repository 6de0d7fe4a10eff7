//! Tracing/logging initialization for the storefront service.

pub mod tracing_init;

pub use tracing_init::init;
