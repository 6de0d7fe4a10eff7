//! HTTP application wiring (Axum router + service wiring).
//!
//! Folder structure:
//! - `services.rs`: infrastructure wiring (KV store, ERP client, caches)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
