//! Route modules, one per domain area.

use axum::Router;

pub mod ledger;
pub mod shop;
pub mod stock;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .nest("/shop", shop::router())
        .nest("/stock", stock::router())
        .merge(ledger::router())
}
