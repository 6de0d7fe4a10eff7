//! Storefront-facing composed views.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use storefront_core::PriceListId;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/products", get(all_products))
        .route("/price-lists/:id/products", get(products_with_prices))
        .route("/price-lists/:id/invalidate", post(invalidate_price_list))
        .route("/categories", get(categories))
}

/// Full catalog with warehouse stock. Degraded states come back as normal
/// 200 payloads — the caches already made them safe.
pub async fn all_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let listing = services.shop.all_products_complete().await;
    Json(listing).into_response()
}

pub async fn products_with_prices(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let price_list_id = PriceListId::new(id);
    let listing = services.shop.products_with_prices(&price_list_id).await;
    Json(listing).into_response()
}

pub async fn invalidate_price_list(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let price_list_id = PriceListId::new(id);
    let cleared = services.shop.invalidate_price_list(&price_list_id).await;
    Json(json!({ "cleared": cleared })).into_response()
}

pub async fn categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.erp.list_categories().await {
        Ok(categories) => Json(json!({ "categories": categories })).into_response(),
        Err(e) => errors::erp_error_to_response(e),
    }
}
