//! Read-only pass-throughs to the ledger API: customer documents and the
//! item detail. No business rules here — the upstream's JSON goes through
//! as-is, with pagination/status filters forwarded.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use storefront_core::ItemId;
use storefront_erp::types::ListFilter;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/items/:id", get(item_detail))
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(order_detail))
        .route("/invoices", get(list_invoices))
        .route("/invoices/:id", get(invoice_detail))
        .route("/payments", get(list_payments))
        .route("/creditnotes", get(list_credit_notes))
        .route("/catalog/invalidate", post(invalidate_catalog))
}

pub async fn item_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.erp.get_item(&ItemId::new(id)).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::erp_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<ListFilter>,
) -> axum::response::Response {
    match services.erp.list_sales_orders(&filter).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::erp_error_to_response(e),
    }
}

pub async fn order_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.erp.get_sales_order(&id).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::erp_error_to_response(e),
    }
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<ListFilter>,
) -> axum::response::Response {
    match services.erp.list_invoices(&filter).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::erp_error_to_response(e),
    }
}

pub async fn invoice_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.erp.get_invoice(&id).await {
        Ok(invoice) => Json(invoice).into_response(),
        Err(e) => errors::erp_error_to_response(e),
    }
}

pub async fn list_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<ListFilter>,
) -> axum::response::Response {
    match services.erp.list_payments(&filter).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::erp_error_to_response(e),
    }
}

pub async fn list_credit_notes(
    Extension(services): Extension<Arc<AppServices>>,
    Query(filter): Query<ListFilter>,
) -> axum::response::Response {
    match services.erp.list_credit_notes(&filter).await {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::erp_error_to_response(e),
    }
}

pub async fn invalidate_catalog(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let cleared = services.catalog.invalidate().await;
    Json(json!({ "cleared": cleared })).into_response()
}
