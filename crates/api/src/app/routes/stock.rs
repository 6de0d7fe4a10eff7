//! Stock cache operations: lookups, syncs, invalidation.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use storefront_core::ItemId;
use storefront_stock::FullSyncOptions;

use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/items/:id", get(single_item))
        .route("/sync", post(full_sync))
        .route("/quick-sync", post(quick_sync))
        .route("/invalidate", post(invalidate))
}

pub async fn status(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    Json(services.stock.status().await).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SingleItemQuery {
    /// Spend inventory-API budget on a miss. Defaults to off: reads are
    /// supposed to be cheap unless the caller opts in.
    #[serde(default)]
    pub fetch: bool,
}

pub async fn single_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<SingleItemQuery>,
) -> axum::response::Response {
    let item_id = ItemId::new(id);
    let answer = services.stock.get_single(&item_id, query.fetch).await;
    Json(answer).into_response()
}

/// Trigger a full sync. The report's `next_offset` supports chunked
/// orchestration: pass it back as `offset` in the next call.
pub async fn full_sync(
    Extension(services): Extension<Arc<AppServices>>,
    options: Option<Json<FullSyncOptions>>,
) -> axum::response::Response {
    let options = options.map(|Json(o)| o).unwrap_or_default();
    let report = services.stock.full_sync(options).await;
    Json(report).into_response()
}

#[derive(Debug, Deserialize)]
pub struct QuickSyncRequest {
    pub item_ids: Vec<String>,
}

pub async fn quick_sync(
    Extension(services): Extension<Arc<AppServices>>,
    Json(request): Json<QuickSyncRequest>,
) -> axum::response::Response {
    let ids: Vec<ItemId> = request.item_ids.into_iter().map(ItemId::new).collect();
    let report = services.stock.quick_sync(&ids).await;
    Json(report).into_response()
}

pub async fn invalidate(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let cleared = services.stock.invalidate().await;
    Json(json!({ "cleared": cleared })).into_response()
}
