//! Black-box tests against a real served instance.
//!
//! These exercise only routes that never reach the upstream ERP (cache-only
//! reads), so they run offline against an in-memory key-value store.

use std::sync::Arc;

use storefront_api::app::{self, services};
use storefront_cache::MemoryStore;
use storefront_core::{Config, Tunables};

fn test_config() -> Config {
    Config {
        ledger_base_url: "http://127.0.0.1:1/ledger".to_string(),
        inventory_base_url: "http://127.0.0.1:1/inventory".to_string(),
        auth_url: "http://127.0.0.1:1/oauth/token".to_string(),
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        refresh_token: "test-refresh".to_string(),
        organization_id: "org-1".to_string(),
        warehouse_id: "warehouse-1".to_string(),
        kv_rest_url: "unused".to_string(),
        kv_rest_token: "unused".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        tunables: Tunables::default(),
    }
}

async fn serve() -> String {
    let services = Arc::new(services::build_services_with_store(
        test_config(),
        Arc::new(MemoryStore::new()),
    ));
    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_answers_ok() {
    let base = serve().await;
    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn stock_status_reports_an_empty_cache() {
    let base = serve().await;
    let response = reqwest::get(format!("{base}/stock/status")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["exists"], false);
    assert_eq!(body["item_count"], 0);
    assert_eq!(body["is_stale"], true);
}

#[tokio::test]
async fn single_item_without_fetch_is_unavailable() {
    let base = serve().await;
    let response = reqwest::get(format!("{base}/stock/items/sku-404?fetch=false"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["stock"], 0);
    assert_eq!(body["source"], "unavailable");
}

#[tokio::test]
async fn stock_invalidate_answers_cleared() {
    let base = serve().await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/stock/invalidate"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["cleared"], true);
}
