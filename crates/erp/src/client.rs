//! HTTP client for the ledger and inventory API surfaces.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use storefront_cache::SharedCache;
use storefront_core::{Config, ItemId, PriceListId};

use crate::error::{ErpError, ErpResult};
use crate::governor::RequestGovernor;
use crate::retry::{self, RetryPolicy};
use crate::token::{HttpTokenExchanger, TokenProvider};
use crate::types::{
    Category, InventoryItemDetail, ItemPage, ItemRate, ListFilter, MAX_PER_PAGE,
};

/// Error code the provider embeds in a 200 envelope when throttling.
const PROVIDER_THROTTLE_CODE: i64 = 4;

/// Provider code meaning "success" inside a 200 envelope.
const PROVIDER_OK_CODE: i64 = 0;

/// Cap on error-body text carried into error values and logs.
const ERROR_BODY_LIMIT: usize = 300;

/// Client for the backing ERP.
///
/// Every call goes through the request governor and the rate-limit retry
/// policy; the token provider supplies a valid token per request. Cloning
/// is cheap and shares the governor and token state.
#[derive(Clone)]
pub struct ErpClient {
    http: reqwest::Client,
    config: Arc<Config>,
    tokens: Arc<TokenProvider>,
    governor: Arc<RequestGovernor>,
    retry: RetryPolicy,
}

impl ErpClient {
    pub fn new(config: Arc<Config>, cache: SharedCache) -> Self {
        let t = &config.tunables;
        let exchanger = Arc::new(HttpTokenExchanger::new(
            &config.auth_url,
            &config.client_id,
            &config.client_secret,
            &config.refresh_token,
        ));
        Self {
            http: reqwest::Client::new(),
            tokens: Arc::new(TokenProvider::new(
                cache,
                exchanger,
                Duration::from_secs(t.token_refresh_margin_secs),
                Duration::from_secs(t.token_refresh_debounce_secs),
            )),
            governor: Arc::new(RequestGovernor::new(t.governor_max_per_minute)),
            retry: RetryPolicy::new(t.rate_limit_max_retries, t.rate_limit_base_backoff()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// GET against the ledger API.
    async fn ledger_get(&self, path: &str, query: &[(String, String)]) -> ErpResult<Value> {
        let base = self.config.ledger_base_url.clone();
        retry::with_rate_limit_retry(&self.retry, || self.dispatch_once(&base, path, query)).await
    }

    /// GET against the inventory API.
    async fn inventory_get(&self, path: &str, query: &[(String, String)]) -> ErpResult<Value> {
        let base = self.config.inventory_base_url.clone();
        retry::with_rate_limit_retry(&self.retry, || self.dispatch_once(&base, path, query)).await
    }

    /// One governed, authenticated request with response classification.
    async fn dispatch_once(
        &self,
        base: &str,
        path: &str,
        query: &[(String, String)],
    ) -> ErpResult<Value> {
        self.governor.acquire().await;
        let token = self.tokens.get_token().await?;

        let url = format!("{}{path}", base.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[("organization_id", self.config.organization_id.as_str())])
            .query(query)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ErpError::upstream(0, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ErpError::upstream(status.as_u16(), format!("body unreadable: {e}")))?;

        if status.as_u16() == 429 {
            return Err(ErpError::rate_limited(format!("HTTP 429 from {path}")));
        }
        if !status.is_success() {
            return Err(ErpError::upstream(status.as_u16(), truncate(&body)));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ErpError::upstream(status.as_u16(), format!("unparseable body: {e}")))?;

        // The provider also signals errors inside a 200 envelope.
        if let Some(code) = value.get("code").and_then(Value::as_i64) {
            if code == PROVIDER_THROTTLE_CODE {
                return Err(ErpError::rate_limited(format!(
                    "provider throttle code on {path}"
                )));
            }
            if code != PROVIDER_OK_CODE {
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("no message");
                return Err(ErpError::upstream(
                    status.as_u16(),
                    format!("provider code {code}: {message}"),
                ));
            }
        }

        Ok(value)
    }

    // ---- ledger API: items, categories, price lists ----

    /// One page of the item listing, optionally filtered by status.
    pub async fn list_items(
        &self,
        page: usize,
        per_page: usize,
        status: Option<&str>,
    ) -> ErpResult<ItemPage> {
        let mut query = vec![
            ("page".to_string(), page.to_string()),
            (
                "per_page".to_string(),
                per_page.min(MAX_PER_PAGE as usize).to_string(),
            ),
            ("sort_column".to_string(), "name".to_string()),
        ];
        if let Some(status) = status {
            query.push(("filter_by".to_string(), format!("Status.{status}")));
        }
        let value = self.ledger_get("/items", &query).await?;
        decode_envelope(value)
    }

    /// Full item document from the ledger API.
    pub async fn get_item(&self, item_id: &ItemId) -> ErpResult<Value> {
        let value = self
            .ledger_get(&format!("/items/{item_id}"), &[])
            .await?;
        extract_field(value, "item")
    }

    pub async fn list_categories(&self) -> ErpResult<Vec<Category>> {
        let value = self.ledger_get("/categories", &[]).await?;
        decode_field(value, "categories")
    }

    /// Price-list document (header, currency, pricing scheme).
    pub async fn get_price_list(&self, price_list_id: &PriceListId) -> ErpResult<Value> {
        let value = self
            .ledger_get(&format!("/pricebooks/{price_list_id}"), &[])
            .await?;
        extract_field(value, "pricebook")
    }

    /// Rates for the given items within one price list. Items absent from
    /// the response are not in the list; callers must not invent a rate.
    pub async fn price_list_rates(
        &self,
        price_list_id: &PriceListId,
        item_ids: &[ItemId],
    ) -> ErpResult<Vec<ItemRate>> {
        let joined = item_ids
            .iter()
            .map(ItemId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let query = vec![("item_ids".to_string(), joined)];
        let value = self
            .ledger_get(&format!("/pricebooks/{price_list_id}/items"), &query)
            .await?;
        decode_field(value, "pricebook_items")
    }

    // ---- ledger API: customer documents (read-only pass-through) ----

    pub async fn list_sales_orders(&self, filter: &ListFilter) -> ErpResult<Value> {
        self.ledger_get("/salesorders", &filter.to_query()).await
    }

    pub async fn get_sales_order(&self, id: &str) -> ErpResult<Value> {
        let value = self.ledger_get(&format!("/salesorders/{id}"), &[]).await?;
        extract_field(value, "salesorder")
    }

    pub async fn list_invoices(&self, filter: &ListFilter) -> ErpResult<Value> {
        self.ledger_get("/invoices", &filter.to_query()).await
    }

    pub async fn get_invoice(&self, id: &str) -> ErpResult<Value> {
        let value = self.ledger_get(&format!("/invoices/{id}"), &[]).await?;
        extract_field(value, "invoice")
    }

    pub async fn list_payments(&self, filter: &ListFilter) -> ErpResult<Value> {
        self.ledger_get("/customerpayments", &filter.to_query()).await
    }

    pub async fn list_credit_notes(&self, filter: &ListFilter) -> ErpResult<Value> {
        self.ledger_get("/creditnotes", &filter.to_query()).await
    }

    // ---- inventory API: warehouse stock (low rate limit) ----

    /// Item detail with per-location stock breakdown.
    pub async fn get_item_with_locations(
        &self,
        item_id: &ItemId,
    ) -> ErpResult<InventoryItemDetail> {
        let value = self
            .inventory_get(&format!("/items/{item_id}"), &[])
            .await?;
        decode_field(value, "item")
    }

    /// Available-for-sale stock at the configured warehouse.
    ///
    /// Returns `None` when the payload does not carry the configured
    /// warehouse; never substitutes the aggregate figure or another
    /// location's count.
    pub async fn warehouse_stock(&self, item_id: &ItemId) -> ErpResult<Option<i64>> {
        let detail = self.get_item_with_locations(item_id).await?;
        let warehouse_id = &self.config.warehouse_id;

        match detail
            .locations
            .iter()
            .find(|l| &l.location_id == warehouse_id)
        {
            Some(location) => Ok(Some(location.location_available_for_sale_stock.round() as i64)),
            None => {
                warn!(
                    item_id = %item_id,
                    warehouse_id = %warehouse_id,
                    locations = detail.locations.len(),
                    "configured warehouse absent from item locations"
                );
                Ok(None)
            }
        }
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

/// Deserialize the whole envelope into a typed page/list shape.
fn decode_envelope<T: DeserializeOwned>(value: Value) -> ErpResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ErpError::upstream(200, format!("malformed envelope: {e}")))
}

/// Deserialize one named field of the envelope.
fn decode_field<T: DeserializeOwned>(value: Value, field: &'static str) -> ErpResult<T> {
    let inner = extract_field(value, field)?;
    serde_json::from_value(inner)
        .map_err(|e| ErpError::upstream(200, format!("malformed {field} field: {e}")))
}

/// Pull one named field out of the envelope as raw JSON.
fn extract_field(mut value: Value, field: &'static str) -> ErpResult<Value> {
    match value.get_mut(field) {
        Some(inner) => Ok(inner.take()),
        None => Err(ErpError::upstream(
            200,
            format!("response missing {field:?} field"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_field_pulls_the_named_payload() {
        let value: Value = serde_json::from_str(
            r#"{"code":0,"message":"success","categories":[{"category_id":"c1","name":"Tools"}]}"#,
        )
        .unwrap();
        let categories: Vec<Category> = decode_field(value, "categories").unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Tools");
    }

    #[test]
    fn missing_field_is_an_upstream_error() {
        let value: Value = serde_json::from_str(r#"{"code":0}"#).unwrap();
        let err = extract_field(value, "item").unwrap_err();
        assert!(matches!(err, ErpError::Upstream { .. }));
    }

    #[test]
    fn truncate_bounds_error_bodies() {
        let long = "x".repeat(1000);
        assert!(truncate(&long).len() < 320);
        assert_eq!(truncate("short"), "short");
    }
}
