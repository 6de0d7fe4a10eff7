//! Environment-driven service configuration.
//!
//! All credentials and endpoints come from the environment, read once at
//! startup. The warehouse identifier is deliberately a single configuration
//! value: stock figures are scoped to the one fulfillment warehouse, and a
//! hardcoded literal repeated across modules is how the figures drift.

use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Default TTL for the warehouse stock map (30 minutes).
pub const DEFAULT_STOCK_TTL_SECS: u64 = 1800;

/// Default TTL for the full-sync mutual-exclusion marker (10 minutes).
pub const DEFAULT_SYNC_LOCK_TTL_SECS: u64 = 600;

/// Default TTL for the product catalog and per-price-list rate maps (24 hours).
pub const DEFAULT_CATALOG_TTL_SECS: u64 = 86_400;
pub const DEFAULT_PRICE_TTL_SECS: u64 = 86_400;

/// Refresh the OAuth token this many seconds before it actually expires.
pub const DEFAULT_TOKEN_REFRESH_MARGIN_SECS: u64 = 300;

/// Minimum interval between token refresh attempts across all instances.
pub const DEFAULT_TOKEN_REFRESH_DEBOUNCE_SECS: u64 = 15;

/// Requests allowed per sliding minute before the governor blocks callers.
pub const DEFAULT_GOVERNOR_MAX_PER_MINUTE: u32 = 90;

/// Retry ceiling and first backoff step for upstream rate-limit responses.
/// The schedule doubles per attempt: 2s, 4s, 8s.
pub const DEFAULT_RATE_LIMIT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RATE_LIMIT_BASE_BACKOFF_SECS: u64 = 2;

/// Full-sync fan-out: items fetched per parallel batch, delay between batches.
pub const DEFAULT_SYNC_BATCH_SIZE: usize = 10;
pub const DEFAULT_SYNC_INTER_BATCH_DELAY_MS: u64 = 1000;

/// Price resolution: ids per pricing call, pricing calls in flight at once.
pub const DEFAULT_PRICE_BATCH_SIZE: usize = 100;
pub const DEFAULT_PRICE_BATCH_CONCURRENCY: usize = 3;

/// Catalog pagination: page size and the hard ceiling that guarantees the
/// fetch loop terminates even if upstream pagination misbehaves.
pub const DEFAULT_CATALOG_PAGE_SIZE: usize = 200;
pub const DEFAULT_CATALOG_MAX_PAGES: usize = 50;

/// Interval between scheduled full syncs (0 disables the worker).
pub const DEFAULT_SYNC_WORKER_INTERVAL_SECS: u64 = 1800;

/// Service configuration, loaded once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the high-rate-limit ledger API.
    pub ledger_base_url: String,
    /// Base URL of the low-rate-limit inventory API (warehouse breakdowns).
    pub inventory_base_url: String,
    /// OAuth token endpoint.
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Organization scope sent with every upstream call.
    pub organization_id: String,
    /// The one fulfillment warehouse whose stock figures are authoritative.
    pub warehouse_id: String,
    /// Shared key-value store REST endpoint + bearer token.
    pub kv_rest_url: String,
    pub kv_rest_token: String,
    /// HTTP bind address for the served API.
    pub bind_addr: String,
    pub tunables: Tunables,
}

/// Operational knobs, all overridable via environment variables of the same
/// (upper-cased) name.
#[derive(Debug, Clone)]
pub struct Tunables {
    pub stock_ttl_secs: u64,
    pub sync_lock_ttl_secs: u64,
    pub catalog_ttl_secs: u64,
    pub price_ttl_secs: u64,
    pub token_refresh_margin_secs: u64,
    pub token_refresh_debounce_secs: u64,
    pub governor_max_per_minute: u32,
    pub rate_limit_max_retries: u32,
    pub rate_limit_base_backoff_secs: u64,
    pub sync_batch_size: usize,
    pub sync_inter_batch_delay_ms: u64,
    pub price_batch_size: usize,
    pub price_batch_concurrency: usize,
    pub catalog_page_size: usize,
    pub catalog_max_pages: usize,
    pub sync_worker_interval_secs: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            stock_ttl_secs: DEFAULT_STOCK_TTL_SECS,
            sync_lock_ttl_secs: DEFAULT_SYNC_LOCK_TTL_SECS,
            catalog_ttl_secs: DEFAULT_CATALOG_TTL_SECS,
            price_ttl_secs: DEFAULT_PRICE_TTL_SECS,
            token_refresh_margin_secs: DEFAULT_TOKEN_REFRESH_MARGIN_SECS,
            token_refresh_debounce_secs: DEFAULT_TOKEN_REFRESH_DEBOUNCE_SECS,
            governor_max_per_minute: DEFAULT_GOVERNOR_MAX_PER_MINUTE,
            rate_limit_max_retries: DEFAULT_RATE_LIMIT_MAX_RETRIES,
            rate_limit_base_backoff_secs: DEFAULT_RATE_LIMIT_BASE_BACKOFF_SECS,
            sync_batch_size: DEFAULT_SYNC_BATCH_SIZE,
            sync_inter_batch_delay_ms: DEFAULT_SYNC_INTER_BATCH_DELAY_MS,
            price_batch_size: DEFAULT_PRICE_BATCH_SIZE,
            price_batch_concurrency: DEFAULT_PRICE_BATCH_CONCURRENCY,
            catalog_page_size: DEFAULT_CATALOG_PAGE_SIZE,
            catalog_max_pages: DEFAULT_CATALOG_MAX_PAGES,
            sync_worker_interval_secs: DEFAULT_SYNC_WORKER_INTERVAL_SECS,
        }
    }
}

impl Tunables {
    pub fn stock_ttl(&self) -> Duration {
        Duration::from_secs(self.stock_ttl_secs)
    }

    pub fn sync_lock_ttl(&self) -> Duration {
        Duration::from_secs(self.sync_lock_ttl_secs)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price_ttl_secs)
    }

    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.sync_inter_batch_delay_ms)
    }

    pub fn rate_limit_base_backoff(&self) -> Duration {
        Duration::from_secs(self.rate_limit_base_backoff_secs)
    }

    /// Read overrides from the environment, falling back to defaults.
    pub fn from_env() -> ConfigResult<Self> {
        let mut t = Self::default();
        override_parsed("STOCK_TTL_SECS", &mut t.stock_ttl_secs)?;
        override_parsed("SYNC_LOCK_TTL_SECS", &mut t.sync_lock_ttl_secs)?;
        override_parsed("CATALOG_TTL_SECS", &mut t.catalog_ttl_secs)?;
        override_parsed("PRICE_TTL_SECS", &mut t.price_ttl_secs)?;
        override_parsed("TOKEN_REFRESH_MARGIN_SECS", &mut t.token_refresh_margin_secs)?;
        override_parsed(
            "TOKEN_REFRESH_DEBOUNCE_SECS",
            &mut t.token_refresh_debounce_secs,
        )?;
        override_parsed("GOVERNOR_MAX_PER_MINUTE", &mut t.governor_max_per_minute)?;
        override_parsed("RATE_LIMIT_MAX_RETRIES", &mut t.rate_limit_max_retries)?;
        override_parsed(
            "RATE_LIMIT_BASE_BACKOFF_SECS",
            &mut t.rate_limit_base_backoff_secs,
        )?;
        override_parsed("SYNC_BATCH_SIZE", &mut t.sync_batch_size)?;
        override_parsed("SYNC_INTER_BATCH_DELAY_MS", &mut t.sync_inter_batch_delay_ms)?;
        override_parsed("PRICE_BATCH_SIZE", &mut t.price_batch_size)?;
        override_parsed("PRICE_BATCH_CONCURRENCY", &mut t.price_batch_concurrency)?;
        override_parsed("CATALOG_PAGE_SIZE", &mut t.catalog_page_size)?;
        override_parsed("CATALOG_MAX_PAGES", &mut t.catalog_max_pages)?;
        override_parsed("SYNC_WORKER_INTERVAL_SECS", &mut t.sync_worker_interval_secs)?;
        Ok(t)
    }
}

impl Config {
    /// Load the full configuration from the environment.
    ///
    /// Missing credentials fail loudly here; every other failure mode in the
    /// system degrades instead.
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            ledger_base_url: required("ERP_LEDGER_BASE_URL")?,
            inventory_base_url: required("ERP_INVENTORY_BASE_URL")?,
            auth_url: required("ERP_AUTH_URL")?,
            client_id: required("ERP_CLIENT_ID")?,
            client_secret: required("ERP_CLIENT_SECRET")?,
            refresh_token: required("ERP_REFRESH_TOKEN")?,
            organization_id: required("ERP_ORGANIZATION_ID")?,
            warehouse_id: required("WAREHOUSE_ID")?,
            kv_rest_url: required("KV_REST_URL")?,
            kv_rest_token: required("KV_REST_TOKEN")?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            tunables: Tunables::from_env()?,
        })
    }
}

fn required(var: &'static str) -> ConfigResult<String> {
    let value = std::env::var(var).map_err(|_| ConfigError::missing(var))?;
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(var, "value is blank"));
    }
    Ok(value)
}

fn override_parsed<T: std::str::FromStr>(var: &'static str, slot: &mut T) -> ConfigResult<()> {
    if let Ok(raw) = std::env::var(var) {
        *slot = raw
            .parse()
            .map_err(|_| ConfigError::invalid(var, format!("cannot parse {raw:?}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let t = Tunables::default();
        assert_eq!(t.stock_ttl(), Duration::from_secs(1800));
        assert_eq!(t.sync_lock_ttl(), Duration::from_secs(600));
        assert_eq!(t.price_batch_size, 100);
        assert_eq!(t.price_batch_concurrency, 3);
    }

    #[test]
    fn required_rejects_blank_values() {
        // Uses a var name no other test touches to stay order-independent.
        unsafe { std::env::set_var("STOREFRONT_TEST_BLANK", "   ") };
        let err = required("STOREFRONT_TEST_BLANK").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        unsafe { std::env::remove_var("STOREFRONT_TEST_BLANK") };
    }
}
