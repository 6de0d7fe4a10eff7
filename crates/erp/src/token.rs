//! OAuth token acquisition and caching.
//!
//! Lookup order: process-local memo → shared key-value cache → refresh
//! against the identity endpoint. The memo is a best-effort speed
//! optimization, never a correctness requirement; correctness always falls
//! back to the shared cache. Refreshes are debounced across instances with
//! a set-if-not-exists marker so a cold cache under concurrent load does
//! not storm the identity provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use storefront_cache::SharedCache;

use crate::error::{ErpError, ErpResult};

/// Shared-cache key holding the current token.
pub const TOKEN_CACHE_KEY: &str = "erp:oauth:token";

/// Shared-cache marker keeping concurrent refreshes apart.
pub const REFRESH_DEBOUNCE_KEY: &str = "erp:oauth:refresh-debounce";

/// Wait before the single retry when the identity endpoint throttles us.
const REFRESH_THROTTLE_WAIT: Duration = Duration::from_secs(10);

/// Wait for another instance's in-flight refresh before re-reading the
/// shared cache.
const DEBOUNCED_REREAD_WAIT: Duration = Duration::from_secs(2);

/// Substring the identity endpoint puts in throttled refresh responses.
const REFRESH_THROTTLE_MARKER: &str = "too many requests";

/// An access token with its absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Usable if it will not expire within `margin`.
    pub fn valid_for(&self, margin: Duration) -> bool {
        let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::zero());
        Utc::now() + margin < self.expires_at
    }
}

/// Raw identity-endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Seam over the identity endpoint, so tests can count refresh calls.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Perform one refresh-token grant.
    async fn exchange(&self) -> ErpResult<TokenResponse>;
}

/// Production exchanger speaking to the OAuth endpoint over HTTP.
///
/// On a 400 carrying the provider's throttle marker it waits 10 seconds and
/// retries exactly once before failing hard.
pub struct HttpTokenExchanger {
    http: reqwest::Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl HttpTokenExchanger {
    pub fn new(
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    async fn exchange_once(&self) -> ErpResult<Result<TokenResponse, String>> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];

        let response = self
            .http
            .post(&self.auth_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ErpError::Auth(format!("identity endpoint unreachable: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ErpError::Auth(format!("identity response unreadable: {e}")))?;

        if status.is_success() {
            let parsed: TokenResponse = serde_json::from_str(&body)
                .map_err(|e| ErpError::Auth(format!("identity response malformed: {e}")))?;
            return Ok(Ok(parsed));
        }

        // Throttled refreshes come back as 400 with a marker in the body.
        if status.as_u16() == 400 && body.to_lowercase().contains(REFRESH_THROTTLE_MARKER) {
            return Ok(Err(body));
        }

        Err(ErpError::Auth(format!(
            "token refresh rejected (status {status}): {body}"
        )))
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(&self) -> ErpResult<TokenResponse> {
        match self.exchange_once().await? {
            Ok(token) => Ok(token),
            Err(throttle_body) => {
                warn!(
                    wait_secs = REFRESH_THROTTLE_WAIT.as_secs(),
                    "identity endpoint throttled refresh, retrying once"
                );
                tokio::time::sleep(REFRESH_THROTTLE_WAIT).await;
                match self.exchange_once().await? {
                    Ok(token) => Ok(token),
                    Err(_) => Err(ErpError::Auth(format!(
                        "token refresh throttled twice: {throttle_body}"
                    ))),
                }
            }
        }
    }
}

/// Two-tier token cache with debounced refresh.
pub struct TokenProvider {
    memo: tokio::sync::Mutex<Option<OAuthToken>>,
    cache: SharedCache,
    exchanger: Arc<dyn TokenExchanger>,
    refresh_margin: Duration,
    refresh_debounce: Duration,
}

impl TokenProvider {
    pub fn new(
        cache: SharedCache,
        exchanger: Arc<dyn TokenExchanger>,
        refresh_margin: Duration,
        refresh_debounce: Duration,
    ) -> Self {
        Self {
            memo: tokio::sync::Mutex::new(None),
            cache,
            exchanger,
            refresh_margin,
            refresh_debounce,
        }
    }

    /// Return a token guaranteed valid for at least the refresh margin.
    ///
    /// Issues zero network calls when either tier already holds a valid
    /// token. In-process callers are serialized through the memo lock, so a
    /// burst of concurrent requests on a cold cache produces one refresh.
    pub async fn get_token(&self) -> ErpResult<String> {
        let mut memo = self.memo.lock().await;

        if let Some(token) = memo.as_ref() {
            if token.valid_for(self.refresh_margin) {
                return Ok(token.access_token.clone());
            }
        }

        if let Some(token) = self.cache.get_json::<OAuthToken>(TOKEN_CACHE_KEY).await {
            if token.valid_for(self.refresh_margin) {
                debug!("token restored from shared cache");
                let access = token.access_token.clone();
                *memo = Some(token);
                return Ok(access);
            }
        }

        // Cross-instance debounce: only one refresh per window.
        let acquired = self
            .cache
            .acquire_marker(
                REFRESH_DEBOUNCE_KEY,
                &Utc::now().timestamp().to_string(),
                self.refresh_debounce,
            )
            .await;

        if !acquired {
            // Someone else is refreshing; give them a moment and read back.
            tokio::time::sleep(DEBOUNCED_REREAD_WAIT).await;
            if let Some(token) = self.cache.get_json::<OAuthToken>(TOKEN_CACHE_KEY).await {
                if token.valid_for(self.refresh_margin) {
                    let access = token.access_token.clone();
                    *memo = Some(token);
                    return Ok(access);
                }
            }
            return Err(ErpError::rate_limited(
                "token refresh debounced and no shared token appeared",
            ));
        }

        let response = self.exchanger.exchange().await?;
        let token = OAuthToken {
            access_token: response.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(response.expires_in as i64),
        };
        info!(expires_in = response.expires_in, "obtained fresh token");

        // Shared copy expires slightly before the token itself so no
        // instance ever reads back a nearly-dead token.
        let cache_ttl = Duration::from_secs(response.expires_in.saturating_sub(
            self.refresh_margin.as_secs(),
        ))
        .max(Duration::from_secs(60));
        self.cache.set_json(TOKEN_CACHE_KEY, &token, cache_ttl).await;

        let access = token.access_token.clone();
        *memo = Some(token);
        Ok(access)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use storefront_cache::{MemoryStore, SharedCache};

    use super::*;

    struct CountingExchanger {
        calls: AtomicU32,
        expires_in: u64,
    }

    impl CountingExchanger {
        fn new(expires_in: u64) -> Self {
            Self {
                calls: AtomicU32::new(0),
                expires_in,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenExchanger for CountingExchanger {
        async fn exchange(&self) -> ErpResult<TokenResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(TokenResponse {
                access_token: format!("token-{n}"),
                expires_in: self.expires_in,
            })
        }
    }

    fn provider(exchanger: Arc<CountingExchanger>, cache: SharedCache) -> TokenProvider {
        TokenProvider::new(
            cache,
            exchanger,
            Duration::from_secs(300),
            Duration::from_secs(15),
        )
    }

    #[tokio::test]
    async fn cold_start_refreshes_once_then_reuses_memo() {
        let exchanger = Arc::new(CountingExchanger::new(3600));
        let cache = SharedCache::new(Arc::new(MemoryStore::new()));
        let p = provider(exchanger.clone(), cache);

        assert_eq!(p.get_token().await.unwrap(), "token-1");
        assert_eq!(p.get_token().await.unwrap(), "token-1");
        assert_eq!(p.get_token().await.unwrap(), "token-1");
        assert_eq!(exchanger.calls(), 1);
    }

    #[tokio::test]
    async fn valid_shared_token_means_zero_exchanges() {
        let store = Arc::new(MemoryStore::new());
        let cache = SharedCache::new(store);
        cache
            .set_json(
                TOKEN_CACHE_KEY,
                &OAuthToken {
                    access_token: "shared-token".into(),
                    expires_at: Utc::now() + chrono::Duration::hours(1),
                },
                Duration::from_secs(3000),
            )
            .await;

        let exchanger = Arc::new(CountingExchanger::new(3600));
        let p = provider(exchanger.clone(), cache);

        assert_eq!(p.get_token().await.unwrap(), "shared-token");
        assert_eq!(exchanger.calls(), 0);
    }

    #[tokio::test]
    async fn nearly_expired_shared_token_is_refreshed() {
        let store = Arc::new(MemoryStore::new());
        let cache = SharedCache::new(store);
        // Expires inside the 5-minute margin, so it must not be used.
        cache
            .set_json(
                TOKEN_CACHE_KEY,
                &OAuthToken {
                    access_token: "dying-token".into(),
                    expires_at: Utc::now() + chrono::Duration::seconds(60),
                },
                Duration::from_secs(60),
            )
            .await;

        let exchanger = Arc::new(CountingExchanger::new(3600));
        let p = provider(exchanger.clone(), cache);

        assert_eq!(p.get_token().await.unwrap(), "token-1");
        assert_eq!(exchanger.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_refresh_reuses_other_instances_token() {
        let store = Arc::new(MemoryStore::new());
        let cache = SharedCache::new(store);
        // Another instance already holds the debounce marker and will write
        // a token while we wait.
        cache
            .acquire_marker(REFRESH_DEBOUNCE_KEY, "peer", Duration::from_secs(15))
            .await;

        let exchanger = Arc::new(CountingExchanger::new(3600));
        let p = provider(exchanger.clone(), cache.clone());

        let writer_cache = cache.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            writer_cache
                .set_json(
                    TOKEN_CACHE_KEY,
                    &OAuthToken {
                        access_token: "peer-token".into(),
                        expires_at: Utc::now() + chrono::Duration::hours(1),
                    },
                    Duration::from_secs(3000),
                )
                .await;
        });

        assert_eq!(p.get_token().await.unwrap(), "peer-token");
        assert_eq!(exchanger.calls(), 0);
    }
}
