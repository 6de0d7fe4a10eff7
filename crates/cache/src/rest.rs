//! REST-backed implementation of [`KeyValueStore`].
//!
//! Speaks the shared store's HTTP protocol:
//! - `GET {base}/get/{key}` → `{"result": <value|null>}`
//! - `POST {base}/setex/{key}/{ttl}` with the value as request body
//! - `POST {base}` with `["SET", key, value, "NX", "EX", ttl]`
//! - `POST {base}/del/{key}`
//!
//! Every response carries a JSON envelope with a `result` field.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::store::{KeyValueStore, KvError};

/// Response envelope used by every store endpoint.
#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    result: Option<serde_json::Value>,
}

/// Client for the shared store's REST interface.
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    async fn read_envelope(&self, response: reqwest::Response) -> Result<ResultEnvelope, KvError> {
        let status = response.status();
        if !status.is_success() {
            return Err(KvError::Transport(format!("store returned {status}")));
        }
        response
            .json::<ResultEnvelope>()
            .await
            .map_err(|e| KvError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for RestStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let url = format!("{}/get/{key}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| KvError::Transport(e.to_string()))?;

        let envelope = self.read_envelope(response).await?;
        match envelope.result {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(KvError::Protocol(format!(
                "expected string result, got {other}"
            ))),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        let url = format!("{}/setex/{key}/{}", self.base_url, ttl.as_secs());
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .body(value.to_string())
            .send()
            .await
            .map_err(|e| KvError::Transport(e.to_string()))?;

        self.read_envelope(response).await?;
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, KvError> {
        // No dedicated path for SET..NX..EX; it goes through the raw
        // command endpoint at the base URL.
        let command = json!(["SET", key, value, "NX", "EX", ttl.as_secs().to_string()]);
        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await
            .map_err(|e| KvError::Transport(e.to_string()))?;

        let envelope = self.read_envelope(response).await?;
        // "OK" when the key was created, null when it already existed.
        Ok(!matches!(
            envelope.result,
            None | Some(serde_json::Value::Null)
        ))
    }

    async fn del(&self, key: &str) -> Result<(), KvError> {
        let url = format!("{}/del/{key}", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| KvError::Transport(e.to_string()))?;

        self.read_envelope(response).await?;
        Ok(())
    }
}
