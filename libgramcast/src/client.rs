//! Graph API HTTP client
//!
//! A thin reqwest wrapper: every call goes to
//! `https://graph.facebook.com/<version>/<endpoint>` with the access token
//! and app id attached. GET uses query parameters, POST a form body, and
//! error statuses are decoded into the Graph error envelope.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;

use crate::api::GraphApi;
use crate::config::{ApiConfig, Config};
use crate::error::{ApiError, GraphErrorBody, Result};

/// Default Graph API host
pub const DEFAULT_HOST: &str = "https://graph.facebook.com";

/// Per-request timeout, matching the rest of the toolchain
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    token: SecretString,
}

impl GraphClient {
    /// Create a client for the given API settings and token
    pub fn new(api: &ApiConfig, token: SecretString) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        let host = api.base_url.as_deref().unwrap_or(DEFAULT_HOST);
        let base_url = format!("{}/{}", host.trim_end_matches('/'), api.version);

        Ok(Self {
            http,
            base_url,
            app_id: api.app_id.clone(),
            token,
        })
    }

    /// Create a client from a loaded configuration, resolving the token
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config.access_token()?;
        Self::new(&config.api, token)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn auth_params(&self) -> [(&'static str, String); 2] {
        [
            ("access_token", self.token.expose_secret().to_string()),
            ("app_id", self.app_id.clone()),
        ]
    }
}

/// Turn a status/body pair into a decoded value or a typed error.
///
/// The Graph API reports failures as an HTTP error status with a JSON
/// `{"error": {...}}` envelope; the envelope is still decoded so callers see
/// the real message instead of a bare status code.
fn interpret_response(status: StatusCode, body: &str) -> Result<Value> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if status.is_client_error() || status.is_server_error() {
        if let Some(envelope) = parsed.as_ref().and_then(|v| v.get("error")) {
            if let Ok(graph_err) = serde_json::from_value::<GraphErrorBody>(envelope.clone()) {
                if graph_err.is_auth_error() {
                    return Err(ApiError::Authentication(graph_err.to_string()).into());
                }
                return Err(ApiError::Graph(graph_err).into());
            }
        }
        return Err(ApiError::Network(format!("HTTP {}: {}", status.as_u16(), truncate(body))).into());
    }

    parsed.ok_or_else(|| ApiError::Decode(format!("non-JSON response: {}", truncate(body))).into())
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let response = self
            .http
            .get(self.url(endpoint))
            .query(&self.auth_params())
            .query(params)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        interpret_response(status, &body)
    }

    async fn post_form(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut form: Vec<(&str, String)> = self.auth_params().to_vec();
        form.extend(params.iter().map(|(k, v)| (*k, v.clone())));

        let response = self
            .http
            .post(self.url(endpoint))
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        interpret_response(status, &body)
    }
}
