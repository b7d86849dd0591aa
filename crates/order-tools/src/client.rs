//! Upstream order API client (WooCommerce REST v3).
//!
//! [`OrderApi`] is the seam the resolver depends on; [`WooClient`] is the `reqwest`
//! implementation. Every call is a single bounded request: no retries happen here.

use crate::model::RawOrder;
use crate::safety::{redact_url, sanitize_reqwest_error, truncate_diagnostic};
use crate::tenants::TenantConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const API_PREFIX: &str = "/wp-json/wc/v3";
const USER_AGENT: &str = concat!("unrelated-order-tools/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout for upstream calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Non-2xx, non-404 upstream response.
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upstream request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("invalid upstream response: {0}")]
    Decode(String),
    #[error("invalid upstream url: {0}")]
    Url(String),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Read access to a tenant's orders.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Fetch one order by numeric id. `Ok(None)` when the upstream answers 404.
    async fn fetch_order(&self, tenant: &TenantConfig, id: u64) -> Result<Option<RawOrder>>;

    /// Free-text order search, at most `limit` results.
    async fn search_orders(
        &self,
        tenant: &TenantConfig,
        query: &str,
        limit: u32,
    ) -> Result<Vec<RawOrder>>;

    /// The `limit` most recent orders, newest first.
    async fn recent_orders(&self, tenant: &TenantConfig, limit: u32) -> Result<Vec<RawOrder>>;
}

/// How tenant credentials are attached to upstream requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpstreamAuth {
    /// `consumer_key` / `consumer_secret` query parameters.
    #[default]
    Query,
    /// HTTP basic auth (key as username, secret as password).
    Basic,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub auth: UpstreamAuth,
    /// Maximum response body size (bytes). `None` = unlimited.
    pub max_response_bytes: Option<usize>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            auth: UpstreamAuth::default(),
            max_response_bytes: Some(crate::safety::DEFAULT_MAX_RESPONSE_BYTES),
        }
    }
}

#[derive(Clone)]
pub struct WooClient {
    client: Client,
    settings: ClientSettings,
}

impl WooClient {
    /// Build a client with the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(sanitize_reqwest_error(&e)))?;
        Ok(Self { client, settings })
    }

    /// `GET <base>/wp-json/wc/v3<path>`; `Ok(None)` on 404.
    async fn get_json(
        &self,
        tenant: &TenantConfig,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<Value>> {
        let url = self.build_url(tenant, path, query)?;
        let redacted = redact_url(&url);

        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        if self.settings.auth == UpstreamAuth::Basic {
            request = request.basic_auth(&tenant.api_key, Some(&tenant.api_secret));
        }

        let response = request.send().await.map_err(|e| self.map_send_error(&e))?;
        let status = response.status();
        debug!(tenant = %tenant.id, url = %redacted, status = status.as_u16(), "upstream response");

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let bytes = read_response_body_limited_bytes(
            response,
            self.settings.max_response_bytes,
            self.settings.timeout,
        )
        .await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            warn!(tenant = %tenant.id, url = %redacted, status = status.as_u16(), "upstream error");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: truncate_diagnostic(&body),
            });
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| UpstreamError::Decode(format!("{redacted}: {e}")))
    }

    fn build_url(&self, tenant: &TenantConfig, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let base = tenant.base_url.trim_end_matches('/');
        let prefix = if base.ends_with(API_PREFIX) { "" } else { API_PREFIX };
        let mut url = Url::parse(&format!("{base}{prefix}{path}"))
            .map_err(|e| UpstreamError::Url(format!("tenant '{}': {e}", tenant.id)))?;

        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
            if self.settings.auth == UpstreamAuth::Query {
                pairs.append_pair("consumer_key", &tenant.api_key);
                pairs.append_pair("consumer_secret", &tenant.api_secret);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    fn map_send_error(&self, e: &reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout(self.settings.timeout)
        } else {
            UpstreamError::Transport(sanitize_reqwest_error(e))
        }
    }

    async fn get_list(
        &self,
        tenant: &TenantConfig,
        query: &[(&str, String)],
    ) -> Result<Vec<RawOrder>> {
        match self.get_json(tenant, "/orders", query).await? {
            Some(Value::Array(items)) => Ok(items
                .into_iter()
                .filter_map(|v| serde_json::from_value::<RawOrder>(v).ok())
                .collect()),
            Some(_) => {
                warn!(tenant = %tenant.id, "order list response is not an array");
                Ok(Vec::new())
            }
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl OrderApi for WooClient {
    async fn fetch_order(&self, tenant: &TenantConfig, id: u64) -> Result<Option<RawOrder>> {
        let Some(value) = self.get_json(tenant, &format!("/orders/{id}"), &[]).await? else {
            return Ok(None);
        };
        let order: RawOrder = serde_json::from_value(value)
            .map_err(|e| UpstreamError::Decode(format!("order {id}: {e}")))?;
        // Some hosts answer unknown ids with an empty object instead of 404.
        Ok(order.id.is_some().then_some(order))
    }

    async fn search_orders(
        &self,
        tenant: &TenantConfig,
        query: &str,
        limit: u32,
    ) -> Result<Vec<RawOrder>> {
        self.get_list(
            tenant,
            &[("search", query.to_string()), ("per_page", limit.to_string())],
        )
        .await
    }

    async fn recent_orders(&self, tenant: &TenantConfig, limit: u32) -> Result<Vec<RawOrder>> {
        self.get_list(
            tenant,
            &[
                ("orderby", "date".to_string()),
                ("order", "desc".to_string()),
                ("per_page", limit.to_string()),
            ],
        )
        .await
    }
}

async fn read_response_body_limited_bytes(
    mut response: reqwest::Response,
    max_bytes: Option<usize>,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let to_err = |e: reqwest::Error| {
        if e.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else {
            UpstreamError::Transport(sanitize_reqwest_error(&e))
        }
    };

    let Some(max) = max_bytes else {
        let bytes = response.bytes().await.map_err(to_err)?;
        return Ok(bytes.to_vec());
    };

    if let Some(len) = response.content_length()
        && len > max as u64
    {
        return Err(UpstreamError::Decode(format!(
            "response too large: {len} bytes (limit {max})"
        )));
    }

    let mut out: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(to_err)? {
        if out.len().saturating_add(chunk.len()) > max {
            return Err(UpstreamError::Decode(format!(
                "response too large: exceeded {max} bytes"
            )));
        }
        out.extend_from_slice(&chunk);
    }

    Ok(out)
}
