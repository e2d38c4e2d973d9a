//! Supabase REST client.
//!
//! Provides authenticated HTTP access to the project's PostgREST
//! endpoint: row selects, inserts (plain or idempotent upsert), and
//! partial updates. Higher layers never see `reqwest` types; every
//! failure is mapped to a [`GatewayError`] carrying a message that is
//! safe to surface in the terminal UI.

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::config::TerminalConfig;
use crate::error::GatewayError;

/// Default timeout for REST requests (20 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the Supabase project URL:
/// - strip trailing slashes
/// - strip a trailing `/rest/v1` segment
/// - ensure a scheme is present (https, or http for localhost)
pub fn normalize_supabase_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    // Ensure scheme
    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    // Strip trailing slashes
    while url.ends_with('/') {
        url.pop();
    }

    // Strip trailing /rest/v1
    if url.ends_with("/rest/v1") {
        url.truncate(url.len() - 8);
    }

    // Strip trailing slashes again (in case "/rest/v1/" was present)
    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach Supabase at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid Supabase URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Supabase API key is invalid or expired".to_string(),
        403 => "Request rejected by row-level security policy".to_string(),
        404 => "Supabase table or endpoint not found".to_string(),
        409 => "Row conflicts with an existing row".to_string(),
        s if s >= 500 => format!("Supabase server error (HTTP {s})"),
        s => format!("Unexpected response from Supabase (HTTP {s})"),
    }
}

/// Extract the PostgREST error message from an error body, falling back
/// to the generic status text. PostgREST bodies look like
/// `{ "message": ..., "code": ..., "details": ..., "hint": ... }`.
fn decode_error_body(status: StatusCode, body_text: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body_text) {
        let message = json
            .get("message")
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .unwrap_or_else(|| status_error(status));
        if let Some(details) = json.get("details").and_then(Value::as_str) {
            return format!("{message} (HTTP {}): {details}", status.as_u16());
        }
        return format!("{message} (HTTP {})", status.as_u16());
    }
    if !body_text.trim().is_empty() {
        format!(
            "{} (HTTP {}): {}",
            status_error(status),
            status.as_u16(),
            body_text.trim()
        )
    } else {
        format!("{} (HTTP {})", status_error(status), status.as_u16())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated client for the project's PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Build a client from the terminal configuration.
    pub fn new(config: &TerminalConfig) -> Result<Self, GatewayError> {
        if config.supabase_url.trim().is_empty() {
            return Err(GatewayError::NotConfigured("missing Supabase URL".into()));
        }
        if config.supabase_anon_key.trim().is_empty() {
            return Err(GatewayError::NotConfigured(
                "missing Supabase anon key".into(),
            ));
        }
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: normalize_supabase_url(&config.supabase_url),
            anon_key: config.supabase_anon_key.trim().to_string(),
        })
    }

    /// Base project URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    fn rest_url(&self, table: &str, query: &[(&str, String)]) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{table}", self.base_url))
            .map_err(|e| GatewayError::Transport(format!("Invalid Supabase URL: {e}")))?;
        {
            let mut qp = url.query_pairs_mut();
            for (k, v) in query {
                qp.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Select rows from `table`. `query` holds PostgREST query pairs,
    /// e.g. `("is_active", "eq.true")` or `("order", "display_order")`.
    pub async fn select(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, GatewayError> {
        let url = self.rest_url(table, query)?;
        let resp = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| GatewayError::Transport(friendly_error(&self.base_url, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Remote(decode_error_body(status, &body)));
        }

        match resp.json::<Value>().await {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(other) => {
                warn!(table, "select returned a non-array body, wrapping");
                Ok(vec![other])
            }
            Err(e) => Err(GatewayError::Decode(e.to_string())),
        }
    }

    /// Insert a single row into `table` and return the stored row.
    ///
    /// With `upsert` set, the insert is keyed by the row's primary key
    /// (`Prefer: resolution=merge-duplicates`), so re-sending the same
    /// row after a partial failure is safe.
    pub async fn insert(
        &self,
        table: &str,
        row: &Value,
        upsert: bool,
    ) -> Result<Value, GatewayError> {
        let url = self.rest_url(table, &[])?;
        let prefer = if upsert {
            "return=representation,resolution=merge-duplicates"
        } else {
            "return=representation"
        };
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Content-Type", "application/json")
            .header("Prefer", prefer)
            .json(&Value::Array(vec![row.clone()]))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(friendly_error(&self.base_url, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Remote(decode_error_body(status, &body)));
        }

        Self::first_row(resp.json::<Value>().await)
    }

    /// Apply a partial update to the row with `id` and return the
    /// stored row.
    pub async fn update(
        &self,
        table: &str,
        id: &str,
        patch: &Value,
    ) -> Result<Value, GatewayError> {
        let url = self.rest_url(table, &[("id", format!("eq.{id}"))])?;
        let resp = self
            .http
            .patch(url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(friendly_error(&self.base_url, &e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Remote(decode_error_body(status, &body)));
        }

        Self::first_row(resp.json::<Value>().await)
    }

    /// PostgREST returns representations as a one-element array.
    fn first_row(body: Result<Value, reqwest::Error>) -> Result<Value, GatewayError> {
        match body {
            Ok(Value::Array(mut rows)) if !rows.is_empty() => Ok(rows.remove(0)),
            Ok(Value::Array(_)) => Err(GatewayError::Decode(
                "representation array was empty".into(),
            )),
            Ok(other) => Ok(other),
            Err(e) => Err(GatewayError::Decode(e.to_string())),
        }
    }
}
