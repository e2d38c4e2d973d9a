//! Terminal configuration.
//!
//! A terminal needs a Supabase project URL, an anon key, a storage
//! bucket name, and its branch/cashier identity. Resolution order:
//!
//! 1. explicit environment variables (`SIAM_POS_*`),
//! 2. a provisioning connection string (base64-encoded JSON payload,
//!    pasted once during terminal setup),
//! 3. the OS credential store ([`crate::storage`]).
//!
//! Missing branch/cashier/bucket values fall back to the fixed
//! single-branch defaults; the Supabase URL and key have no fallback
//! and are validated by [`crate::api::SupabaseClient::new`].

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::api::normalize_supabase_url;
use crate::storage;

pub const ENV_SUPABASE_URL: &str = "SIAM_POS_SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SIAM_POS_SUPABASE_ANON_KEY";
pub const ENV_STORAGE_BUCKET: &str = "SIAM_POS_STORAGE_BUCKET";
pub const ENV_BRANCH_ID: &str = "SIAM_POS_BRANCH_ID";
pub const ENV_CASHIER_ID: &str = "SIAM_POS_CASHIER_ID";
pub const ENV_CONNECTION_STRING: &str = "SIAM_POS_CONNECTION_STRING";

/// Single-branch defaults. Multi-branch/multi-cashier identity is out
/// of scope; these mirror the fixed identifiers the ordering screen
/// has always written.
const DEFAULT_BUCKET: &str = "POS";
const DEFAULT_BRANCH_ID: &str = "branch1";
const DEFAULT_CASHIER_ID: &str = "cashier1";

/// Resolved terminal configuration.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub storage_bucket: String,
    pub branch_id: String,
    pub cashier_id: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            storage_bucket: DEFAULT_BUCKET.to_string(),
            branch_id: DEFAULT_BRANCH_ID.to_string(),
            cashier_id: DEFAULT_CASHIER_ID.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Connection-string decoding
// ---------------------------------------------------------------------------

/// Decode a provisioning connection string. Accepts either raw JSON or
/// url-safe base64-encoded JSON, tolerating stray whitespace from
/// copy/paste.
fn decode_connection_string_payload(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<Value>(trimmed).ok();
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.starts_with('{') {
        return serde_json::from_str::<Value>(&compact).ok();
    }
    if compact.len() < 20 {
        return None;
    }

    let base64 = compact.replace('-', "+").replace('_', "/");
    let padded = format!(
        "{}{}",
        base64,
        "=".repeat((4usize.wrapping_sub(base64.len() % 4)) % 4)
    );
    let decoded = BASE64_STANDARD.decode(padded).ok()?;
    serde_json::from_slice::<Value>(&decoded).ok()
}

fn payload_field(payload: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = payload.get(*key).and_then(Value::as_str) {
            let s = s.trim();
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TerminalConfig {
    /// Resolve the terminal configuration from the environment, an
    /// optional connection string, and the OS credential store.
    ///
    /// Never fails: missing values come back empty (URL/key) or as the
    /// single-branch defaults, and the gateway constructor rejects an
    /// unusable configuration with a `NotConfigured` error.
    pub fn resolve() -> Self {
        let connection_payload = env_value(ENV_CONNECTION_STRING)
            .and_then(|raw| decode_connection_string_payload(&raw));

        let from_payload = |keys: &[&str]| {
            connection_payload
                .as_ref()
                .and_then(|p| payload_field(p, keys))
        };

        let supabase_url = env_value(ENV_SUPABASE_URL)
            .or_else(|| from_payload(&["url", "supabase_url"]))
            .or_else(|| storage::get_credential(storage::KEY_SUPABASE_URL))
            .map(|u| normalize_supabase_url(&u))
            .unwrap_or_default();

        let supabase_anon_key = env_value(ENV_SUPABASE_ANON_KEY)
            .or_else(|| from_payload(&["key", "anon_key"]))
            .or_else(|| storage::get_credential(storage::KEY_SUPABASE_ANON_KEY))
            .unwrap_or_default();

        let storage_bucket = env_value(ENV_STORAGE_BUCKET)
            .or_else(|| from_payload(&["bucket"]))
            .or_else(|| storage::get_credential(storage::KEY_STORAGE_BUCKET))
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());

        let branch_id = env_value(ENV_BRANCH_ID)
            .or_else(|| from_payload(&["branch", "branch_id"]))
            .or_else(|| storage::get_credential(storage::KEY_BRANCH_ID))
            .unwrap_or_else(|| DEFAULT_BRANCH_ID.to_string());

        let cashier_id = env_value(ENV_CASHIER_ID)
            .or_else(|| from_payload(&["cashier", "cashier_id"]))
            .or_else(|| storage::get_credential(storage::KEY_CASHIER_ID))
            .unwrap_or_else(|| DEFAULT_CASHIER_ID.to_string());

        Self {
            supabase_url,
            supabase_anon_key,
            storage_bucket,
            branch_id,
            cashier_id,
        }
    }

    /// Persist the resolved credentials to the OS keyring so the next
    /// start does not need environment variables.
    pub fn persist(&self) -> Result<(), String> {
        storage::set_credential(storage::KEY_SUPABASE_URL, &self.supabase_url)?;
        storage::set_credential(storage::KEY_SUPABASE_ANON_KEY, &self.supabase_anon_key)?;
        storage::set_credential(storage::KEY_STORAGE_BUCKET, &self.storage_bucket)?;
        storage::set_credential(storage::KEY_BRANCH_ID, &self.branch_id)?;
        storage::set_credential(storage::KEY_CASHIER_ID, &self.cashier_id)?;
        Ok(())
    }
}
