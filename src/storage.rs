//! Secure terminal config storage using the OS credential store.
//!
//! On Windows this uses DPAPI (via the `keyring` crate), on macOS
//! Keychain, and on Linux the Secret Service API. Terminals keep their
//! Supabase credentials here so they never land in flat config files.

use keyring::Entry;
use tracing::warn;

const SERVICE_NAME: &str = "siam-pos";

// Credential keys
pub const KEY_SUPABASE_URL: &str = "supabase_url";
pub const KEY_SUPABASE_ANON_KEY: &str = "supabase_anon_key";
pub const KEY_STORAGE_BUCKET: &str = "storage_bucket";
pub const KEY_BRANCH_ID: &str = "branch_id";
pub const KEY_CASHIER_ID: &str = "cashier_id";

/// All credential keys managed by this module.
const ALL_KEYS: &[&str] = &[
    KEY_SUPABASE_URL,
    KEY_SUPABASE_ANON_KEY,
    KEY_STORAGE_BUCKET,
    KEY_BRANCH_ID,
    KEY_CASHIER_ID,
];

/// Retrieve a single credential from the OS keyring. Returns `None`
/// when the entry does not exist (or the platform returns a "not
/// found" error).
pub fn get_credential(key: &str) -> Option<String> {
    let entry = match Entry::new(SERVICE_NAME, key) {
        Ok(e) => e,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to create entry");
            return None;
        }
    };
    match entry.get_password() {
        Ok(pw) => Some(pw),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            warn!(key, error = %e, "keyring: failed to read credential");
            None
        }
    }
}

/// Store a credential in the OS keyring.
pub fn set_credential(key: &str, value: &str) -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(|e| e.to_string())?;
    entry.set_password(value).map_err(|e| e.to_string())?;
    Ok(())
}

/// Delete a credential from the OS keyring. Silently succeeds if the
/// entry does not exist.
pub fn delete_credential(key: &str) -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, key).map_err(|e| e.to_string())?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.to_string()),
    }
}

/// Returns `true` when both mandatory Supabase credentials exist.
pub fn has_supabase_credentials() -> bool {
    get_credential(KEY_SUPABASE_URL)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
        && get_credential(KEY_SUPABASE_ANON_KEY)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
}

/// Remove every credential this crate manages. Used when a terminal is
/// decommissioned or re-provisioned.
pub fn clear_credentials() {
    for key in ALL_KEYS {
        if let Err(e) = delete_credential(key) {
            warn!(key, error = %e, "keyring: failed to delete credential");
        }
    }
}
