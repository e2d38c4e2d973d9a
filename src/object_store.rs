//! Object storage client for menu item images.
//!
//! Thin collaborator over the Supabase Storage API: upload a blob into
//! the terminal's bucket and hand back the public URL that gets stored
//! on the menu item row, or delete a previously uploaded object.
//!
//! Object names are `folder/<uuid>.<ext>` so concurrent uploads can
//! never collide on a name.

use reqwest::StatusCode;
use uuid::Uuid;

use crate::api::SupabaseClient;
use crate::config::TerminalConfig;
use crate::error::GatewayError;

/// Default folder for menu images inside the bucket.
pub const MENU_FOLDER: &str = "menu";

/// Result of a successful upload. `public_url` is what menu item rows
/// carry; `path` is what [`ObjectStore::delete`] wants back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub public_url: String,
    pub path: String,
}

/// Build a unique object path for an upload. The extension comes from
/// the original filename; files without one fall back to `bin`.
fn unique_object_path(folder: &str, original_filename: &str) -> String {
    let ext = original_filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");
    format!("{folder}/{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase())
}

/// Map a storage error body, keeping the row-level-security case
/// distinguishable because it means a bucket policy problem, not a
/// transient failure.
fn storage_error(status: StatusCode, body: &str) -> GatewayError {
    if body.contains("row-level security") {
        return GatewayError::Remote(
            "Storage request rejected by bucket policy. Check the Supabase Storage bucket policies."
                .to_string(),
        );
    }
    let detail = if body.trim().is_empty() {
        format!("Storage request failed (HTTP {})", status.as_u16())
    } else {
        format!(
            "Storage request failed (HTTP {}): {}",
            status.as_u16(),
            body.trim()
        )
    };
    GatewayError::Remote(detail)
}

/// Client for one storage bucket.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    client: SupabaseClient,
    bucket: String,
}

impl ObjectStore {
    pub fn new(config: &TerminalConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: SupabaseClient::new(config)?,
            bucket: config.storage_bucket.clone(),
        })
    }

    pub fn from_client(client: SupabaseClient, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Public URL for an object path in this bucket.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.client.base_url(),
            self.bucket
        )
    }

    /// Upload `bytes` under a fresh unique name inside `folder` and
    /// return the stored object's public URL and path.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        original_filename: &str,
        folder: &str,
    ) -> Result<StoredObject, GatewayError> {
        let path = unique_object_path(folder, original_filename);
        let url = format!(
            "{}/storage/v1/object/{}/{path}",
            self.client.base_url(),
            self.bucket
        );

        let resp = self
            .client
            .http()
            .post(&url)
            .header("apikey", self.client.anon_key())
            .header(
                "Authorization",
                format!("Bearer {}", self.client.anon_key()),
            )
            .header("Content-Type", "application/octet-stream")
            .header("Cache-Control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("Storage upload failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(storage_error(status, &body));
        }

        Ok(StoredObject {
            public_url: self.public_url(&path),
            path,
        })
    }

    /// Delete an object by the path returned from [`ObjectStore::upload`].
    pub async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        let url = format!(
            "{}/storage/v1/object/{}/{path}",
            self.client.base_url(),
            self.bucket
        );

        let resp = self
            .client
            .http()
            .delete(&url)
            .header("apikey", self.client.anon_key())
            .header(
                "Authorization",
                format!("Bearer {}", self.client.anon_key()),
            )
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("Storage delete failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(storage_error(status, &body));
        }
        Ok(())
    }
}
