//! Provider-hosted blobs addressed by URL.
//!
//! Bytes uploaded client-direct live at a provider-issued URL. We never
//! proxy them: downloads redirect to the URL once its host is trusted, and
//! the sweep asks the provider to delete them.

use url::Url;

use crate::StoreError;

pub const DEFAULT_TRUSTED_SUFFIX: &str = "public.blob.vercel-storage.com";
pub const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";

/// Hostname suffix that provider URLs must end with.
#[derive(Debug, Clone)]
pub struct TrustedHosts {
    suffix: String,
}

impl TrustedHosts {
    /// A leading dot is optional; matching always happens on a label
    /// boundary, so `evilpublic.blob...` does not pass.
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.trim().trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn is_trusted_host(&self, host: &str) -> bool {
        if self.suffix.is_empty() {
            return false;
        }
        let host = host.to_ascii_lowercase();
        host == self.suffix
            || host
                .strip_suffix(&self.suffix)
                .is_some_and(|rest| rest.ends_with('.'))
    }

    /// Parse `raw` and accept it only if it is https on a trusted host.
    pub fn validate(&self, raw: &str) -> Result<Url, StoreError> {
        let url = Url::parse(raw).map_err(|_| StoreError::UntrustedUrl(raw.to_string()))?;
        if url.scheme() != "https" {
            return Err(StoreError::UntrustedUrl(raw.to_string()));
        }
        match url.host_str() {
            Some(host) if self.is_trusted_host(host) => Ok(url),
            _ => Err(StoreError::UntrustedUrl(raw.to_string())),
        }
    }
}

impl Default for TrustedHosts {
    fn default() -> Self {
        Self::new(DEFAULT_TRUSTED_SUFFIX)
    }
}

pub struct BlobProviderConfig {
    /// Provider API base URL.
    pub api_url: String,
    /// Read/write token. Without it, remote deletes are skipped.
    pub token: Option<String>,
}

impl BlobProviderConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("TEMPSHARE_BLOB_API_URL")
                .unwrap_or_else(|_| DEFAULT_BLOB_API_URL.into()),
            token: std::env::var("BLOB_READ_WRITE_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
        }
    }
}

/// Client for the external blob provider's management API.
pub struct BlobProvider {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl BlobProvider {
    pub fn new(config: &BlobProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Delete one blob by URL. Returns `Ok(false)` when no token is
    /// configured and nothing was attempted.
    pub async fn delete(&self, blob_url: &str) -> Result<bool, StoreError> {
        let Some(token) = &self.token else {
            tracing::warn!(url = blob_url, "blob provider token not set, skipping remote delete");
            return Ok(false);
        };
        let response = self
            .client
            .post(format!("{}/delete", self.api_url))
            .bearer_auth(token)
            .json(&serde_json::json!({ "urls": [blob_url] }))
            .send()
            .await
            .map_err(|e| StoreError::Internal(format!("blob delete: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Internal(format!(
                "blob delete {blob_url}: status {status}"
            )));
        }
        Ok(true)
    }
}
