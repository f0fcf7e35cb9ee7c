mod local;
pub mod remote;
#[cfg(feature = "s3")]
mod s3;

pub use local::LocalStore;
pub use remote::{BlobProvider, BlobProviderConfig, TrustedHosts};
#[cfg(feature = "s3")]
pub use s3::S3Store;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid storage id: {0}")]
    InvalidId(String),

    #[error("untrusted storage url: {0}")]
    UntrustedUrl(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// Sequential chunks of an object's bytes.
pub type ByteStream = BoxStream<'static, Result<Bytes, StoreError>>;

/// A store for opaque blobs keyed by string paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (create or overwrite) an object. Readers never observe a
    /// partially written object.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Read an object. Returns `StoreError::NotFound` if absent.
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Open an object as a stream of chunks.
    ///
    /// The default buffers the whole object and yields it as one chunk.
    async fn open_stream(&self, key: &str) -> Result<ByteStream, StoreError> {
        let data = self.get(key).await?;
        Ok(stream::once(async move { Ok(data) }).boxed())
    }

    /// Delete an object. No-op if absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// -- Key helpers --

/// Object key for an uploaded file's bytes.
pub fn object_key(storage_id: &str) -> String {
    format!("objects/{storage_id}")
}

/// Fresh storage id for a new object.
pub fn new_storage_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Storage ids are UUIDs; anything else is rejected before it reaches a key.
pub fn parse_storage_id(storage_id: &str) -> Result<uuid::Uuid, StoreError> {
    uuid::Uuid::parse_str(storage_id).map_err(|_| StoreError::InvalidId(storage_id.to_string()))
}

// -- Configuration --

/// Configuration for the object store backend.
pub struct StoreConfig {
    /// S3-compatible endpoint URL (e.g., "http://127.0.0.1:3900").
    /// When `None`, use local filesystem.
    pub endpoint_url: Option<String>,
    /// S3 region (e.g., "garage", "us-east-1").
    pub region: Option<String>,
    /// S3 bucket name.
    pub bucket: Option<String>,
    /// AWS access key ID.
    pub access_key_id: Option<String>,
    /// AWS secret access key.
    pub secret_access_key: Option<String>,
    /// Local filesystem base directory (used when S3 is not configured).
    pub local_data_dir: Option<String>,
}

impl StoreConfig {
    /// Build from environment variables.
    /// If `TEMPSHARE_S3_ENDPOINT` (or `AWS_ENDPOINT_URL`) is set along with
    /// credentials and a bucket name, use S3. Otherwise, fall back to the
    /// local filesystem under `TEMPSHARE_DATA_DIR`.
    pub fn from_env() -> Self {
        Self {
            endpoint_url: std::env::var("TEMPSHARE_S3_ENDPOINT")
                .or_else(|_| std::env::var("AWS_ENDPOINT_URL"))
                .ok(),
            region: std::env::var("TEMPSHARE_S3_REGION")
                .or_else(|_| std::env::var("AWS_REGION"))
                .ok(),
            bucket: std::env::var("TEMPSHARE_S3_BUCKET").ok(),
            access_key_id: std::env::var("TEMPSHARE_S3_ACCESS_KEY_ID")
                .or_else(|_| std::env::var("AWS_ACCESS_KEY_ID"))
                .ok(),
            secret_access_key: std::env::var("TEMPSHARE_S3_SECRET_ACCESS_KEY")
                .or_else(|_| std::env::var("AWS_SECRET_ACCESS_KEY"))
                .ok(),
            local_data_dir: std::env::var("TEMPSHARE_DATA_DIR").ok(),
        }
    }

    /// Local-only config rooted at `dir`.
    pub fn local(dir: impl Into<String>) -> Self {
        Self {
            endpoint_url: None,
            region: None,
            bucket: None,
            access_key_id: None,
            secret_access_key: None,
            local_data_dir: Some(dir.into()),
        }
    }

    pub fn is_s3(&self) -> bool {
        self.endpoint_url.is_some()
            && self.access_key_id.is_some()
            && self.secret_access_key.is_some()
            && self.bucket.is_some()
    }
}

// -- Factory --

/// Create an `ObjectStore` from configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>, StoreError> {
    if config.is_s3() {
        #[cfg(feature = "s3")]
        {
            tracing::info!("using s3 object store");
            Ok(Arc::new(S3Store::new(config)?))
        }
        #[cfg(not(feature = "s3"))]
        {
            Err(StoreError::Internal(
                "S3 configuration detected but the 's3' feature is not enabled".into(),
            ))
        }
    } else {
        let store = LocalStore::new(config);
        tracing::info!(dir = %store.base_dir().display(), "using local object store");
        Ok(Arc::new(store))
    }
}
