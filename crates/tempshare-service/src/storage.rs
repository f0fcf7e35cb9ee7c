use std::sync::Arc;

use bytes::Bytes;
use tempshare_core::StoragePointer;
use tempshare_store::{
    object_key, parse_storage_id, BlobProvider, ByteStream, ObjectStore, StoreError, TrustedHosts,
};
use url::Url;

/// One contract over both places a record's bytes can live: the internal
/// object store, and the external blob provider reached by URL.
pub struct Storage {
    objects: Arc<dyn ObjectStore>,
    provider: BlobProvider,
    trusted: TrustedHosts,
}

impl Storage {
    pub fn new(objects: Arc<dyn ObjectStore>, provider: BlobProvider, trusted: TrustedHosts) -> Self {
        Self {
            objects,
            provider,
            trusted,
        }
    }

    /// Persist bytes under a fresh storage id. The name is only logged.
    pub async fn save(&self, data: Bytes, name: &str) -> Result<String, StoreError> {
        let id = tempshare_store::new_storage_id();
        let len = data.len();
        self.objects.put(&object_key(&id), data).await?;
        tracing::debug!(storage_id = %id, file_name = name, bytes = len, "saved object");
        Ok(id)
    }

    /// Whether bytes exist for `id`. Malformed ids and backend failures
    /// both read as absent.
    pub async fn exists(&self, id: &str) -> bool {
        if parse_storage_id(id).is_err() {
            tracing::warn!(storage_id = id, "malformed storage id");
            return false;
        }
        match self.objects.exists(&object_key(id)).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(storage_id = id, error = %e, "storage existence check failed");
                false
            }
        }
    }

    pub async fn read_stream(&self, id: &str) -> Result<ByteStream, StoreError> {
        parse_storage_id(id)?;
        self.objects.open_stream(&object_key(id)).await
    }

    /// Best-effort removal of the bytes behind `pointer`. Returns false when
    /// the bytes may still be there; the failure is logged, never raised.
    ///
    /// Already-missing bytes count as removed. So does an external pointer
    /// when no provider token is configured, since nothing can be done.
    pub async fn delete(&self, pointer: &StoragePointer) -> bool {
        let result = match pointer {
            StoragePointer::Internal { id } => match parse_storage_id(id) {
                Ok(_) => self.objects.delete(&object_key(id)).await,
                Err(e) => Err(e),
            },
            StoragePointer::External { url } => self.provider.delete(url).await.map(|_| ()),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    kind = pointer.kind(),
                    pointer = pointer.as_str(),
                    error = %e,
                    "storage delete failed"
                );
                false
            }
        }
    }

    /// Validate an external pointer before handing it to a client.
    pub fn resolve_redirect(&self, url: &str) -> Result<Url, StoreError> {
        self.trusted.validate(url)
    }
}
