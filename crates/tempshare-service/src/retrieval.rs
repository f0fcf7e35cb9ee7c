use tempshare_core::access_id::looks_like_access_id;
use tempshare_core::{FileInfo, FileRecord, StoragePointer, ValidationError};
use tempshare_store::ByteStream;
use url::Url;

use crate::{FileService, ServiceError};

/// How a live record's bytes reach the client.
pub enum Download {
    /// Bytes served by this process.
    Stream { info: FileInfo, body: ByteStream },
    /// Bytes held by the external provider at a validated URL.
    Redirect(Url),
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Download::Stream { info, .. } => f.debug_struct("Stream").field("info", info).finish(),
            Download::Redirect(url) => f.debug_tuple("Redirect").field(&url.as_str()).finish(),
        }
    }
}

impl FileService {
    /// Metadata for a live record.
    pub async fn file_info(&self, access_id: &str) -> Result<FileInfo, ServiceError> {
        Ok(self.live_record(access_id).await?.info())
    }

    pub async fn download(&self, access_id: &str) -> Result<Download, ServiceError> {
        let record = self.live_record(access_id).await?;
        match &record.storage {
            StoragePointer::External { url } => {
                let url = self.storage.resolve_redirect(url).map_err(|e| {
                    tracing::error!(
                        access_id = %record.access_id,
                        error = %e,
                        "refusing to redirect to untrusted storage"
                    );
                    ServiceError::from(e)
                })?;
                tracing::info!(access_id = %record.access_id, "redirecting download");
                Ok(Download::Redirect(url))
            }
            StoragePointer::Internal { id } => {
                if !self.storage.exists(id).await {
                    tracing::warn!(access_id = %record.access_id, storage_id = %id, "bytes missing for live record");
                    return Err(ServiceError::NotFound("File not found in storage".into()));
                }
                let body = self.storage.read_stream(id).await?;
                tracing::info!(access_id = %record.access_id, size = record.file_size, "streaming download");
                Ok(Download::Stream {
                    info: record.info(),
                    body,
                })
            }
        }
    }

    /// Look up a record and gate it on expiry. Expired records read the
    /// same whether or not the sweep has reached them.
    async fn live_record(&self, access_id: &str) -> Result<FileRecord, ServiceError> {
        let access_id = access_id.trim();
        if access_id.is_empty() {
            return Err(ValidationError::MissingAccessId.into());
        }
        if !looks_like_access_id(access_id) {
            return Err(ServiceError::NotFound("File not found".into()));
        }
        let record = self.db.get_file(access_id).await.map_err(|e| match e {
            tempshare_db::DbError::NotFound(_) => ServiceError::NotFound("File not found".into()),
            other => other.into(),
        })?;
        if record.is_expired() {
            return Err(ServiceError::Expired("File has expired".into()));
        }
        Ok(record)
    }
}
