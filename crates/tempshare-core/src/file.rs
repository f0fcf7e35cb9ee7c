use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expiry;

/// Where a record's bytes live. Exactly one kind is authoritative per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoragePointer {
    /// Object id in the internal object store.
    Internal { id: String },
    /// Provider-issued URL for client-direct uploads.
    External { url: String },
}

impl StoragePointer {
    pub fn as_str(&self) -> &str {
        match self {
            StoragePointer::Internal { id } => id,
            StoragePointer::External { url } => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StoragePointer::Internal { .. } => "internal",
            StoragePointer::External { .. } => "external",
        }
    }

    /// Split into the `(storage_id, blob_url)` column pair.
    pub fn to_columns(&self) -> (Option<&str>, Option<&str>) {
        match self {
            StoragePointer::Internal { id } => (Some(id), None),
            StoragePointer::External { url } => (None, Some(url)),
        }
    }

    /// Rebuild from the column pair. `None` unless exactly one is set.
    pub fn from_columns(storage_id: Option<String>, blob_url: Option<String>) -> Option<Self> {
        match (storage_id, blob_url) {
            (Some(id), None) => Some(StoragePointer::Internal { id }),
            (None, Some(url)) => Some(StoragePointer::External { url }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub access_id: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub storage: StoragePointer,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_expired(&self) -> bool {
        expiry::is_expired(self.expires_at)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        expiry::is_expired_at(self.expires_at, now)
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            file_name: self.file_name.clone(),
            file_size: self.file_size,
            file_type: self.file_type.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            access_id: self.access_id.clone(),
        }
    }
}

/// Input for inserting a record. Timestamps are supplied by the caller so
/// `expires_at` is computed exactly once, in the upload flow.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub access_id: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub storage: StoragePointer,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Public, byte-free view of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub file_name: String,
    pub file_size: i64,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub access_id: String,
}
