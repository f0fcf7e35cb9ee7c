use bytes::Bytes;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tempshare_core::{
    expiry, generate_access_id, FileInfo, FileRecord, NewFileRecord, StoragePointer,
    UploadClaims, ValidationError,
};
use tempshare_db::DbError;

use crate::{FileService, ServiceError};

/// Fresh access ids drawn before giving up on a colliding insert.
const ACCESS_ID_ATTEMPTS: usize = 3;

const STORE_FAILED: &str = "Failed to store file";

/// One file of a direct upload, as received.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        let content_type = content_type.into();
        Self {
            name: name.into(),
            content_type: if content_type.trim().is_empty() {
                "application/octet-stream".to_string()
            } else {
                content_type
            },
            bytes,
        }
    }

    /// Measured size; the client's declaration is never trusted here.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Per-file result of a batch upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Stored {
        access_id: String,
        file_name: String,
        expires_at: DateTime<Utc>,
    },
    Rejected {
        file_name: String,
        error: String,
    },
}

impl UploadOutcome {
    fn rejected(file_name: &str, error: impl Into<String>) -> Self {
        UploadOutcome::Rejected {
            file_name: file_name.to_string(),
            error: error.into(),
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, UploadOutcome::Stored { .. })
    }
}

/// Metadata a client declares before uploading straight to the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredUpload {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadToken {
    pub token: String,
    pub access_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    upload: UploadClaims,
}

impl FileService {
    /// Validate and store each file independently. The result mirrors the
    /// input order; only an empty batch fails as a whole.
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<Vec<UploadOutcome>, ServiceError> {
        if files.is_empty() {
            return Err(ValidationError::NoFiles.into());
        }
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            outcomes.push(self.upload_one(file).await);
        }
        Ok(outcomes)
    }

    async fn upload_one(&self, file: UploadFile) -> UploadOutcome {
        let claims = match UploadClaims::new(
            &file.name,
            &file.content_type,
            file.size(),
            self.config.max_file_mb,
        ) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::info!(file_name = %file.name, reason = %e, "upload rejected");
                return UploadOutcome::rejected(&file.name, e.to_string());
            }
        };

        match self.store_direct(&claims, file.bytes).await {
            Ok(record) => {
                tracing::info!(
                    access_id = %record.access_id,
                    size = record.file_size,
                    "file uploaded"
                );
                UploadOutcome::Stored {
                    access_id: record.access_id,
                    file_name: record.file_name,
                    expires_at: record.expires_at,
                }
            }
            Err(e) => {
                tracing::error!(file_name = %file.name, error = %e, "failed to store upload");
                UploadOutcome::rejected(&file.name, STORE_FAILED)
            }
        }
    }

    async fn store_direct(
        &self,
        claims: &UploadClaims,
        bytes: Bytes,
    ) -> Result<FileRecord, ServiceError> {
        let mut access_id = generate_access_id();
        let storage_id = self.storage.save(bytes, claims.file_name()).await?;
        let pointer = StoragePointer::Internal { id: storage_id };
        let created_at = Utc::now();
        let expires_at = expiry::expiration_from(created_at, self.config.ttl);

        let mut attempt = 1;
        loop {
            let input = new_record(claims, &access_id, pointer.clone(), created_at, expires_at);
            match self.db.create_file(&input).await {
                Ok(record) => return Ok(record),
                Err(DbError::Conflict(_)) if attempt < ACCESS_ID_ATTEMPTS => {
                    tracing::warn!(%access_id, "access id collision, retrying");
                    access_id = generate_access_id();
                    attempt += 1;
                }
                Err(e) => {
                    self.storage.delete(&pointer).await;
                    return Err(e.into());
                }
            }
        }
    }

    /// Validate declared metadata and sign it into a short-lived token for
    /// the client-direct flow.
    pub fn issue_upload_token(&self, declared: &DeclaredUpload) -> Result<UploadToken, ServiceError> {
        let secret = self.token_secret()?;
        let upload = UploadClaims::new(
            &declared.file_name,
            &declared.file_type,
            declared.file_size,
            self.config.max_file_mb,
        )?;

        let access_id = generate_access_id();
        let now = Utc::now();
        let expires_at = now + self.config.token_ttl;
        let claims = TokenClaims {
            sub: access_id.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            upload,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("sign upload token: {e}")))?;

        tracing::debug!(%access_id, "issued upload token");
        Ok(UploadToken {
            token,
            access_id,
            expires_at,
        })
    }

    /// Provider completion callback: verify the token, check the blob URL,
    /// then persist the record. Every failure is returned.
    pub async fn complete_upload(&self, token: &str, blob_url: &str) -> Result<FileInfo, ServiceError> {
        let secret = self.token_secret()?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let claims = jsonwebtoken::decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "rejected upload token");
            ServiceError::Unauthorized("invalid upload token".into())
        })?
        .claims;

        let url = self.storage.resolve_redirect(blob_url).map_err(|e| {
            tracing::error!(access_id = %claims.sub, error = %e, "untrusted blob url on completion");
            ServiceError::from(e)
        })?;
        let pointer = StoragePointer::External { url: url.to_string() };

        let created_at = Utc::now();
        let expires_at = expiry::expiration_from(created_at, self.config.ttl);
        let input = new_record(&claims.upload, &claims.sub, pointer.clone(), created_at, expires_at);
        match self.db.create_file(&input).await {
            Ok(record) => {
                tracing::info!(access_id = %record.access_id, "client upload completed");
                Ok(record.info())
            }
            // A provider retrying the same callback.
            Err(DbError::Conflict(_)) => {
                let existing = self.db.get_file(&claims.sub).await?;
                if existing.storage == pointer {
                    Ok(existing.info())
                } else {
                    Err(ServiceError::Internal(format!(
                        "access id {} already completed with another blob",
                        claims.sub
                    )))
                }
            }
            Err(e) => {
                tracing::error!(access_id = %claims.sub, error = %e, "failed to record client upload");
                Err(e.into())
            }
        }
    }

    fn token_secret(&self) -> Result<&str, ServiceError> {
        self.config
            .token_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServiceError::Internal("upload tokens are not configured".into()))
    }
}

fn new_record(
    claims: &UploadClaims,
    access_id: &str,
    storage: StoragePointer,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> NewFileRecord {
    NewFileRecord {
        access_id: access_id.to_string(),
        file_name: claims.file_name().to_string(),
        file_size: claims.file_size() as i64,
        file_type: claims.file_type().to_string(),
        storage,
        created_at,
        expires_at,
    }
}
