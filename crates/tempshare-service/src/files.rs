use std::sync::Arc;

use chrono::Duration;
use tempshare_core::expiry;
use tempshare_core::validation::DEFAULT_MAX_FILE_SIZE_MB;
use tempshare_db::Database;

use crate::Storage;

/// Lifetime of an upload token issued for the client-direct flow.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_file_mb: u64,
    pub ttl: Duration,
    /// HMAC secret for upload tokens. The client-direct flow is disabled
    /// without one.
    pub token_secret: Option<String>,
    pub token_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_file_mb: DEFAULT_MAX_FILE_SIZE_MB,
            ttl: expiry::default_ttl(),
            token_secret: None,
            token_ttl: Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }
}

/// The file-sharing operations: upload, retrieval and the expiration sweep.
///
/// Holds explicit handles to the repository and storage; nothing is
/// connected lazily.
pub struct FileService {
    pub(crate) db: Arc<dyn Database>,
    pub(crate) storage: Storage,
    pub(crate) config: ServiceConfig,
}

impl FileService {
    pub fn new(db: Arc<dyn Database>, storage: Storage, config: ServiceConfig) -> Self {
        Self {
            db,
            storage,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn db(&self) -> &Arc<dyn Database> {
        &self.db
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}
