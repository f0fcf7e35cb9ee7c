use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use tempshare_core::{FileRecord, NewFileRecord, StoragePointer};
use tempshare_db::{Database, DbError, SqliteDatabase};
use tempshare_store::{
    BlobProvider, BlobProviderConfig, LocalStore, ObjectStore, StoreConfig, StoreError,
    TrustedHosts,
};

use crate::{FileService, ServiceConfig, Storage};

pub const TEST_SECRET: &str = "test-token-secret";

pub struct Harness {
    pub service: FileService,
    pub db: Arc<dyn Database>,
    flaky: Option<Arc<FlakyDb>>,
    dir: tempfile::TempDir,
}

impl Harness {
    pub fn flaky(&self) -> &FlakyDb {
        self.flaky.as_deref().expect("harness built without flaky_db()")
    }

    /// Objects currently held by the local store.
    pub fn object_count(&self) -> usize {
        match std::fs::read_dir(self.dir.path().join("objects")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

pub fn harness() -> Harness {
    HarnessBuilder::default().build()
}

pub fn harness_with(config: ServiceConfig) -> Harness {
    HarnessBuilder::default().config(config).build()
}

/// In-memory SQLite and a local store in a temp dir, with optional
/// failure injection on either side.
pub struct HarnessBuilder {
    config: ServiceConfig,
    flaky_db: bool,
    failing_store: bool,
    blob_token: Option<String>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            config: ServiceConfig {
                token_secret: Some(TEST_SECRET.into()),
                ..ServiceConfig::default()
            },
            flaky_db: false,
            failing_store: false,
            blob_token: None,
        }
    }
}

impl HarnessBuilder {
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn flaky_db(mut self) -> Self {
        self.flaky_db = true;
        self
    }

    pub fn failing_store(mut self) -> Self {
        self.failing_store = true;
        self
    }

    /// Blob provider token. The provider URL never answers.
    pub fn blob_token(mut self, token: &str) -> Self {
        self.blob_token = Some(token.into());
        self
    }

    pub fn build(self) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let sqlite = SqliteDatabase::open_in_memory().unwrap();
        let (db, flaky): (Arc<dyn Database>, _) = if self.flaky_db {
            let flaky = Arc::new(FlakyDb::new(sqlite));
            (flaky.clone(), Some(flaky))
        } else {
            (Arc::new(sqlite), None)
        };
        let objects: Arc<dyn ObjectStore> = if self.failing_store {
            Arc::new(FailingStore)
        } else {
            Arc::new(LocalStore::new(&StoreConfig::local(
                dir.path().to_string_lossy(),
            )))
        };
        let storage = Storage::new(
            objects,
            BlobProvider::new(&BlobProviderConfig {
                api_url: "http://127.0.0.1:9".into(),
                token: self.blob_token,
            }),
            TrustedHosts::default(),
        );
        Harness {
            service: FileService::new(db.clone(), storage, self.config),
            db,
            flaky,
            dir,
        }
    }
}

/// Object store whose writes always fail.
pub struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    async fn put(&self, key: &str, _data: Bytes) -> Result<(), StoreError> {
        Err(StoreError::Internal(format!("disk full writing {key}")))
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        Err(StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// SQLite with switchable insert and delete failures.
pub struct FlakyDb {
    inner: SqliteDatabase,
    fail_inserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FlakyDb {
    fn new(inner: SqliteDatabase) -> Self {
        Self {
            inner,
            fail_inserts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn fail_inserts(&self, on: bool) {
        self.fail_inserts.store(on, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl Database for FlakyDb {
    async fn create_file(&self, input: &NewFileRecord) -> Result<FileRecord, DbError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DbError::Internal("database is locked".into()));
        }
        self.inner.create_file(input).await
    }

    async fn get_file(&self, access_id: &str) -> Result<FileRecord, DbError> {
        self.inner.get_file(access_id).await
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<FileRecord>, DbError> {
        self.inner.list_expired(now).await
    }

    async fn delete_file(&self, access_id: &str) -> Result<bool, DbError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(DbError::Internal("database is locked".into()));
        }
        self.inner.delete_file(access_id).await
    }

    async fn count_files(&self) -> Result<i64, DbError> {
        self.inner.count_files().await
    }
}

/// Insert a record directly, bypassing validation.
pub async fn insert(
    db: &Arc<dyn Database>,
    access_id: &str,
    storage: StoragePointer,
    expires_at: DateTime<Utc>,
) {
    db.create_file(&NewFileRecord {
        access_id: access_id.into(),
        file_name: format!("{access_id}.bin"),
        file_size: 3,
        file_type: "application/octet-stream".into(),
        storage,
        created_at: expires_at - Duration::hours(48),
        expires_at,
    })
    .await
    .unwrap();
}
