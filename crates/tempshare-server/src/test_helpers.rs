use std::sync::Arc;

use axum::Router;
use tempshare_service::{FileService, ServiceConfig, Storage};
use tempshare_store::{BlobProvider, BlobProviderConfig, StoreConfig, TrustedHosts};
use tokio::net::TcpListener;

use crate::auth::CronAuth;
use crate::routes::{AppState, InnerAppState};

pub const TEST_CRON_SECRET: &str = "test-cron-secret";
pub const TEST_TOKEN_SECRET: &str = "test-token-secret";

/// Knobs for a test server. Defaults mirror production limits with both
/// secrets set.
pub struct TestOptions {
    pub max_file_mb: u64,
    pub cron_secret: Option<String>,
    pub token_secret: Option<String>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            max_file_mb: tempshare_core::validation::DEFAULT_MAX_FILE_SIZE_MB,
            cron_secret: Some(TEST_CRON_SECRET.into()),
            token_secret: Some(TEST_TOKEN_SECRET.into()),
        }
    }
}

/// Build state with in-memory SQLite, a temp local store and no remote
/// blob token.
pub async fn test_state(options: TestOptions) -> AppState {
    let db = Arc::new(tempshare_db::SqliteDatabase::open_in_memory().unwrap());
    let store_config = StoreConfig::local(
        tempfile::tempdir()
            .unwrap()
            .keep()
            .to_string_lossy()
            .to_string(),
    );
    let store = tempshare_store::create_store(&store_config).unwrap();
    let storage = Storage::new(
        store,
        BlobProvider::new(&BlobProviderConfig {
            api_url: "http://127.0.0.1:9".into(),
            token: None,
        }),
        TrustedHosts::default(),
    );
    let config = ServiceConfig {
        max_file_mb: options.max_file_mb,
        token_secret: options.token_secret,
        ..ServiceConfig::default()
    };
    Arc::new(InnerAppState {
        service: FileService::new(db, storage, config),
        cron: CronAuth::new(options.cron_secret.as_deref()),
        views: crate::routes::views::templates().unwrap(),
        body_limit: crate::config::body_limit(options.max_file_mb),
    })
}

pub async fn test_router_with(options: TestOptions) -> Router {
    crate::routes::build_router(test_state(options).await)
}

/// A running test server with base_url and background task handle.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    _handle: tokio::task::JoinHandle<()>,
}

/// Spawn an axum test server on a random port. Returns the TestServer
/// with the `base_url` (e.g. "http://127.0.0.1:12345").
pub async fn spawn_test_server() -> TestServer {
    spawn_test_server_with(TestOptions::default()).await
}

pub async fn spawn_test_server_with(options: TestOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}");
    let state = test_state(options).await;
    let app = crate::routes::build_router(state.clone());
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base_url,
        state,
        _handle: handle,
    }
}
