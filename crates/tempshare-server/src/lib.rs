pub mod auth;
pub mod config;
mod routes;
pub mod sweeper;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use std::sync::Arc;

use anyhow::Result;
use tempshare_service::{FileService, Storage};
use tempshare_store::{BlobProvider, BlobProviderConfig, StoreConfig, TrustedHosts};
use tokio::net::TcpListener;

use auth::CronAuth;
use config::ServerConfig;

pub use routes::{build_router, AppState, InnerAppState};

/// Open the database and storage named by `config` and assemble the shared
/// application state.
pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let db = tempshare_db::open_database(&config.db_config()).await?;
    let store = tempshare_store::create_store(&StoreConfig::from_env())?;

    let provider = BlobProvider::new(&BlobProviderConfig::from_env());
    if !provider.is_configured() {
        tracing::info!("BLOB_READ_WRITE_TOKEN not set, external blobs will not be deleted");
    }
    let storage = Storage::new(
        store,
        provider,
        TrustedHosts::new(&config.trusted_blob_suffix),
    );

    let cron = CronAuth::new(config.cron_secret.as_deref());
    if !cron.is_configured() {
        tracing::warn!("CRON_SECRET not set, /cron/cleanup will reject every request");
    }

    Ok(Arc::new(InnerAppState {
        service: FileService::new(db, storage, config.service_config()),
        cron,
        views: routes::views::templates()?,
        body_limit: config::body_limit(config.max_file_mb),
    }))
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
