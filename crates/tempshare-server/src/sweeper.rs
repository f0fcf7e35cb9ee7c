use std::time::Duration;

use tracing::{error, info};

use crate::routes::AppState;

/// Background expiration sweep, for deployments without an external
/// scheduler calling `/cron/cleanup`.
pub async fn run_sweeper(state: AppState, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    info!(interval_secs, "in-process sweeper started");
    loop {
        ticker.tick().await;
        if let Err(e) = state.service.sweep().await {
            error!("sweeper error: {e}");
        }
    }
}
