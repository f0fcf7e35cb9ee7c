use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};

use super::{to_error, AppState};

/// Routes behind the cron bearer check.
pub fn routes() -> Router<AppState> {
    Router::new().route("/cron/cleanup", get(cleanup))
}

async fn cleanup(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let report = state.service.sweep().await.map_err(to_error)?;
    Ok(Json(json!({
        "message": "Cleanup completed",
        "results": report,
    })))
}
