use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tempshare_service::Download;

use super::{to_error, AppState};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/file/{access_id}", get(file_info))
        .route("/download/{access_id}", get(download))
        .route("/download", get(download_without_id))
        .route("/download/", get(download_without_id))
}

async fn file_info(
    State(state): State<AppState>,
    Path(access_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .file_info(&access_id)
        .await
        .map(|info| Json(json!(info)))
        .map_err(to_error)
}

async fn download(
    State(state): State<AppState>,
    Path(access_id): Path<String>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    download_response(&state, &access_id).await
}

async fn download_without_id(
    State(state): State<AppState>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    download_response(&state, "").await
}

async fn download_response(
    state: &AppState,
    access_id: &str,
) -> Result<Response, (StatusCode, Json<Value>)> {
    match state.service.download(access_id).await.map_err(to_error)? {
        Download::Redirect(url) => Ok(Redirect::temporary(url.as_str()).into_response()),
        Download::Stream { info, body } => {
            let content_type = HeaderValue::from_str(&info.file_type)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
            let disposition = attachment_disposition(&info.file_name);
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, info.file_size)
                .header(header::CONTENT_DISPOSITION, disposition)
                .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
                .body(Body::from_stream(body))
                .map_err(|e| {
                    tracing::error!(access_id, error = %e, "failed to build download response");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Internal server error" })),
                    )
                })
        }
    }
}

/// The name is percent-encoded: everything outside ASCII alphanumerics and
/// `-_.~` is escaped, spaces as `%20`, so quotes can never break the header.
fn attachment_disposition(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", urlencoding::encode(file_name))
}
