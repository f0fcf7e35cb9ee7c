use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tempshare_service::{DeclaredUpload, UploadFile, UploadOutcome};

use super::{to_error, AppState};

/// Multipart field carrying file parts.
const FILE_FIELD: &str = "file";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/upload/token", post(issue_token))
        .route("/upload/complete", post(complete))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let mut files = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err((e.status(), Json(json!({ "error": e.body_text() })))),
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (e.status(), Json(json!({ "error": e.body_text() }))))?;
        // Browsers send an empty, unnamed part when nothing was picked.
        if name.is_empty() && bytes.is_empty() {
            continue;
        }
        files.push(UploadFile::new(name, content_type, bytes));
    }

    let outcomes = state.service.upload(files).await.map_err(to_error)?;
    let files: Vec<Value> = outcomes.iter().map(outcome_json).collect();
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "files": files })),
    ))
}

fn outcome_json(outcome: &UploadOutcome) -> Value {
    match outcome {
        UploadOutcome::Stored {
            access_id,
            file_name,
            expires_at,
        } => json!({
            "success": true,
            "accessId": access_id,
            "fileName": file_name,
            "expiresAt": expires_at,
        }),
        UploadOutcome::Rejected { file_name, error } => json!({
            "fileName": file_name,
            "error": error,
        }),
    }
}

async fn issue_token(
    State(state): State<AppState>,
    Json(declared): Json<DeclaredUpload>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state
        .service
        .issue_upload_token(&declared)
        .map(|t| Json(json!(t)))
        .map_err(to_error)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteRequest {
    token: String,
    blob_url: String,
}

async fn complete(
    State(state): State<AppState>,
    Json(input): Json<CompleteRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    state
        .service
        .complete_upload(&input.token, &input.blob_url)
        .await
        .map(|info| (StatusCode::CREATED, Json(json!(info))))
        .map_err(to_error)
}
