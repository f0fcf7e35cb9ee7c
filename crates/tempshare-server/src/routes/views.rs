use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tempshare_core::access_id::looks_like_access_id;
use tempshare_core::{format_file_size, format_time_remaining};
use tempshare_service::ServiceError;
use tera::{Context, Tera};

use super::{to_error, AppState};

const ROBOTS_TXT: &str = "User-agent: *
Allow: /
Disallow: /upload
Disallow: /download/
Disallow: /file/
Disallow: /cron/
";

pub fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../../templates/base.html")),
        ("index.html", include_str!("../../templates/index.html")),
        ("file.html", include_str!("../../templates/file.html")),
        ("success.html", include_str!("../../templates/success.html")),
        ("expired.html", include_str!("../../templates/expired.html")),
    ])?;
    Ok(tera)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/f/{access_id}", get(file_page))
        .route("/success", get(success))
        .route("/expired", get(expired))
        .route("/robots.txt", get(robots))
}

fn render(state: &AppState, template: &str, context: &Context) -> Response {
    match state.views.render(template, context) {
        Ok(body) => Html(body).into_response(),
        Err(e) => {
            tracing::error!(template, error = %e, "template render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

fn base_context(state: &AppState) -> Context {
    let config = state.service.config();
    let mut context = Context::new();
    context.insert("max_file_mb", &config.max_file_mb);
    context.insert("ttl_hours", &config.ttl.num_hours());
    context
}

async fn index(State(state): State<AppState>) -> Response {
    render(&state, "index.html", &base_context(&state))
}

async fn file_page(State(state): State<AppState>, Path(access_id): Path<String>) -> Response {
    let info = match state.service.file_info(&access_id).await {
        Ok(info) => info,
        Err(
            ServiceError::NotFound(_) | ServiceError::Expired(_) | ServiceError::Validation(_),
        ) => return Redirect::to("/expired").into_response(),
        Err(e) => {
            let (status, _) = to_error(e);
            return (status, "Internal server error").into_response();
        }
    };

    let mut context = base_context(&state);
    context.insert("file_name", &info.file_name);
    context.insert(
        "file_size",
        &format_file_size(u64::try_from(info.file_size).unwrap_or(0)),
    );
    context.insert("file_type", &info.file_type);
    context.insert("time_remaining", &format_time_remaining(info.expires_at));
    context.insert("expires_at", &info.expires_at.to_rfc3339());
    context.insert("download_url", &format!("/download/{}", info.access_id));
    render(&state, "file.html", &context)
}

#[derive(Debug, Deserialize)]
struct SuccessQuery {
    ids: Option<String>,
}

async fn success(State(state): State<AppState>, Query(query): Query<SuccessQuery>) -> Response {
    let links: Vec<String> = query
        .ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| looks_like_access_id(id))
        .map(|id| format!("/f/{id}"))
        .collect();
    let mut context = base_context(&state);
    context.insert("links", &links);
    render(&state, "success.html", &context)
}

async fn expired(State(state): State<AppState>) -> Response {
    let mut response = render(&state, "expired.html", &base_context(&state));
    *response.status_mut() = StatusCode::GONE;
    response
}

async fn robots() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], ROBOTS_TXT)
}
