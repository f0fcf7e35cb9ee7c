pub mod cron;
pub mod files;
pub mod health;
pub mod upload;
pub mod views;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tempshare_service::{FileService, ServiceError};
use tower_http::trace::TraceLayer;

use crate::auth::{cron_auth_middleware, CronAuth};

pub struct InnerAppState {
    pub service: FileService,
    pub cron: CronAuth,
    pub views: tera::Tera,
    pub body_limit: usize,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .merge(health::routes())
        .merge(upload::routes())
        .merge(files::routes())
        .merge(views::routes());

    let protected = Router::new()
        .merge(cron::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            cron_auth_middleware,
        ));

    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Map a service failure to a status and `{"error": ..}` body. Server-side
/// failures get a generic message; the detail goes to the log only.
pub fn to_error(e: ServiceError) -> (StatusCode, Json<Value>) {
    let (status, msg) = match &e {
        ServiceError::Validation(v) => (StatusCode::BAD_REQUEST, v.to_string()),
        ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        ServiceError::Expired(msg) => (StatusCode::GONE, msg.clone()),
        ServiceError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        ServiceError::StorageReferenceInvalid(_) | ServiceError::Internal(_) => {
            tracing::error!(error = %e, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };
    (status, Json(json!({ "error": msg })))
}

#[cfg(test)]
mod tests {
    use tempshare_core::ValidationError;

    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (ServiceError::from(ValidationError::NoFiles), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("File not found".into()), StatusCode::NOT_FOUND),
            (ServiceError::Expired("File has expired".into()), StatusCode::GONE),
            (ServiceError::Unauthorized("bad token".into()), StatusCode::UNAUTHORIZED),
            (
                ServiceError::StorageReferenceInvalid("https://evil.example.com".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ServiceError::Internal("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(to_error(err).0, expected);
        }
    }

    #[test]
    fn internal_details_stay_out_of_the_body() {
        let (_, Json(body)) = to_error(ServiceError::StorageReferenceInvalid(
            "https://evil.example.com/x".into(),
        ));
        assert_eq!(body["error"], "Internal server error");

        let (_, Json(body)) = to_error(ServiceError::Expired("File has expired".into()));
        assert_eq!(body["error"], "File has expired");
    }
}
