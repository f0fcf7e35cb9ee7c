use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::routes::AppState;

/// Shared-secret check for the cleanup trigger.
pub struct CronAuth {
    /// SHA-256 of `CRON_SECRET`. `None` locks the endpoint.
    secret_hash: Option<String>,
}

impl CronAuth {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret_hash: secret.filter(|s| !s.is_empty()).map(sha256_hex),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_hash.is_some()
    }

    /// Whether `header` is exactly `Bearer <secret>`.
    pub fn allows(&self, header: Option<&str>) -> bool {
        let Some(expected) = &self.secret_hash else {
            return false;
        };
        match header.and_then(|v| v.strip_prefix("Bearer ")) {
            Some(token) => constant_time_eq(&sha256_hex(token), expected),
            None => false,
        }
    }
}

/// SHA-256 hash a raw key, returning the hex-encoded digest.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Rejects the request with 401 before any handler work unless it carries
/// the cron bearer secret.
pub async fn cron_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    if state.cron.allows(header) {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "unauthorized cleanup request");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("short", "longer-string"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn cron_auth_requires_exact_bearer() {
        let auth = CronAuth::new(Some("s3cret"));
        assert!(auth.is_configured());
        assert!(auth.allows(Some("Bearer s3cret")));
        assert!(!auth.allows(Some("Bearer wrong")));
        assert!(!auth.allows(Some("bearer s3cret")));
        assert!(!auth.allows(Some("s3cret")));
        assert!(!auth.allows(None));
    }

    #[test]
    fn cron_auth_without_secret_denies_everything() {
        for secret in [None, Some("")] {
            let auth = CronAuth::new(secret);
            assert!(!auth.is_configured());
            assert!(!auth.allows(Some("Bearer ")));
            assert!(!auth.allows(Some("Bearer anything")));
        }
    }
}
