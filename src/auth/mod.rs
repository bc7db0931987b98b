//! Admin authentication via a pre-shared key.
//!
//! Only write routes are guarded; the public site reads content without a key.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, AppErrorWithRevision};

/// Header name for the admin key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware guarding admin routes. With no key configured every request passes.
pub async fn admin_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    let verdict = match provided_key(request.headers()) {
        Some(key) if constant_time_compare(key, &expected) => Ok(()),
        Some(_) => Err("Invalid API key"),
        None => Err("Missing API key"),
    };

    match verdict {
        Ok(()) => next.run(request).await,
        Err(message) => unauthorized_response(message),
    }
}

/// Key from `x-api-key`, falling back to `Authorization: Bearer`.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    tracing::warn!("Rejected admin request: {}", message);
    AppErrorWithRevision {
        error: AppError::Unauthorized(message.to_string()),
        revision_id: 0,
    }
    .into_response()
}
