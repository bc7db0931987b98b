//! REST API module.
//!
//! Contains the content, media and upload handlers used by the admin panel and public site.

mod content;
mod media;
mod upload;

pub use content::*;
pub use media::*;
pub use upload::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: u64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: u64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Upload envelope. The payload's fields sit beside `success`, the way the
/// admin panel's upload forms read them (`result.files`, `result.filename`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
    pub revision_id: u64,
}

impl<T: Serialize> IntoResponse for UploadResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppErrorWithRevision>;

/// Result of an upload handler.
pub type UploadResult<T> = Result<UploadResponse<T>, crate::errors::AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: u64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create a successful upload response.
pub fn uploaded<T: Serialize>(body: T, revision_id: u64) -> UploadResult<T> {
    Ok(UploadResponse {
        success: true,
        body,
        revision_id,
    })
}

/// Create an error response for any handler result type.
pub fn error<R>(
    err: crate::errors::AppError,
    revision_id: u64,
) -> Result<R, crate::errors::AppErrorWithRevision> {
    Err(crate::errors::AppErrorWithRevision {
        error: err,
        revision_id,
    })
}
