//! Content document and color preset endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::{color_preset, color_presets, Colors, Content, MAX_PHOTOS};
use crate::AppState;

/// Query parameters for a content replacement.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceParams {
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

/// Response header carrying the store revision on a bare content read.
pub const REVISION_HEADER: &str = "x-revision-id";

/// GET /api/content - Get the full content document.
///
/// The public page reads `photos`, `timeline` and friends straight off the
/// body, so the document is returned without the envelope.
pub async fn get_content(
    State(state): State<AppState>,
) -> Result<([(&'static str, String); 1], Json<Content>), AppErrorWithRevision> {
    let revision_id = state.store.revision();

    match state.store.read().await {
        Ok(content) => Ok(([(REVISION_HEADER, revision_id.to_string())], Json(content))),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/content - Replace the whole content document.
pub async fn replace_content(
    State(state): State<AppState>,
    Query(params): Query<ReplaceParams>,
    body: Result<Json<Content>, JsonRejection>,
) -> ApiResult<()> {
    let revision_id = state.store.revision();

    let Json(content) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error(
                AppError::BadRequest(format!("Invalid content: {}", rejection.body_text())),
                revision_id,
            )
        }
    };

    if content.photos.len() > MAX_PHOTOS {
        return error(
            AppError::Validation(format!("Maximum {} photos allowed", MAX_PHOTOS)),
            revision_id,
        );
    }

    match state
        .store
        .replace(&content, params.expected_revision)
        .await
    {
        Ok(new_revision) => {
            tracing::info!(
                photos = content.photos.len(),
                timeline = content.timeline.len(),
                "Content replaced"
            );
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/color-presets - List the named color palettes.
pub async fn list_color_presets(
    State(state): State<AppState>,
) -> ApiResult<BTreeMap<&'static str, Colors>> {
    success(color_presets().into_iter().collect(), state.store.revision())
}

/// POST /api/color-presets/{name} - Apply a palette to the stored colors.
pub async fn apply_color_preset(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Content> {
    let revision_id = state.store.revision();

    let Some(colors) = color_preset(&name) else {
        return error(
            AppError::NotFound(format!("Color preset {} not found", name)),
            revision_id,
        );
    };

    let result = state
        .store
        .update(move |content| {
            content.colors = colors;
            Ok(content.clone())
        })
        .await;

    match result {
        Ok((content, new_revision)) => {
            tracing::info!(preset = %name, "Color preset applied");
            success(content, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
