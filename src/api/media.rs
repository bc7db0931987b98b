//! Photo and video deletion endpoints.

use axum::extract::{Path, State};
use serde::Serialize;

use super::{error, success, ApiResult};
use crate::AppState;

/// Result of clearing the gallery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedPhotos {
    pub removed: usize,
}

/// DELETE /api/photos/{filename} - Delete one photo.
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.store.revision();

    match state.media.delete_photo(&filename).await {
        Ok(new_revision) => success((), new_revision),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/photos - Delete every photo.
pub async fn clear_photos(State(state): State<AppState>) -> ApiResult<ClearedPhotos> {
    let revision_id = state.store.revision();

    match state.media.clear_photos().await {
        Ok((removed, new_revision)) => success(ClearedPhotos { removed }, new_revision),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/video - Remove the site video.
pub async fn remove_video(State(state): State<AppState>) -> ApiResult<()> {
    let revision_id = state.store.revision();

    match state.media.remove_video().await {
        Ok(new_revision) => success((), new_revision),
        Err(e) => error(e, revision_id),
    }
}
