//! Multipart upload endpoints.

use axum::body::Bytes;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use serde::Serialize;

use super::{error, uploaded, UploadResult};
use crate::errors::AppError;
use crate::media::UploadedFile;
use crate::models::{Photo, StoredFile, MAX_PHOTOS};
use crate::AppState;

/// Body of a gallery upload response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPhotos {
    pub files: Vec<Photo>,
}

/// Fields collected from one multipart request.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    captions: Vec<String>,
    dates: Vec<String>,
    event_index: Option<usize>,
}

impl UploadForm {
    /// Read every part, keeping files sent under `file_field`. Each file may
    /// be at most `max_file_size` bytes.
    async fn read(
        mut multipart: Multipart,
        file_field: &str,
        max_file_size: usize,
    ) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();

            if name == file_field {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = read_limited(field, &file_name, max_file_size).await?;
                form.files.push(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            } else if let Some(slot) = indexed_slot(&name, "captions") {
                place(&mut form.captions, slot, field.text().await?)?;
            } else if let Some(slot) = indexed_slot(&name, "dates") {
                place(&mut form.dates, slot, field.text().await?)?;
            } else if name == "eventIndex" {
                let raw = field.text().await?;
                let index = raw.trim().parse::<usize>().map_err(|_| {
                    AppError::Validation(format!(
                        "eventIndex must be a non-negative integer, got {:?}",
                        raw
                    ))
                })?;
                form.event_index = Some(index);
            }
        }

        Ok(form)
    }

    fn single_file(mut self, what: &str) -> Result<(Option<usize>, UploadedFile), AppError> {
        match self.files.len() {
            0 => Err(AppError::Validation(format!("No {} provided", what))),
            1 => Ok((self.event_index, self.files.remove(0))),
            n => Err(AppError::Validation(format!(
                "Expected one {}, got {}",
                what, n
            ))),
        }
    }
}

/// Collect a file part, failing as soon as it grows past `limit`.
async fn read_limited(
    mut field: Field<'_>,
    file_name: &str,
    limit: usize,
) -> Result<Bytes, AppError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > limit {
            return Err(AppError::Validation(format!(
                "{} exceeds the {} byte file size limit",
                if file_name.is_empty() { "upload" } else { file_name },
                limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

/// `captions`, `captions[]` → append; `captions[3]` → index 3.
fn indexed_slot(name: &str, base: &str) -> Option<Option<usize>> {
    let rest = name.strip_prefix(base)?;
    if rest.is_empty() || rest == "[]" {
        return Some(None);
    }
    rest.strip_prefix('[')?
        .strip_suffix(']')?
        .parse::<usize>()
        .ok()
        .map(Some)
}

fn place(values: &mut Vec<String>, slot: Option<usize>, value: String) -> Result<(), AppError> {
    let index = slot.unwrap_or(values.len());
    if index >= MAX_PHOTOS {
        return Err(AppError::Validation(format!(
            "Field index {} exceeds the {} photo limit",
            index, MAX_PHOTOS
        )));
    }
    if values.len() <= index {
        values.resize(index + 1, String::new());
    }
    values[index] = value;
    Ok(())
}

/// POST /upload/photos - Upload gallery photos.
pub async fn upload_photos(
    State(state): State<AppState>,
    multipart: Multipart,
) -> UploadResult<UploadedPhotos> {
    let revision_id = state.store.revision();
    let max_file_size = state.config.upload_max_size;

    let form = match UploadForm::read(multipart, "photos", max_file_size).await {
        Ok(form) => form,
        Err(e) => return error(e, revision_id),
    };

    if form.files.len() > MAX_PHOTOS {
        return error(
            AppError::Validation(format!("Maximum {} photos per upload", MAX_PHOTOS)),
            revision_id,
        );
    }

    // Early rejection before any file is written. Ingest checks again under
    // the store lock. The store may be unreadable; ingest falls back to an
    // empty document then.
    let existing = state
        .store
        .read()
        .await
        .map(|c| c.photos.len())
        .unwrap_or(0);
    if existing + form.files.len() > MAX_PHOTOS {
        return error(
            AppError::Validation(format!(
                "Maximum {} photos allowed ({} stored, {} uploaded)",
                MAX_PHOTOS,
                existing,
                form.files.len()
            )),
            revision_id,
        );
    }

    match state
        .media
        .ingest_photos(form.files, &form.captions, &form.dates)
        .await
    {
        Ok((files, new_revision)) => uploaded(UploadedPhotos { files }, new_revision),
        Err(e) => error(e, revision_id),
    }
}

/// POST /upload/video - Upload the site video.
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> UploadResult<StoredFile> {
    let revision_id = state.store.revision();
    let max_file_size = state.config.upload_max_size;

    let result = match UploadForm::read(multipart, "video", max_file_size).await {
        Ok(form) => form.single_file("video file"),
        Err(e) => Err(e),
    };
    let file = match result {
        Ok((_, file)) => file,
        Err(e) => return error(e, revision_id),
    };

    match state.media.ingest_video(file).await {
        Ok((filename, new_revision)) => uploaded(StoredFile { filename }, new_revision),
        Err(e) => error(e, revision_id),
    }
}

/// POST /upload/timeline - Upload an image for a timeline event.
pub async fn upload_timeline_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> UploadResult<StoredFile> {
    let revision_id = state.store.revision();
    let max_file_size = state.config.upload_max_size;

    let result = match UploadForm::read(multipart, "timelineImage", max_file_size).await {
        Ok(form) => form.single_file("timeline image"),
        Err(e) => Err(e),
    };
    let (event_index, file) = match result {
        Ok(parts) => parts,
        Err(e) => return error(e, revision_id),
    };

    match state.media.ingest_timeline_image(event_index, file).await {
        Ok(filename) => uploaded(StoredFile { filename }, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /upload/timeline-video - Upload a video for a timeline event.
pub async fn upload_timeline_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> UploadResult<StoredFile> {
    let revision_id = state.store.revision();
    let max_file_size = state.config.upload_max_size;

    let result = match UploadForm::read(multipart, "timelineVideo", max_file_size).await {
        Ok(form) => form.single_file("timeline video"),
        Err(e) => Err(e),
    };
    let (event_index, file) = match result {
        Ok(parts) => parts,
        Err(e) => return error(e, revision_id),
    };

    match state.media.ingest_timeline_video(event_index, file).await {
        Ok(filename) => uploaded(StoredFile { filename }, revision_id),
        Err(e) => error(e, revision_id),
    }
}
