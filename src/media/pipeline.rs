//! Upload ingest and media deletion.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;

use super::imaging::{optimize_jpeg, FillBox, PHOTO_BOX, TIMELINE_BOX};
use super::naming::{generate_filename, is_safe_filename, OPTIMIZED_PREFIX, TIMELINE_PREFIX};
use super::MediaDirs;
use crate::errors::AppError;
use crate::models::{Photo, MAX_PHOTOS};
use crate::store::ContentStore;

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    fn require_kind(&self, prefix: &str) -> Result<(), AppError> {
        if self.content_type.starts_with(prefix) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "{} is {}, expected {}* file",
                display_name(&self.file_name),
                self.content_type,
                prefix
            )))
        }
    }
}

/// Stores uploads on disk and records them in the content document.
pub struct MediaPipeline {
    dirs: MediaDirs,
    store: Arc<ContentStore>,
}

impl MediaPipeline {
    pub fn new(dirs: MediaDirs, store: Arc<ContentStore>) -> Self {
        Self { dirs, store }
    }

    pub fn dirs(&self) -> &MediaDirs {
        &self.dirs
    }

    /// Store gallery photos with their optimized variants and append the
    /// records to the document. Fails without recording anything if the
    /// document would then hold more than [`MAX_PHOTOS`].
    pub async fn ingest_photos(
        &self,
        files: Vec<UploadedFile>,
        captions: &[String],
        dates: &[String],
    ) -> Result<(Vec<Photo>, u64), AppError> {
        if files.is_empty() {
            return Err(AppError::Validation("No files uploaded".to_string()));
        }
        for file in &files {
            file.require_kind("image/")?;
        }

        let mut written = Vec::new();
        match self
            .store_photos(files, captions, dates, &mut written)
            .await
        {
            Ok(result) => Ok(result),
            Err(e) => {
                discard(&written).await;
                Err(e)
            }
        }
    }

    async fn store_photos(
        &self,
        files: Vec<UploadedFile>,
        captions: &[String],
        dates: &[String],
        written: &mut Vec<PathBuf>,
    ) -> Result<(Vec<Photo>, u64), AppError> {
        let mut photos = Vec::with_capacity(files.len());

        for (i, file) in files.into_iter().enumerate() {
            let original = generate_filename(&file.file_name);
            let optimized = format!("{}{}", OPTIMIZED_PREFIX, original);

            let original_path = self.dirs.photos.join(&original);
            tokio::fs::write(&original_path, &file.bytes).await?;
            written.push(original_path);

            let jpeg = resize(file.bytes.clone(), PHOTO_BOX).await?;
            let optimized_path = self.dirs.photos.join(&optimized);
            tokio::fs::write(&optimized_path, &jpeg).await?;
            written.push(optimized_path);

            tracing::info!(
                original = %original,
                optimized = %optimized,
                bytes = file.bytes.len(),
                "Stored photo"
            );

            photos.push(Photo {
                original,
                optimized,
                caption: non_empty(captions.get(i)),
                date: non_empty(dates.get(i)).or_else(|| Some(today())),
            });
        }

        self.store
            .update_or_empty(move |content| {
                if content.photos.len() + photos.len() > MAX_PHOTOS {
                    return Err(AppError::Validation(format!(
                        "Maximum {} photos allowed ({} stored, {} uploaded)",
                        MAX_PHOTOS,
                        content.photos.len(),
                        photos.len()
                    )));
                }
                content.photos.extend(photos.iter().cloned());
                Ok(photos)
            })
            .await
    }

    /// Store the site video, replacing (and deleting) the previous one.
    pub async fn ingest_video(&self, file: UploadedFile) -> Result<(String, u64), AppError> {
        file.require_kind("video/")?;

        let filename = generate_filename(&file.file_name);
        let path = self.dirs.videos.join(&filename);
        tokio::fs::write(&path, &file.bytes).await?;

        let stored = filename.clone();
        let result = self
            .store
            .update_or_empty(move |content| Ok(content.video.replace(stored)))
            .await;

        let (previous, revision) = match result {
            Ok(r) => r,
            Err(e) => {
                discard(&[path]).await;
                return Err(e);
            }
        };

        if let Some(previous) = previous.filter(|p| *p != filename && is_safe_filename(p)) {
            discard(&[self.dirs.videos.join(previous)]).await;
        }

        tracing::info!(filename = %filename, bytes = file.bytes.len(), "Stored site video");
        Ok((filename, revision))
    }

    /// Resize a timeline image into the timeline directory. The caller links
    /// the returned name to its event.
    pub async fn ingest_timeline_image(
        &self,
        event_index: Option<usize>,
        file: UploadedFile,
    ) -> Result<String, AppError> {
        file.require_kind("image/")?;

        let jpeg = resize(file.bytes.clone(), TIMELINE_BOX).await?;
        let filename = format!("{}{}", TIMELINE_PREFIX, generate_filename(&file.file_name));
        tokio::fs::write(self.dirs.timeline.join(&filename), &jpeg).await?;

        tracing::info!(filename = %filename, event_index = ?event_index, "Stored timeline image");
        Ok(filename)
    }

    /// Store a timeline video as uploaded. The caller links the returned name
    /// to its event.
    pub async fn ingest_timeline_video(
        &self,
        event_index: Option<usize>,
        file: UploadedFile,
    ) -> Result<String, AppError> {
        file.require_kind("video/")?;

        let filename = generate_filename(&file.file_name);
        tokio::fs::write(self.dirs.timeline.join(&filename), &file.bytes).await?;

        tracing::info!(filename = %filename, event_index = ?event_index, "Stored timeline video");
        Ok(filename)
    }

    /// Delete a photo by either of its filenames. Deleting something that is
    /// already gone succeeds.
    pub async fn delete_photo(&self, filename: &str) -> Result<u64, AppError> {
        if !is_safe_filename(filename) {
            return Err(AppError::Validation(format!(
                "Invalid photo filename: {}",
                filename
            )));
        }

        remove_if_present(&self.dirs.photos.join(filename)).await?;

        let target = filename.to_string();
        let (removed, revision) = self
            .store
            .update(move |content| Ok(content.remove_photo(&target)))
            .await?;

        let siblings: Vec<PathBuf> = removed
            .iter()
            .flat_map(|p| [p.original.as_str(), p.optimized.as_str()])
            .filter(|name| *name != filename && is_safe_filename(name))
            .map(|name| self.dirs.photos.join(name))
            .collect();
        discard(&siblings).await;

        tracing::info!(filename = %filename, records = removed.len(), "Deleted photo");
        Ok(revision)
    }

    /// Delete every photo in the document along with its files.
    pub async fn clear_photos(&self) -> Result<(usize, u64), AppError> {
        let (removed, revision) = self
            .store
            .update(|content| Ok(std::mem::take(&mut content.photos)))
            .await?;

        let files: Vec<PathBuf> = removed
            .iter()
            .flat_map(|p| [p.original.as_str(), p.optimized.as_str()])
            .filter(|name| is_safe_filename(name))
            .map(|name| self.dirs.photos.join(name))
            .collect();
        discard(&files).await;

        tracing::info!(count = removed.len(), "Cleared photos");
        Ok((removed.len(), revision))
    }

    /// Unset the site video and delete its file.
    pub async fn remove_video(&self) -> Result<u64, AppError> {
        let (previous, revision) = self
            .store
            .update(|content| Ok(content.video.take()))
            .await?;

        if let Some(previous) = previous.filter(|p| is_safe_filename(p)) {
            discard(&[self.dirs.videos.join(&previous)]).await;
            tracing::info!(filename = %previous, "Removed site video");
        }
        Ok(revision)
    }
}

async fn resize(bytes: Bytes, target: FillBox) -> Result<Vec<u8>, AppError> {
    tokio::task::spawn_blocking(move || optimize_jpeg(&bytes, target)).await?
}

/// Remove a file; a missing file is not an error.
async fn remove_if_present(path: &Path) -> Result<bool, AppError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Best-effort removal of files the caller no longer references.
async fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = remove_if_present(path).await {
            tracing::warn!(path = %path.display(), "Failed to remove file: {}", e);
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn today() -> String {
    chrono::Local::now().format("%-m/%-d/%Y").to_string()
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "upload"
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Content;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    struct Fixture {
        pipeline: MediaPipeline,
        store: Arc<ContentStore>,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ContentStore::new(dir.path().join("content.json")));
        let dirs = MediaDirs::new(&dir.path().join("uploads"));
        dirs.ensure().await.unwrap();
        Fixture {
            pipeline: MediaPipeline::new(dirs, store.clone()),
            store,
            _dir: dir,
        }
    }

    fn jpeg(name: &str, width: u32, height: u32) -> UploadedFile {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 120, 200])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        UploadedFile {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: Bytes::from(buf.into_inner()),
        }
    }

    fn file(name: &str, content_type: &str, bytes: &'static [u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from_static(bytes),
        }
    }

    fn dir_len(path: &Path) -> usize {
        std::fs::read_dir(path).unwrap().count()
    }

    #[tokio::test]
    async fn test_ingest_photos_stores_both_variants() {
        let fx = fixture().await;

        let (photos, _) = fx
            .pipeline
            .ingest_photos(
                vec![jpeg("a.jpg", 1000, 800), jpeg("b.jpg", 640, 480)],
                &["First".to_string()],
                &[String::new(), "1/2/2024".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].caption.as_deref(), Some("First"));
        assert!(photos[0].date.is_some());
        assert_eq!(photos[1].caption, None);
        assert_eq!(photos[1].date.as_deref(), Some("1/2/2024"));

        let photos_dir = &fx.pipeline.dirs().photos;
        for photo in &photos {
            assert!(photo.optimized.starts_with("opt-"));
            assert!(photos_dir.join(&photo.original).exists());
            assert!(photos_dir.join(&photo.optimized).exists());
        }
        assert_eq!(fx.store.read().await.unwrap().photos, photos);
    }

    #[tokio::test]
    async fn test_ingest_photos_rejects_non_images_before_writing() {
        let fx = fixture().await;
        let before = fx.store.read().await.unwrap();

        let err = fx
            .pipeline
            .ingest_photos(
                vec![jpeg("a.jpg", 50, 50), file("notes.txt", "text/plain", b"hi")],
                &[],
                &[],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(dir_len(&fx.pipeline.dirs().photos), 0);
        assert_eq!(fx.store.read().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_failed_resize_removes_written_files() {
        let fx = fixture().await;

        let err = fx
            .pipeline
            .ingest_photos(
                vec![jpeg("good.jpg", 50, 50), file("bad.jpg", "image/jpeg", b"garbage")],
                &[],
                &[],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Media(_)));
        assert_eq!(dir_len(&fx.pipeline.dirs().photos), 0);
        assert!(fx.store.read().await.unwrap().photos.is_empty());
    }

    #[tokio::test]
    async fn test_photo_ceiling_checked_under_lock() {
        let fx = fixture().await;
        let stored: Vec<Photo> = (0..MAX_PHOTOS - 1)
            .map(|i| Photo {
                original: format!("{}.jpg", i),
                optimized: format!("opt-{}.jpg", i),
                caption: None,
                date: None,
            })
            .collect();
        fx.store
            .write(&Content {
                photos: stored,
                ..Content::default()
            })
            .await
            .unwrap();

        let err = fx
            .pipeline
            .ingest_photos(vec![jpeg("a.jpg", 40, 40), jpeg("b.jpg", 40, 40)], &[], &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(dir_len(&fx.pipeline.dirs().photos), 0);
        assert_eq!(fx.store.read().await.unwrap().photos.len(), MAX_PHOTOS - 1);
    }

    #[tokio::test]
    async fn test_concurrent_batches_respect_ceiling() {
        let fx = fixture().await;
        let batch = || (0..20).map(|i| jpeg(&format!("{}.jpg", i), 30, 30)).collect::<Vec<_>>();

        let (first, second) = tokio::join!(
            fx.pipeline.ingest_photos(batch(), &[], &[]),
            fx.pipeline.ingest_photos(batch(), &[], &[]),
        );

        assert!(first.is_ok() != second.is_ok());
        let stored = fx.store.read().await.unwrap().photos.len();
        assert_eq!(stored, 20);
        assert_eq!(dir_len(&fx.pipeline.dirs().photos), stored * 2);
    }

    #[tokio::test]
    async fn test_video_replacement_deletes_previous_file() {
        let fx = fixture().await;

        let (first, _) = fx
            .pipeline
            .ingest_video(file("one.mp4", "video/mp4", b"first"))
            .await
            .unwrap();
        let (second, _) = fx
            .pipeline
            .ingest_video(file("two.webm", "video/webm", b"second"))
            .await
            .unwrap();

        let videos = &fx.pipeline.dirs().videos;
        assert!(!videos.join(&first).exists());
        assert!(videos.join(&second).exists());
        assert_eq!(fx.store.read().await.unwrap().video, Some(second));

        let err = fx
            .pipeline
            .ingest_video(file("pic.png", "image/png", b"x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_timeline_uploads_do_not_touch_document() {
        let fx = fixture().await;
        let before = fx.store.read().await.unwrap();

        let image = fx
            .pipeline
            .ingest_timeline_image(Some(0), jpeg("t.png", 900, 900))
            .await
            .unwrap();
        let video = fx
            .pipeline
            .ingest_timeline_video(Some(1), file("t.mov", "video/quicktime", b"mov"))
            .await
            .unwrap();

        let timeline = &fx.pipeline.dirs().timeline;
        assert!(image.starts_with("timeline-"));
        let stored = image::load_from_memory(&std::fs::read(timeline.join(&image)).unwrap()).unwrap();
        assert_eq!((stored.width(), stored.height()), (400, 300));
        assert!(video.ends_with(".mov"));
        assert_eq!(std::fs::read(timeline.join(&video)).unwrap(), b"mov");
        assert_eq!(dir_len(timeline), 2);

        assert_eq!(fx.store.read().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_photo_is_idempotent() {
        let fx = fixture().await;
        let (photos, _) = fx
            .pipeline
            .ingest_photos(vec![jpeg("a.jpg", 100, 100)], &[], &[])
            .await
            .unwrap();
        let photo = &photos[0];

        fx.pipeline.delete_photo(&photo.optimized).await.unwrap();
        let after_first = fx.store.read().await.unwrap();
        assert!(after_first.photos.is_empty());
        assert_eq!(dir_len(&fx.pipeline.dirs().photos), 0);

        fx.pipeline.delete_photo(&photo.optimized).await.unwrap();
        assert_eq!(fx.store.read().await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn test_delete_photo_rejects_paths() {
        let fx = fixture().await;
        let err = fx.pipeline.delete_photo("../content.json").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_clear_photos_and_remove_video() {
        let fx = fixture().await;
        fx.pipeline
            .ingest_photos(vec![jpeg("a.jpg", 60, 40), jpeg("b.jpg", 60, 40)], &[], &[])
            .await
            .unwrap();
        fx.pipeline
            .ingest_video(file("v.mp4", "video/mp4", b"v"))
            .await
            .unwrap();

        let (count, _) = fx.pipeline.clear_photos().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(dir_len(&fx.pipeline.dirs().photos), 0);

        fx.pipeline.remove_video().await.unwrap();
        assert_eq!(dir_len(&fx.pipeline.dirs().videos), 0);

        let content = fx.store.read().await.unwrap();
        assert_eq!(
            content,
            Content {
                photos: vec![],
                video: None,
                ..Content::seeded()
            }
        );
    }
}
