//! Read/write access to the content document.
//!
//! Writes always replace the whole document. Writers inside the process are
//! serialized by one async mutex; readers go straight to disk.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::Content;

/// File-backed store for the content document.
pub struct ContentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
    revision: AtomicU64,
}

impl ContentStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
            revision: AtomicU64::new(0),
        }
    }

    /// Current in-process revision; bumped by every successful write.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Read the document, seeding defaults if none exists yet.
    pub async fn read(&self) -> Result<Content, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => parse(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let _guard = self.write_lock.lock().await;
                self.load_or_seed().await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the whole document.
    pub async fn write(&self, content: &Content) -> Result<u64, AppError> {
        let _guard = self.write_lock.lock().await;
        self.persist(content).await?;
        Ok(self.bump())
    }

    /// Replace the whole document, refusing if `expected_revision` is stale.
    pub async fn replace(
        &self,
        content: &Content,
        expected_revision: Option<u64>,
    ) -> Result<u64, AppError> {
        let Some(expected) = expected_revision else {
            return self.write(content).await;
        };

        let _guard = self.write_lock.lock().await;
        let current = self.revision();
        if current != expected {
            return Err(AppError::Conflict {
                message: format!(
                    "Revision mismatch: expected {}, current {}",
                    expected, current
                ),
                current_revision: current,
            });
        }

        self.persist(content).await?;
        Ok(self.bump())
    }

    /// Locked read-modify-write. A failed read aborts the update.
    pub async fn update<T, F>(&self, f: F) -> Result<(T, u64), AppError>
    where
        F: FnOnce(&mut Content) -> Result<T, AppError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut content = self.load_or_seed().await?;
        self.apply(&mut content, f).await
    }

    /// Locked read-modify-write that starts from an empty document when the
    /// stored one cannot be read.
    pub async fn update_or_empty<T, F>(&self, f: F) -> Result<(T, u64), AppError>
    where
        F: FnOnce(&mut Content) -> Result<T, AppError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut content = match self.load_or_seed().await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Content unreadable, starting empty: {}", e);
                Content::default()
            }
        };
        self.apply(&mut content, f).await
    }

    async fn apply<T, F>(&self, content: &mut Content, f: F) -> Result<(T, u64), AppError>
    where
        F: FnOnce(&mut Content) -> Result<T, AppError>,
    {
        let value = f(content)?;
        self.persist(content).await?;
        Ok((value, self.bump()))
    }

    /// Caller must hold `write_lock`.
    async fn load_or_seed(&self) -> Result<Content, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => parse(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let content = Content::seeded();
                self.persist(&content).await?;
                tracing::info!(path = %self.path.display(), "Seeded default content");
                Ok(content)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a sibling temp file, then rename over the document.
    async fn persist(&self, content: &Content) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(content)
            .map_err(|e| AppError::Internal(format!("Failed to serialize content: {}", e)))?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "content.json".into());
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    fn bump(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }
}

fn parse(bytes: &[u8]) -> Result<Content, AppError> {
    serde_json::from_slice(bytes).map_err(|e| {
        tracing::error!("Content document is corrupt: {:?}", e);
        AppError::Storage(format!("Content document is corrupt: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Photo, TimelineEvent, TimelineMedia};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ContentStore {
        ContentStore::new(dir.path().join("content.json"))
    }

    fn photo(name: &str) -> Photo {
        Photo {
            original: name.to_string(),
            optimized: format!("opt-{}", name),
            caption: Some("caption".to_string()),
            date: None,
        }
    }

    #[tokio::test]
    async fn test_first_read_seeds_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let content = store.read().await.unwrap();
        assert_eq!(content, Content::seeded());
        assert!(dir.path().join("content.json").exists());
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut content = Content::default();
        content.photos.push(photo("1.jpg"));
        content.video = Some("clip.mp4".to_string());
        content.timeline.push(TimelineEvent {
            title: "Hike".to_string(),
            content: None,
            media: TimelineMedia::Image {
                image: Some("timeline-2.jpg".to_string()),
            },
        });
        content
            .messages
            .insert("heroTitle".to_string(), "Hi".to_string());

        let revision = store.write(&content).await.unwrap();
        assert_eq!(revision, 1);
        assert_eq!(store.read().await.unwrap(), content);
        assert!(!dir.path().join("content.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_storage_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("content.json"), b"{ not json").unwrap();
        let store = store_in(&dir);

        let err = store.read().await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));

        let err = store.update(|_| Ok(())).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[tokio::test]
    async fn test_update_or_empty_recovers_from_corruption() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("content.json"), b"[1, 2").unwrap();
        let store = store_in(&dir);

        let (_, revision) = store
            .update_or_empty(|c| {
                c.photos.push(photo("a.jpg"));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(revision, 1);
        let content = store.read().await.unwrap();
        assert_eq!(content.photos, vec![photo("a.jpg")]);
        assert!(content.messages.is_empty());
    }

    #[tokio::test]
    async fn test_failed_closure_leaves_document_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let before = store.read().await.unwrap();

        let result: Result<((), u64), AppError> = store
            .update(|c| {
                c.photos.push(photo("x.jpg"));
                Err(AppError::Validation("nope".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.read().await.unwrap(), before);
        assert_eq!(store.revision(), 0);
    }

    #[tokio::test]
    async fn test_replace_with_stale_revision_conflicts() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.replace(&Content::default(), Some(0)).await.unwrap();

        let err = store
            .replace(&Content::seeded(), Some(0))
            .await
            .unwrap_err();
        match err {
            AppError::Conflict {
                current_revision, ..
            } => assert_eq!(current_revision, 1),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(store.read().await.unwrap(), Content::default());
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(move |c| {
                        c.photos.push(photo(&format!("{}.jpg", i)));
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.read().await.unwrap().photos.len(), 16);
        assert_eq!(store.revision(), 16);
    }
}
