//! Content store module for JSON document persistence.
//!
//! The single JSON document on disk is the source of truth for all site content.

mod content_store;

pub use content_store::*;

use std::path::Path;

/// Ensure the document's parent directory exists and open the store.
pub async fn init_store(content_path: &Path) -> Result<ContentStore, crate::errors::AppError> {
    if let Some(parent) = content_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    Ok(ContentStore::new(content_path.to_path_buf()))
}
