//! Media ingest module.
//!
//! Uploaded files are classified by declared MIME type, stored under one of
//! three category directories, and (for images) re-encoded as a resized JPEG.
//!
//! ## Layout
//!
//! | Directory | Holds |
//! |---|---|
//! | `photos/` | gallery originals `<name>` and variants `opt-<name>` |
//! | `videos/` | the site video |
//! | `timeline/` | timeline images `timeline-<name>` and timeline videos |

mod imaging;
mod naming;
mod pipeline;

pub use imaging::*;
pub use naming::*;
pub use pipeline::*;

use std::path::{Path, PathBuf};

/// The three category directories under the uploads root.
#[derive(Debug, Clone)]
pub struct MediaDirs {
    pub photos: PathBuf,
    pub videos: PathBuf,
    pub timeline: PathBuf,
}

impl MediaDirs {
    pub fn new(root: &Path) -> Self {
        Self {
            photos: root.join("photos"),
            videos: root.join("videos"),
            timeline: root.join("timeline"),
        }
    }

    /// Create any missing directories.
    pub async fn ensure(&self) -> std::io::Result<()> {
        for dir in [&self.photos, &self.videos, &self.timeline] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }
}
