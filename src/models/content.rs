//! Content document model: the single aggregate holding all site state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TimelineEvent;

/// Upper bound on stored photos.
pub const MAX_PHOTOS: usize = 30;

/// Text field name → text, e.g. `heroTitle`.
pub type Messages = BTreeMap<String, String>;

/// Color slot name → CSS color, e.g. `primaryColor`.
pub type Colors = BTreeMap<String, String>;

/// The root content document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub messages: Messages,
    #[serde(default)]
    pub colors: Colors,
}

impl Content {
    /// Remove every photo whose original or optimized name equals `filename`.
    /// Returns the removed records.
    pub fn remove_photo(&mut self, filename: &str) -> Vec<Photo> {
        let (removed, kept): (Vec<Photo>, Vec<Photo>) = std::mem::take(&mut self.photos)
            .into_iter()
            .partition(|p| p.matches(filename));
        self.photos = kept;
        removed
    }
}

/// An uploaded gallery photo. Identity is the optimized filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub original: String,
    pub optimized: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Photo {
    pub fn matches(&self, filename: &str) -> bool {
        self.original == filename || self.optimized == filename
    }
}

/// Response body for single-file uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub filename: String,
}
