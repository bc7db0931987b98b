//! Timeline event model.
//!
//! On the wire an event is `{ title, content?, type, image?, video? }`. In
//! memory the `type` tag and the media slot it selects are one enum value, so
//! an image event can never carry a video reference and vice versa.

use serde::{Deserialize, Serialize};

/// A titled timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTimelineEvent", into = "RawTimelineEvent")]
pub struct TimelineEvent {
    pub title: String,
    pub content: Option<String>,
    pub media: TimelineMedia,
}

/// Event type together with the media slot that type uses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimelineMedia {
    #[default]
    Text,
    Image { image: Option<String> },
    Video { video: Option<String> },
    TextImage { image: Option<String> },
    TextVideo { video: Option<String> },
}

/// Wire-level tag for [`TimelineMedia`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    #[default]
    Text,
    Image,
    Video,
    TextImage,
    TextVideo,
}

impl TimelineEvent {
    pub fn text(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: Some(content.to_string()),
            media: TimelineMedia::Text,
        }
    }
}

impl TimelineMedia {
    pub fn kind(&self) -> TimelineKind {
        match self {
            TimelineMedia::Text => TimelineKind::Text,
            TimelineMedia::Image { .. } => TimelineKind::Image,
            TimelineMedia::Video { .. } => TimelineKind::Video,
            TimelineMedia::TextImage { .. } => TimelineKind::TextImage,
            TimelineMedia::TextVideo { .. } => TimelineKind::TextVideo,
        }
    }

    /// Image filename, for the types that show one.
    pub fn image(&self) -> Option<&str> {
        match self {
            TimelineMedia::Image { image } | TimelineMedia::TextImage { image } => image.as_deref(),
            _ => None,
        }
    }

    /// Video filename, for the types that show one.
    pub fn video(&self) -> Option<&str> {
        match self {
            TimelineMedia::Video { video } | TimelineMedia::TextVideo { video } => video.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTimelineEvent {
    #[serde(default)]
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(rename = "type", default)]
    kind: TimelineKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    video: Option<String>,
}

impl From<RawTimelineEvent> for TimelineEvent {
    fn from(raw: RawTimelineEvent) -> Self {
        let media = match raw.kind {
            TimelineKind::Text => TimelineMedia::Text,
            TimelineKind::Image => TimelineMedia::Image { image: raw.image },
            TimelineKind::Video => TimelineMedia::Video { video: raw.video },
            TimelineKind::TextImage => TimelineMedia::TextImage { image: raw.image },
            TimelineKind::TextVideo => TimelineMedia::TextVideo { video: raw.video },
        };
        Self {
            title: raw.title,
            content: raw.content,
            media,
        }
    }
}

impl From<TimelineEvent> for RawTimelineEvent {
    fn from(event: TimelineEvent) -> Self {
        Self {
            kind: event.media.kind(),
            image: event.media.image().map(str::to_string),
            video: event.media.video().map(str::to_string),
            title: event.title,
            content: event.content,
        }
    }
}
