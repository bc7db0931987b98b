//! Seed content written on first read, and the named color palettes.

use super::{Colors, Content, Messages, TimelineEvent};

const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("heroTitle", "Happy Birthday Bryan!"),
    (
        "heroSubtitle",
        "Celebrating another amazing year of your incredible journey",
    ),
    ("galleryTitle", "Our Beautiful Memories"),
    (
        "gallerySubtitle",
        "A collection of moments that make life special",
    ),
    ("timelineTitle", "Our Journey Together"),
    (
        "timelineSubtitle",
        "Milestones and memories that shaped our story",
    ),
    ("messageTitle", "Happy Birthday, Bryan! 🎂"),
    (
        "messageText1",
        "You light up every room with your incredible energy and infectious smile.",
    ),
    (
        "messageText2",
        "Your kindness, humor, and zest for life inspire everyone around you.",
    ),
    (
        "messageText3",
        "May this new year bring you endless joy, exciting adventures, and all the success you deserve.",
    ),
    (
        "messageHighlight",
        "Here's to you, Bryan! May your special day be as amazing as you are! 🎉❤️",
    ),
];

const DEFAULT_TIMELINE: &[(&str, &str)] = &[
    (
        "The Beginning",
        "That special moment when everything started. A beautiful beginning to an incredible story filled with laughter, joy, and endless possibilities.",
    ),
    (
        "First Adventure",
        "Our first big adventure together - exploring new places, creating memories, and discovering what makes life truly special.",
    ),
    (
        "Milestone Moment",
        "Celebrating achievements and supporting each other through every step. These moments remind us of the strength we find together.",
    ),
    (
        "Today & Beyond",
        "Here's to your birthday and all the amazing moments yet to come. The best chapters of our story are still being written.",
    ),
];

/// Color slots in the order the admin panel lists them.
pub const COLOR_SLOTS: [&str; 9] = [
    "primaryColor",
    "secondaryColor",
    "accentColor",
    "heroTextColor",
    "sectionTitleColor",
    "messageTextColor",
    "timelineDotColor",
    "timelineLineColor",
    "timelineTextColor",
];

/// Named palettes, values listed in [`COLOR_SLOTS`] order.
const PRESETS: &[(&str, [&str; 9])] = &[
    (
        "default",
        [
            "#6366f1", "#8b5cf6", "#f59e0b", "#6366f1", "#6366f1", "#f59e0b", "#6366f1",
            "#6366f1", "#f8fafc",
        ],
    ),
    (
        "romantic",
        [
            "#ec4899", "#f472b6", "#fb7185", "#ec4899", "#ec4899", "#fb7185", "#ec4899",
            "#f472b6", "#fdf2f8",
        ],
    ),
    (
        "elegant",
        [
            "#1f2937", "#374151", "#d4af37", "#1f2937", "#1f2937", "#d4af37", "#1f2937",
            "#374151", "#f9fafb",
        ],
    ),
    (
        "vibrant",
        [
            "#ef4444", "#f97316", "#eab308", "#ef4444", "#ef4444", "#eab308", "#ef4444",
            "#f97316", "#fffbeb",
        ],
    ),
];

/// Look up a palette by name.
pub fn color_preset(name: &str) -> Option<Colors> {
    PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, values)| palette(values))
}

/// All palettes keyed by name.
pub fn color_presets() -> Vec<(&'static str, Colors)> {
    PRESETS
        .iter()
        .map(|(name, values)| (*name, palette(values)))
        .collect()
}

fn palette(values: &[&str; 9]) -> Colors {
    COLOR_SLOTS
        .iter()
        .zip(values.iter())
        .map(|(slot, value)| (slot.to_string(), value.to_string()))
        .collect()
}

impl Content {
    /// The document written when none exists yet.
    pub fn seeded() -> Self {
        let messages: Messages = DEFAULT_MESSAGES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            photos: Vec::new(),
            video: None,
            timeline: DEFAULT_TIMELINE
                .iter()
                .map(|(title, content)| TimelineEvent::text(title, content))
                .collect(),
            messages,
            colors: color_preset("default").unwrap_or_default(),
        }
    }
}
