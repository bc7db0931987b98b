//! Stored filename generation and checks.

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

/// Prefix of a gallery photo's optimized variant.
pub const OPTIMIZED_PREFIX: &str = "opt-";

/// Prefix of a resized timeline image.
pub const TIMELINE_PREFIX: &str = "timeline-";

const MAX_EXTENSION_LEN: usize = 10;

/// `<unix-millis>-<random up to 9 digits><.ext>`, extension taken from the
/// client's filename and lower-cased.
pub fn generate_filename(original_name: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("{}-{}{}", millis, suffix, extension_of(original_name))
}

/// Lower-cased extension including the dot, or empty when absent or odd.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| {
            !e.is_empty()
                && e.len() <= MAX_EXTENSION_LEN
                && e.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// True for a bare file name that cannot escape its directory.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
