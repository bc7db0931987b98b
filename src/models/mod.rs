//! Data models for the memory site.
//!
//! These models match the JSON document shape read by the public site and the admin panel.

mod content;
mod defaults;
mod timeline;

pub use content::*;
pub use defaults::*;
pub use timeline::*;
