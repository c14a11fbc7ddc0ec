//! Data models for corpus records.
//!
//! Models use `#[serde(default)]` for optional fields so that rows from
//! loosely structured CSV/JSON exports deserialize without ceremony.

mod enums;
mod paper;

pub use enums::{CommunityMethod, ExportFormat, KeywordMode, ResponseFormat, TopicModelKind};
pub use paper::Paper;
