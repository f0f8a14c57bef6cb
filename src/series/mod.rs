//! Editing of an existing series: permissions, metadata, theme and feeds.

pub mod access;
pub mod metadata;
pub mod screen;
pub mod themes;

pub use access::{SaveOutcome, SeriesAccessEditor};
pub use screen::SeriesScreen;
pub use themes::ThemeSelection;
