//! Output configuration types

use super::columns::{Column, LONG_COLUMNS, SHORT_COLUMNS, SUMMARY_COLUMNS};
use super::visibility::Visibility;

/// Listing style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Guides, icon and name.
    #[default]
    Short,
    /// Metadata columns before the name.
    Long,
    /// Long without diff columns, followed by totals.
    Summary,
}

impl Format {
    pub fn columns(self) -> &'static [Column] {
        match self {
            Format::Short => SHORT_COLUMNS,
            Format::Long => LONG_COLUMNS,
            Format::Summary => SUMMARY_COLUMNS,
        }
    }
}

/// Configuration for output formatting.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: Format,
    pub visibility: Visibility,
    pub use_color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: Format::Short,
            visibility: Visibility::default(),
            use_color: true,
        }
    }
}
