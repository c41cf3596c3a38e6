//! Tree formatting and display
//!
//! The printer and the interactive selector share one pipeline: a built
//! tree is flattened into visible rows, columns are fitted to those rows and
//! each row is written with `write_row`.
//!
//! # Module Structure
//!
//! - `visibility` - Row filters (hidden, ignored, git-only, grep)
//! - `flatten` - Flat projection with tree guides and collapsed directories
//! - `columns` - Column slots, cell formatting and width fitting
//! - `tree` - Colored printer for listings
//! - `json` - JSON output

mod columns;
mod config;
mod flatten;
mod json;
mod tree;
mod visibility;

pub use columns::{Column, LONG_COLUMNS, Layout, SHORT_COLUMNS, SUMMARY_COLUMNS, pad};
pub use config::{Format, OutputConfig};
pub use flatten::{COLLAPSED_CAPACITY, Collapsed, FlatNode, flatten};
pub use json::{print_json, to_json};
pub use tree::{TreePrinter, write_row};
pub use visibility::Visibility;
