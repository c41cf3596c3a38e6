//! ltree - an enriched directory lister and interactive tree browser
//!
//! Listings carry git status, content metadata (line counts, megapixels,
//! durations, page counts) and recursive sizes. Sizes of large directories
//! come from a cache precomputed by the `l-sizes` worker.

pub mod config;
pub mod entry;
pub mod error;
pub mod file_utils;
pub mod filetype;
pub mod git;
pub mod icons;
pub mod metadata;
pub mod output;
pub mod probes;
pub mod select;
pub mod sizes;
pub mod stats;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod tree;

pub use config::Config;
pub use entry::{ContentKind, FileEntry, FileKind, GitFields};
pub use error::{Error, Result};
pub use filetype::FileTypes;
pub use git::{Git2Cache, GitCache, NoGit};
pub use icons::Icons;
pub use output::{Format, OutputConfig, TreePrinter, Visibility, print_json};
pub use sizes::{SizeCache, SizeCacheBuilder};
pub use stats::{Summary, print_summary};
pub use tree::{BuildOpts, ComputeOpts, PrunePatterns, SkipPredicate, SortMode, TreeBuilder, TreeNode};
