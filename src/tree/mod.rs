//! Directory tree building
//!
//! `read_directory` lists a single level. `TreeBuilder` walks from a root
//! into an owned `TreeNode`, filling per-entry metadata as `ComputeOpts`
//! asks and measuring or cache-filling directories it does not descend.

mod builder;
mod config;
mod filter;
mod node;
pub(crate) mod reader;
pub mod utils;

pub use builder::{PrunePatterns, SkipPredicate, TreeBuilder};
pub use config::{BuildOpts, ComputeOpts, SortMode};
pub use filter::list_children;
pub use node::TreeNode;
pub use reader::{read_directory, sort_entries, stat_entry};
pub use utils::format_size;
