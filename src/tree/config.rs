//! Options for building trees

use std::path::PathBuf;

/// Which per-entry metadata the builder fills in. Every switch is independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeOpts {
    pub sizes: bool,
    pub file_counts: bool,
    pub line_counts: bool,
    pub media_info: bool,
    pub git_status: bool,
    pub git_diff: bool,
    pub type_stats: bool,
    pub git_repo_info: bool,
}

impl ComputeOpts {
    pub fn none() -> Self {
        Self::default()
    }

    /// Short listings: git status only.
    pub fn basic() -> Self {
        Self {
            git_status: true,
            ..Self::default()
        }
    }

    pub fn long() -> Self {
        Self {
            sizes: true,
            file_counts: true,
            line_counts: true,
            media_info: true,
            git_status: true,
            git_diff: true,
            ..Self::default()
        }
    }

    /// Long without diffs, plus type statistics and repository info.
    pub fn summary() -> Self {
        Self {
            git_diff: false,
            type_stats: true,
            git_repo_info: true,
            ..Self::long()
        }
    }

    /// Whether directory totals have to be walked for.
    pub fn needs_totals(&self) -> bool {
        self.sizes || self.file_counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    /// Directories first, then by name.
    #[default]
    None,
    /// Largest first.
    Size,
    /// Most recently modified first.
    Time,
    Name,
}

/// Traversal and presentation options for [`super::TreeBuilder`].
#[derive(Debug, Clone)]
pub struct BuildOpts {
    /// Levels below the root to list; `None` is unlimited.
    pub max_depth: Option<usize>,
    pub show_hidden: bool,
    pub skip_gitignored: bool,
    pub sort_by: SortMode,
    pub sort_reverse: bool,
    /// Anchor for relative paths and for ancestry trees.
    pub cwd: PathBuf,
    pub compute: ComputeOpts,
}

impl Default for BuildOpts {
    fn default() -> Self {
        Self {
            max_depth: Some(1),
            show_hidden: false,
            skip_gitignored: true,
            sort_by: SortMode::None,
            sort_reverse: false,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
            compute: ComputeOpts::basic(),
        }
    }
}
