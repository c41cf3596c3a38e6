//! Which rows of a built tree are shown

use regex::Regex;

use crate::entry::FileEntry;
use crate::tree::TreeNode;

/// Row filters applied on top of what the builder listed.
///
/// Hidden and git-ignored entries are excluded outright. The `git_only` and
/// `grep` filters keep a directory whenever something below it passes.
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    pub show_hidden: bool,
    pub show_ignored: bool,
    /// Only entries that differ from HEAD.
    pub git_only: bool,
    /// Names must match this pattern.
    pub grep: Option<Regex>,
}

impl Visibility {
    /// Everything passes.
    pub fn all() -> Self {
        Self {
            show_hidden: true,
            show_ignored: true,
            ..Self::default()
        }
    }

    fn excluded(&self, entry: &FileEntry) -> bool {
        (!self.show_hidden && entry.is_hidden()) || (!self.show_ignored && entry.git.ignored())
    }

    fn matches(&self, entry: &FileEntry) -> bool {
        if self.git_only && !entry.git.is_dirty() {
            return false;
        }
        self.grep.as_ref().is_none_or(|re| re.is_match(&entry.name))
    }

    pub fn is_visible(&self, node: &TreeNode) -> bool {
        if self.excluded(&node.entry) {
            return false;
        }
        self.matches(&node.entry) || node.children.iter().any(|c| self.is_visible(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FileKind;
    use crate::git::GitStatus;
    use std::path::PathBuf;

    fn node(name: &str, children: Vec<TreeNode>) -> TreeNode {
        let mut entry = FileEntry::unknown(PathBuf::from(name));
        entry.kind = if children.is_empty() {
            FileKind::File
        } else {
            FileKind::Dir
        };
        let mut n = TreeNode::new(entry);
        n.children = children;
        n
    }

    fn with_status(mut n: TreeNode, code: &str) -> TreeNode {
        n.entry.git.status = Some(GitStatus {
            code: code.to_string(),
            ignored: code == "!!",
            diff_added: 0,
            diff_removed: 0,
        });
        n
    }

    #[test]
    fn test_hidden_and_ignored() {
        let vis = Visibility::default();
        assert!(!vis.is_visible(&node(".env", vec![])));
        assert!(!vis.is_visible(&with_status(node("build.log", vec![]), "!!")));
        assert!(vis.is_visible(&node("main.rs", vec![])));
        assert!(Visibility::all().is_visible(&node(".env", vec![])));
    }

    #[test]
    fn test_grep_keeps_ancestors() {
        let vis = Visibility {
            grep: Some(Regex::new(r"\.rs$").unwrap()),
            ..Visibility::default()
        };
        let tree = node("src", vec![node("main.rs", vec![]), node("notes.md", vec![])]);
        assert!(vis.is_visible(&tree));
        assert!(!vis.is_visible(&tree.children[1]));
        let docs = node("docs", vec![node("notes.md", vec![])]);
        assert!(!vis.is_visible(&docs));
    }

    #[test]
    fn test_git_only() {
        let vis = Visibility {
            git_only: true,
            ..Visibility::default()
        };
        let tree = node(
            "src",
            vec![with_status(node("a.rs", vec![]), " M"), node("b.rs", vec![])],
        );
        assert!(vis.is_visible(&tree));
        assert!(vis.is_visible(&tree.children[0]));
        assert!(!vis.is_visible(&tree.children[1]));
    }
}
