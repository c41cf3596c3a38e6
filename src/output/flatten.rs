//! Flat, row-per-entry projection of one or more trees

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::tree::TreeNode;

use super::visibility::Visibility;

/// Directories that may be collapsed at once.
pub const COLLAPSED_CAPACITY: usize = 4096;

/// One visible row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatNode {
    /// Index of the tree this row belongs to.
    pub root: usize,
    /// Child indices from that tree's root down to this node.
    pub index_path: Vec<usize>,
    pub depth: usize,
    pub has_visible_children: bool,
    /// Entry `i` is true when the ancestor at depth `i + 1` (the row itself
    /// for the last entry) has a later visible sibling.
    pub continuation: Vec<bool>,
}

impl FlatNode {
    pub fn node<'t>(&self, roots: &'t [TreeNode]) -> Option<&'t TreeNode> {
        roots.get(self.root)?.get(&self.index_path)
    }

    pub fn node_mut<'t>(&self, roots: &'t mut [TreeNode]) -> Option<&'t mut TreeNode> {
        roots.get_mut(self.root)?.get_mut(&self.index_path)
    }

    /// Guide glyphs drawn before the icon.
    pub fn guides(&self) -> String {
        let Some((own, ancestors)) = self.continuation.split_last() else {
            return String::new();
        };
        let mut out = String::with_capacity(4 * self.continuation.len());
        for &more in ancestors {
            out.push_str(if more { "│   " } else { "    " });
        }
        out.push_str(if *own { "├── " } else { "└── " });
        out
    }
}

/// Directories the user folded away, by path.
#[derive(Debug, Clone, Default)]
pub struct Collapsed {
    paths: HashSet<PathBuf>,
}

impl Collapsed {
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Returns false when the set is full and `path` was not added.
    pub fn insert(&mut self, path: &Path) -> bool {
        if self.paths.len() >= COLLAPSED_CAPACITY && !self.contains(path) {
            log::debug!("collapsed set full, ignoring {}", path.display());
            return false;
        }
        self.paths.insert(path.to_path_buf());
        true
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.paths.remove(path)
    }

    pub fn toggle(&mut self, path: &Path) {
        if !self.remove(path) {
            self.insert(path);
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Depth-first rows of `roots`. Roots are always emitted; collapsed
/// directories are emitted without their children.
pub fn flatten(roots: &[TreeNode], collapsed: &Collapsed, visibility: &Visibility) -> Vec<FlatNode> {
    let mut rows = Vec::new();
    for (root_index, root) in roots.iter().enumerate() {
        let mut index_path = Vec::new();
        let mut continuation = Vec::new();
        emit(
            &mut rows,
            root,
            root_index,
            &mut index_path,
            &mut continuation,
            collapsed,
            visibility,
        );
    }
    rows
}

fn emit(
    rows: &mut Vec<FlatNode>,
    node: &TreeNode,
    root: usize,
    index_path: &mut Vec<usize>,
    continuation: &mut Vec<bool>,
    collapsed: &Collapsed,
    visibility: &Visibility,
) {
    let visible: Vec<usize> = node
        .children
        .iter()
        .enumerate()
        .filter(|(_, c)| visibility.is_visible(c))
        .map(|(i, _)| i)
        .collect();
    let is_collapsed = node.is_dir() && collapsed.contains(node.path());

    rows.push(FlatNode {
        root,
        index_path: index_path.clone(),
        depth: index_path.len(),
        has_visible_children: if is_collapsed {
            !node.children.is_empty()
        } else {
            !visible.is_empty()
        },
        continuation: continuation.clone(),
    });
    if is_collapsed {
        return;
    }

    for (n, &i) in visible.iter().enumerate() {
        index_path.push(i);
        continuation.push(n + 1 < visible.len());
        emit(
            rows,
            &node.children[i],
            root,
            index_path,
            continuation,
            collapsed,
            visibility,
        );
        continuation.pop();
        index_path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{FileEntry, FileKind};

    fn file(path: &str) -> TreeNode {
        let mut entry = FileEntry::unknown(PathBuf::from(path));
        entry.kind = FileKind::File;
        TreeNode::new(entry)
    }

    fn dir(path: &str, children: Vec<TreeNode>) -> TreeNode {
        let mut entry = FileEntry::unknown(PathBuf::from(path));
        entry.kind = FileKind::Dir;
        let mut n = TreeNode::new(entry);
        n.children = children;
        n.was_expanded = true;
        n
    }

    fn sample() -> Vec<TreeNode> {
        vec![
            dir(
                "/r",
                vec![
                    dir("/r/a", vec![file("/r/a/x"), file("/r/a/y")]),
                    file("/r/b"),
                    dir("/r/.hidden", vec![file("/r/.hidden/z")]),
                ],
            ),
            dir("/s", vec![file("/s/c")]),
        ]
    }

    fn paths(rows: &[FlatNode], roots: &[TreeNode]) -> Vec<String> {
        rows.iter()
            .map(|r| r.node(roots).unwrap().path().display().to_string())
            .collect()
    }

    #[test]
    fn test_flatten_order_and_guides() {
        let roots = sample();
        let rows = flatten(&roots, &Collapsed::default(), &Visibility::default());
        assert_eq!(
            paths(&rows, &roots),
            vec!["/r", "/r/a", "/r/a/x", "/r/a/y", "/r/b", "/s", "/s/c"]
        );
        assert_eq!(rows[0].guides(), "");
        assert_eq!(rows[1].guides(), "├── ");
        assert_eq!(rows[2].guides(), "│   ├── ");
        assert_eq!(rows[3].guides(), "│   └── ");
        assert_eq!(rows[4].guides(), "└── ");
        assert_eq!(rows[6].root, 1);
        assert!(rows[1].has_visible_children);
        assert!(!rows[4].has_visible_children);
    }

    #[test]
    fn test_flatten_is_pure() {
        let roots = sample();
        let collapsed = Collapsed::default();
        let vis = Visibility::default();
        assert_eq!(flatten(&roots, &collapsed, &vis), flatten(&roots, &collapsed, &vis));
    }

    #[test]
    fn test_collapse_and_toggle_twice() {
        let roots = sample();
        let vis = Visibility::default();
        let before = flatten(&roots, &Collapsed::default(), &vis);

        let mut collapsed = Collapsed::default();
        collapsed.toggle(Path::new("/r/a"));
        let folded = flatten(&roots, &collapsed, &vis);
        assert_eq!(folded.len(), before.len() - 2);
        assert!(folded[1].has_visible_children);

        collapsed.toggle(Path::new("/r/a"));
        assert!(collapsed.is_empty());
        assert_eq!(flatten(&roots, &collapsed, &vis), before);
    }

    #[test]
    fn test_collapsed_set_is_bounded() {
        let mut collapsed = Collapsed::default();
        for i in 0..COLLAPSED_CAPACITY {
            assert!(collapsed.insert(&PathBuf::from(format!("/d{i}"))));
        }
        assert!(!collapsed.insert(Path::new("/one-more")));
        assert!(collapsed.insert(Path::new("/d0")));
        assert_eq!(collapsed.len(), COLLAPSED_CAPACITY);
    }
}
