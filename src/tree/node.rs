//! The owned tree produced by the builder

use std::path::Path;

use serde::Serialize;

use crate::entry::FileEntry;

#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub entry: FileEntry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
    /// The builder tried to list this directory, even if it turned out empty.
    pub was_expanded: bool,
}

impl TreeNode {
    pub fn new(entry: FileEntry) -> Self {
        Self {
            entry,
            children: Vec::new(),
            was_expanded: false,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry.is_dir()
    }

    pub fn path(&self) -> &Path {
        &self.entry.path
    }

    /// Node reached by following child indices from here.
    pub fn get(&self, index_path: &[usize]) -> Option<&TreeNode> {
        let mut node = self;
        for &i in index_path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    pub fn get_mut(&mut self, index_path: &[usize]) -> Option<&mut TreeNode> {
        let mut node = self;
        for &i in index_path {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Depth-first search for the node at `path`.
    pub fn find(&self, path: &Path) -> Option<&TreeNode> {
        if self.entry.path == path {
            return Some(self);
        }
        if !path.starts_with(&self.entry.path) {
            return None;
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    /// Total nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }

    /// Pre-order walk with each node's depth below this one.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a TreeNode, usize)) {
        self.walk_at(0, f);
    }

    fn walk_at<'a>(&'a self, depth: usize, f: &mut impl FnMut(&'a TreeNode, usize)) {
        f(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn node(path: &str, children: Vec<TreeNode>) -> TreeNode {
        let mut n = TreeNode::new(FileEntry::unknown(PathBuf::from(path)));
        n.children = children;
        n
    }

    #[test]
    fn test_get_and_find() {
        let tree = node(
            "/r",
            vec![
                node("/r/a", vec![node("/r/a/x", vec![])]),
                node("/r/b", vec![]),
            ],
        );
        assert_eq!(tree.get(&[0, 0]).unwrap().path(), Path::new("/r/a/x"));
        assert!(tree.get(&[2]).is_none());
        assert_eq!(tree.find(Path::new("/r/b")).unwrap().entry.name, "b");
        assert!(tree.find(Path::new("/elsewhere")).is_none());
        assert_eq!(tree.count(), 4);

        let mut depths = Vec::new();
        tree.walk(&mut |n, d| depths.push((n.entry.name.clone(), d)));
        assert_eq!(depths[2], ("x".to_string(), 2));
    }
}
