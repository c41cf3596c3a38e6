//! TreeBuilder - walks the filesystem into an owned [`TreeNode`]

use std::path::{Component, Path, PathBuf};

use glob::Pattern;

use crate::entry::FileEntry;
use crate::error::{Error, Result};
use crate::git::GitCache;
use crate::metadata::annotate;
use crate::sizes::SizeCache;

use super::config::BuildOpts;
use super::filter::list_children;
use super::node::TreeNode;
use super::reader::{sort_entries, stat_entry};

/// Decides which directories are listed but never descended into.
///
/// The implementing value is the caller's context; the builder only borrows it.
pub trait SkipPredicate {
    fn skip(&self, entry: &FileEntry) -> bool;
}

impl<F> SkipPredicate for F
where
    F: Fn(&FileEntry) -> bool,
{
    fn skip(&self, entry: &FileEntry) -> bool {
        self(entry)
    }
}

/// Skips directories whose name matches any of a set of globs.
#[derive(Debug, Clone, Default)]
pub struct PrunePatterns {
    patterns: Vec<Pattern>,
}

impl PrunePatterns {
    pub fn new<S: AsRef<str>>(globs: &[S]) -> std::result::Result<Self, glob::PatternError> {
        let patterns = globs
            .iter()
            .map(|g| Pattern::new(g.as_ref()))
            .collect::<std::result::Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl SkipPredicate for PrunePatterns {
    fn skip(&self, entry: &FileEntry) -> bool {
        entry.is_dir() && self.patterns.iter().any(|p| p.matches(&entry.name))
    }
}

/// How far one listing goes and whether unlisted directories are measured.
#[derive(Debug, Clone, Copy)]
struct Walk {
    max_depth: Option<usize>,
    measure: bool,
}

impl Walk {
    fn at_max_depth(self, depth: usize) -> bool {
        self.max_depth.is_some_and(|max| depth >= max)
    }
}

/// Builds trees with per-entry metadata.
///
/// Directories beyond the depth limit are measured (when totals are
/// requested) without being materialised; a size-cache hit replaces both
/// the measurement and any listing.
pub struct TreeBuilder<'a> {
    opts: BuildOpts,
    git: &'a dyn GitCache,
    sizes: Option<&'a SizeCache>,
    skip: Option<&'a dyn SkipPredicate>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(opts: BuildOpts, git: &'a dyn GitCache) -> Self {
        Self {
            opts,
            git,
            sizes: None,
            skip: None,
        }
    }

    pub fn with_size_cache(mut self, sizes: &'a SizeCache) -> Self {
        self.sizes = Some(sizes);
        self
    }

    pub fn with_skip(mut self, skip: &'a dyn SkipPredicate) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn opts(&self) -> &BuildOpts {
        &self.opts
    }

    /// Build the tree rooted at `path`. The root keeps the name it was given by.
    pub fn build_tree(&self, path: &Path) -> Result<TreeNode> {
        let abs = self.absolute(path);
        let canonical = abs.canonicalize().map_err(|e| Error::io(path, e))?;
        let mut root = self.root_node(canonical, path.to_string_lossy().to_string());
        if root.is_dir() {
            self.list(&mut root, 0, self.full_walk())?;
        }
        Ok(root)
    }

    /// Tree from the working directory (or `/` when `path` lies elsewhere)
    /// down to the longest existing prefix of `path`. Only that chain is
    /// materialised; its siblings are unlisted stubs.
    pub fn build_ancestry_tree(&self, path: &Path) -> Result<TreeNode> {
        let target = self.absolute(path);
        let existing = target
            .ancestors()
            .find(|p| p.exists())
            .unwrap_or(Path::new("/"));
        let existing = existing.canonicalize().map_err(|e| Error::io(existing, e))?;

        let cwd = self
            .opts
            .cwd
            .canonicalize()
            .unwrap_or_else(|_| self.opts.cwd.clone());
        let (top, name) = if existing.starts_with(&cwd) {
            (cwd, ".".to_string())
        } else {
            (PathBuf::from("/"), "/".to_string())
        };

        let mut chain: Vec<&Path> = existing
            .ancestors()
            .take_while(|p| p.starts_with(&top))
            .collect();
        chain.reverse();

        let mut root = self.root_node(top.clone(), name);
        if root.is_dir() {
            self.list_ancestry(&mut root, chain.get(1..).unwrap_or_default())?;
        }
        Ok(root)
    }

    /// List one level below `node` if that has not been attempted yet.
    pub fn expand_node(&self, node: &mut TreeNode) -> Result<()> {
        if node.was_expanded || !node.is_dir() {
            return Ok(());
        }
        let walk = Walk {
            max_depth: Some(1),
            measure: true,
        };
        self.list(node, 0, walk)
    }

    fn full_walk(&self) -> Walk {
        Walk {
            max_depth: self.opts.max_depth,
            measure: true,
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.opts.cwd.join(path)
        };
        let mut out = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    out.pop();
                }
                other => out.push(other),
            }
        }
        out
    }

    fn root_node(&self, path: PathBuf, name: String) -> TreeNode {
        let mut entry = stat_entry(path);
        entry.name = name;
        annotate(&mut entry, self.git, &self.opts.compute);
        TreeNode::new(entry)
    }

    fn cached(&self, path: &Path) -> Option<(u64, u64)> {
        if !self.opts.compute.sizes {
            return None;
        }
        self.sizes?.lookup(path)
    }

    fn skipped(&self, entry: &FileEntry) -> bool {
        self.skip.is_some_and(|s| s.skip(entry))
    }

    /// Read the children of `node`, which sits at `depth`, then roll up totals.
    fn list(&self, node: &mut TreeNode, depth: usize, walk: Walk) -> Result<()> {
        node.was_expanded = true;
        let mut children = self.read_children(node)?;
        for child in &mut children {
            if child.is_dir() {
                self.descend(child, depth + 1, walk);
            }
        }
        self.finish(node, children);
        Ok(())
    }

    fn read_children(&self, node: &TreeNode) -> Result<Vec<TreeNode>> {
        let parent_dev = node.entry.dev;
        let paths = list_children(
            &node.entry.path,
            self.opts.show_hidden,
            self.opts.skip_gitignored,
        )?;
        Ok(paths
            .into_iter()
            .map(|path| self.child_node(path, parent_dev))
            .collect())
    }

    fn child_node(&self, path: PathBuf, parent_dev: u64) -> TreeNode {
        let mut entry = stat_entry(path);
        entry.is_mount_point = entry.is_dir() && entry.dev != parent_dev;
        annotate(&mut entry, self.git, &self.opts.compute);
        TreeNode::new(entry)
    }

    fn descend(&self, node: &mut TreeNode, depth: usize, walk: Walk) {
        if self.skipped(&node.entry) {
            return;
        }
        if let Some((size, files)) = self.cached(&node.entry.path) {
            node.entry.size = size;
            node.entry.file_count = files;
            return;
        }
        if !walk.at_max_depth(depth) {
            if let Err(e) = self.list(node, depth, walk) {
                log::debug!("cannot list {}: {}", node.entry.path.display(), e);
            }
            return;
        }
        if walk.measure && self.opts.compute.needs_totals() && !node.entry.is_mount_point {
            let (size, files) = self.measure(&node.entry.path, node.entry.dev);
            node.entry.size = size;
            node.entry.file_count = files;
        }
    }

    /// Recursive totals below `dir` under the same filters as a listing,
    /// staying on device `dev`.
    fn measure(&self, dir: &Path, dev: u64) -> (u64, u64) {
        let paths = match list_children(dir, self.opts.show_hidden, self.opts.skip_gitignored) {
            Ok(paths) => paths,
            Err(e) => {
                log::debug!("cannot measure {}: {}", dir.display(), e);
                return (0, 0);
            }
        };
        let (mut size, mut files) = (0, 0);
        for path in paths {
            let entry = stat_entry(path);
            if !entry.is_dir() {
                size += entry.size;
                files += 1;
                continue;
            }
            if self.skipped(&entry) {
                continue;
            }
            let totals = match self.cached(&entry.path) {
                Some(totals) => totals,
                None if entry.dev == dev => self.measure(&entry.path, dev),
                None => (0, 0),
            };
            size += totals.0;
            files += totals.1;
        }
        (size, files)
    }

    fn finish(&self, node: &mut TreeNode, mut children: Vec<TreeNode>) {
        sort_entries(&mut children, self.opts.sort_by, self.opts.sort_reverse, |n| &n.entry);
        node.children = children;
        if self.opts.compute.needs_totals() {
            roll_up(node);
        }
    }

    fn list_ancestry(&self, node: &mut TreeNode, rest: &[&Path]) -> Result<()> {
        let Some((next, rest)) = rest.split_first() else {
            return self.list(node, 0, self.full_walk());
        };
        node.was_expanded = true;
        let mut children = self.read_children(node)?;
        let index = match children.iter().position(|c| c.path() == *next) {
            Some(index) => index,
            None => {
                // Filtered out of the listing, but it is on the path.
                children.push(self.child_node(next.to_path_buf(), node.entry.dev));
                children.len() - 1
            }
        };
        for (i, child) in children.iter_mut().enumerate() {
            if i == index {
                if child.is_dir() {
                    self.list_ancestry(child, rest)?;
                }
            } else if child.is_dir() {
                let stub = Walk {
                    max_depth: Some(0),
                    measure: false,
                };
                self.descend(child, 1, stub);
            }
        }
        self.finish(node, children);
        Ok(())
    }
}

/// Set a listed directory's totals to the sums over its children.
fn roll_up(node: &mut TreeNode) {
    let (size, files) = node.children.iter().fold((0, 0), |(size, files), c| {
        let count = if c.is_dir() { c.entry.file_count } else { 1 };
        (size + c.entry.size, files + count)
    });
    node.entry.size = size;
    node.entry.file_count = files;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FileKind;
    use crate::git::NoGit;
    use crate::sizes::SizeCacheBuilder;
    use crate::test_utils::TestRepo;
    use crate::tree::{ComputeOpts, SortMode};

    fn opts(repo: &TestRepo, max_depth: Option<usize>, compute: ComputeOpts) -> BuildOpts {
        BuildOpts {
            max_depth,
            cwd: repo.path().to_path_buf(),
            compute,
            ..BuildOpts::default()
        }
    }

    fn sample() -> TestRepo {
        let repo = TestRepo::new();
        repo.add_file("top.txt", "12345");
        repo.add_file("src/main.rs", "fn main() {}\n");
        repo.add_file("src/lib/mod.rs", "// x\n");
        repo.add_file("src/lib/util.rs", "pub fn f() {}\n");
        repo.add_file("docs/readme.md", "# hi\n");
        repo.add_dir("empty");
        repo
    }

    fn child<'t>(node: &'t TreeNode, name: &str) -> &'t TreeNode {
        node.children
            .iter()
            .find(|c| c.entry.name == name)
            .unwrap_or_else(|| panic!("no child {name}"))
    }

    fn assert_sums(node: &TreeNode) {
        if !node.was_expanded {
            return;
        }
        let size: u64 = node.children.iter().map(|c| c.entry.size).sum();
        assert_eq!(node.entry.size, size, "size of {}", node.entry.name);
        for c in &node.children {
            if !c.is_dir() {
                assert_eq!(c.entry.file_count, 0);
            }
            assert_sums(c);
        }
    }

    #[test]
    fn test_sizes_roll_up() {
        let repo = sample();
        let git = NoGit;
        let builder = TreeBuilder::new(opts(&repo, None, ComputeOpts::long()), &git);
        let tree = builder.build_tree(repo.path()).unwrap();

        assert_sums(&tree);
        assert_eq!(tree.entry.file_count, 5);
        let lib = child(child(&tree, "src"), "lib");
        assert_eq!(lib.entry.size, 5 + 14);
        assert_eq!(lib.entry.file_count, 2);
        assert!(child(&tree, "empty").was_expanded);
    }

    #[test]
    fn test_depth_limit_measures_unlisted_directories() {
        let repo = sample();
        let git = NoGit;
        let builder = TreeBuilder::new(opts(&repo, Some(1), ComputeOpts::long()), &git);
        let tree = builder.build_tree(repo.path()).unwrap();

        let src = child(&tree, "src");
        assert!(!src.was_expanded);
        assert!(src.children.is_empty());
        assert_eq!(src.entry.file_count, 3);
        assert_eq!(src.entry.size, 13 + 5 + 14);
        assert_sums(&tree);
    }

    #[test]
    fn test_no_totals_without_sizes() {
        let repo = sample();
        let git = NoGit;
        let builder = TreeBuilder::new(opts(&repo, Some(1), ComputeOpts::basic()), &git);
        let tree = builder.build_tree(repo.path()).unwrap();
        assert_eq!(child(&tree, "src").entry.size, 0);
        assert_eq!(tree.entry.size, 0);
    }

    #[test]
    fn test_size_cache_hit_stops_descent() {
        let repo = sample();
        let cache_path = repo.path().join("sizes.db");
        let mut sizes = SizeCacheBuilder::init(&cache_path).unwrap();
        sizes.store(&repo.path().join("src"), 9_999, 77).unwrap();
        sizes.save().unwrap();
        let cache = SizeCache::open(&cache_path).unwrap();

        let git = NoGit;
        let builder = TreeBuilder::new(opts(&repo, None, ComputeOpts::long()), &git)
            .with_size_cache(&cache);
        let tree = builder.build_tree(repo.path()).unwrap();

        let src = child(&tree, "src");
        assert!(!src.was_expanded);
        assert!(src.children.is_empty());
        assert_eq!((src.entry.size, src.entry.file_count), (9_999, 77));
        assert_sums(&tree);
    }

    #[test]
    fn test_skip_predicate_lists_but_does_not_descend() {
        let repo = sample();
        repo.add_file("node_modules/pkg/index.js", "x");
        let git = NoGit;
        let skip = |e: &FileEntry| e.name == "node_modules";
        let builder =
            TreeBuilder::new(opts(&repo, None, ComputeOpts::long()), &git).with_skip(&skip);
        let tree = builder.build_tree(repo.path()).unwrap();

        let modules = child(&tree, "node_modules");
        assert!(!modules.was_expanded);
        assert_eq!((modules.entry.size, modules.entry.file_count), (0, 0));
        assert_eq!(tree.entry.file_count, 5);
        assert_sums(&tree);
    }

    #[test]
    fn test_prune_patterns() {
        let prune = PrunePatterns::new(&["target", "*.cache"]).unwrap();
        let mut dir = FileEntry::unknown(PathBuf::from("/x/target"));
        dir.kind = FileKind::Dir;
        assert!(prune.skip(&dir));
        dir.name = "web.cache".to_string();
        assert!(prune.skip(&dir));
        dir.name = "src".to_string();
        assert!(!prune.skip(&dir));
        let file = FileEntry::unknown(PathBuf::from("/x/target"));
        assert!(!prune.skip(&file));
        assert!(PrunePatterns::new(&["["]).is_err());
    }

    #[test]
    fn test_no_mount_points_on_one_device() {
        let repo = sample();
        let git = NoGit;
        let builder = TreeBuilder::new(opts(&repo, None, ComputeOpts::none()), &git);
        let tree = builder.build_tree(repo.path()).unwrap();
        tree.walk(&mut |node, _| assert!(!node.entry.is_mount_point));
    }

    #[test]
    fn test_expand_node_is_idempotent() {
        let repo = sample();
        let git = NoGit;
        let builder = TreeBuilder::new(opts(&repo, Some(1), ComputeOpts::long()), &git);
        let mut tree = builder.build_tree(repo.path()).unwrap();
        let src_index = tree.children.iter().position(|c| c.entry.name == "src").unwrap();
        let empty_index = tree.children.iter().position(|c| c.entry.name == "empty").unwrap();

        let src = &mut tree.children[src_index];
        builder.expand_node(src).unwrap();
        assert!(src.was_expanded);
        let names: Vec<String> = src.children.iter().map(|c| c.entry.name.clone()).collect();
        assert_eq!(names, vec!["lib", "main.rs"]);
        assert!(!src.children[0].was_expanded);
        assert_eq!(src.children[0].entry.file_count, 2);
        let size = src.entry.size;

        builder.expand_node(src).unwrap();
        assert_eq!(src.children.len(), 2);
        assert_eq!(src.entry.size, size);

        let empty = &mut tree.children[empty_index];
        builder.expand_node(empty).unwrap();
        assert!(empty.was_expanded);
        assert!(empty.children.is_empty());
    }

    #[test]
    fn test_sort_by_size_uses_directory_totals() {
        let repo = TestRepo::new();
        repo.add_file("small.txt", "x");
        repo.add_file("big/a", &"y".repeat(100));
        repo.add_file("mid.txt", &"z".repeat(50));
        let git = NoGit;
        let mut o = opts(&repo, Some(1), ComputeOpts::long());
        o.sort_by = SortMode::Size;
        let tree = TreeBuilder::new(o, &git).build_tree(repo.path()).unwrap();
        let names: Vec<&str> = tree.children.iter().map(|c| c.entry.name.as_str()).collect();
        assert_eq!(names, vec!["big", "mid.txt", "small.txt"]);
    }

    #[test]
    fn test_root_name_and_errors() {
        let repo = sample();
        let git = NoGit;
        let builder = TreeBuilder::new(opts(&repo, Some(1), ComputeOpts::none()), &git);

        let tree = builder.build_tree(Path::new(".")).unwrap();
        assert_eq!(tree.entry.name, ".");
        assert_eq!(tree.path(), repo.path());

        let file = builder.build_tree(Path::new("top.txt")).unwrap();
        assert!(file.children.is_empty());
        assert!(!file.was_expanded);

        assert!(builder.build_tree(Path::new("missing")).is_err());
    }

    #[test]
    fn test_ancestry_tree() {
        let repo = TestRepo::new();
        repo.add_file("a/b/c/deep.txt", "x");
        repo.add_file("a/b/y.txt", "y");
        repo.add_file("a/x/z.txt", "z");
        repo.add_file("other/w.txt", "w");
        let git = NoGit;
        let builder = TreeBuilder::new(opts(&repo, Some(1), ComputeOpts::none()), &git);

        let tree = builder
            .build_ancestry_tree(Path::new("a/b/c/not-there"))
            .unwrap();
        assert_eq!(tree.entry.name, ".");
        let other = child(&tree, "other");
        assert!(!other.was_expanded && other.children.is_empty());
        let a = child(&tree, "a");
        let x = child(a, "x");
        assert!(!x.was_expanded);
        let b = child(a, "b");
        assert!(child(b, "y.txt").children.is_empty());
        let c = child(b, "c");
        assert!(c.was_expanded);
        assert_eq!(c.children.len(), 1);
        assert_eq!(c.children[0].entry.name, "deep.txt");
    }

    #[test]
    fn test_ancestry_outside_cwd_starts_at_filesystem_root() {
        let repo = TestRepo::new();
        let elsewhere = TestRepo::new();
        elsewhere.add_file("f.txt", "x");
        let git = NoGit;
        let builder = TreeBuilder::new(opts(&repo, Some(1), ComputeOpts::none()), &git);

        let tree = builder.build_ancestry_tree(elsewhere.path()).unwrap();
        assert_eq!(tree.entry.name, "/");
        let target = tree.find(elsewhere.path()).unwrap();
        assert!(target.was_expanded);
        assert_eq!(target.children[0].entry.name, "f.txt");
    }
}
