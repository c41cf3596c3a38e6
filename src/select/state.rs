//! Selector state: cursor, collapsed set and the flat projection

use std::path::{Path, PathBuf};

use crate::icons::Icons;
use crate::output::{Collapsed, Column, FlatNode, Layout, Visibility, flatten};
use crate::tree::{TreeBuilder, TreeNode};

use super::keys::Action;

/// What the event loop should do after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Select(PathBuf),
    Yank(PathBuf),
    Edit(PathBuf),
    Quit,
    Interrupted,
}

/// Interactive view over one or more built trees.
///
/// Every mutation re-flattens, re-fits the columns and puts the cursor back
/// on the row with the same path, or on row 0 when that row is gone.
pub struct Selector<'a> {
    roots: Vec<TreeNode>,
    builder: &'a TreeBuilder<'a>,
    icons: &'a Icons,
    visibility: Visibility,
    collapsed: Collapsed,
    layout: Layout,
    rows: Vec<FlatNode>,
    cursor: usize,
    scroll: usize,
    height: usize,
}

impl<'a> Selector<'a> {
    pub fn new(
        roots: Vec<TreeNode>,
        builder: &'a TreeBuilder<'a>,
        icons: &'a Icons,
        visibility: Visibility,
        columns: &[Column],
    ) -> Self {
        let mut selector = Self {
            roots,
            builder,
            icons,
            visibility,
            collapsed: Collapsed::default(),
            layout: Layout::new(columns),
            rows: Vec::new(),
            cursor: 0,
            scroll: 0,
            height: usize::MAX,
        };
        selector.refresh();
        selector
    }

    pub fn rows(&self) -> &[FlatNode] {
        &self.rows
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn icons(&self) -> &Icons {
        self.icons
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// First row inside the viewport.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Viewport height in rows; at least one.
    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.clamp_scroll();
    }

    pub fn row_path(&self, index: usize) -> Option<&Path> {
        self.rows
            .get(index)
            .and_then(|r| r.node(&self.roots))
            .map(TreeNode::path)
    }

    pub fn selected_path(&self) -> Option<&Path> {
        self.row_path(self.cursor)
    }

    /// Move the cursor to the row showing `path`.
    pub fn select_path(&mut self, path: &Path) -> bool {
        match self.position_of(path) {
            Some(index) => {
                self.cursor = index;
                self.clamp_scroll();
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, action: Action) -> Outcome {
        if self.rows.is_empty() {
            return match action {
                Action::Interrupt => Outcome::Interrupted,
                Action::Quit | Action::Enter | Action::Yank => Outcome::Quit,
                _ => Outcome::Continue,
            };
        }
        let last = self.rows.len() - 1;
        match action {
            Action::Up => self.move_to(if self.cursor == 0 { last } else { self.cursor - 1 }),
            Action::Down => self.move_to(if self.cursor == last { 0 } else { self.cursor + 1 }),
            Action::PageUp => self.move_to(self.cursor.saturating_sub(self.page())),
            Action::PageDown => self.move_to((self.cursor + self.page()).min(last)),
            Action::Home => self.move_to(0),
            Action::End => self.move_to(last),
            Action::Left => self.left(),
            Action::Right => {
                self.right();
            }
            Action::Open => return self.open(),
            Action::Enter => return self.with_selected(Outcome::Select),
            Action::Yank => return self.with_selected(Outcome::Yank),
            Action::Quit => return Outcome::Quit,
            Action::Interrupt => return Outcome::Interrupted,
        }
        Outcome::Continue
    }

    fn with_selected(&self, outcome: fn(PathBuf) -> Outcome) -> Outcome {
        match self.selected_path() {
            Some(path) => outcome(path.to_path_buf()),
            None => Outcome::Quit,
        }
    }

    fn page(&self) -> usize {
        if self.height == usize::MAX {
            self.rows.len()
        } else {
            self.height
        }
    }

    fn move_to(&mut self, index: usize) {
        self.cursor = index;
        self.clamp_scroll();
    }

    fn selected(&self) -> Option<(&FlatNode, &TreeNode)> {
        let row = self.rows.get(self.cursor)?;
        Some((row, row.node(&self.roots)?))
    }

    fn left(&mut self) {
        let Some((row, node)) = self.selected() else {
            return;
        };
        let foldable =
            node.is_dir() && row.has_visible_children && !self.collapsed.contains(node.path());
        if foldable {
            let path = node.path().to_path_buf();
            self.mutate(|s| {
                s.collapsed.insert(&path);
            });
            return;
        }
        let depth = row.depth;
        if depth == 0 {
            return;
        }
        if let Some(parent) = self.rows[..self.cursor].iter().rposition(|r| r.depth < depth) {
            self.move_to(parent);
        }
    }

    /// Unfold or lazily list the selected directory. False when there was nothing to do.
    fn right(&mut self) -> bool {
        let Some((row, node)) = self.selected() else {
            return false;
        };
        if !node.is_dir() {
            return false;
        }
        let path = node.path().to_path_buf();
        if self.collapsed.contains(&path) {
            self.mutate(|s| {
                s.collapsed.remove(&path);
            });
            return true;
        }
        if node.was_expanded {
            return false;
        }
        let row = row.clone();
        self.mutate(|s| {
            let builder = s.builder;
            if let Some(node) = row.node_mut(&mut s.roots)
                && let Err(e) = builder.expand_node(node)
            {
                log::debug!("cannot expand {}: {}", path.display(), e);
            }
        });
        true
    }

    fn open(&mut self) -> Outcome {
        let Some((_, node)) = self.selected() else {
            return Outcome::Continue;
        };
        let path = node.path().to_path_buf();
        if !node.is_dir() {
            return Outcome::Edit(path);
        }
        if !self.right() {
            self.mutate(|s| {
                s.collapsed.insert(&path);
            });
        }
        Outcome::Continue
    }

    fn mutate(&mut self, change: impl FnOnce(&mut Self)) {
        let before = self.selected_path().map(Path::to_path_buf);
        change(self);
        self.refresh();
        self.cursor = before
            .and_then(|path| self.position_of(&path))
            .unwrap_or(0);
        self.clamp_scroll();
    }

    fn refresh(&mut self) {
        self.rows = flatten(&self.roots, &self.collapsed, &self.visibility);
        self.layout.fit(&self.rows, &self.roots, self.icons);
    }

    fn position_of(&self, path: &Path) -> Option<usize> {
        (0..self.rows.len()).find(|&i| self.row_path(i) == Some(path))
    }

    fn clamp_scroll(&mut self) {
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.height != usize::MAX && self.cursor >= self.scroll + self.height {
            self.scroll = self.cursor + 1 - self.height;
        }
        let max_scroll = self.rows.len().saturating_sub(self.page().min(self.rows.len()));
        self.scroll = self.scroll.min(max_scroll);
    }
}
