//! Column slots and their widths for long listings

use chrono::{Local, TimeZone};
use unicode_width::UnicodeWidthStr;

use crate::entry::{ContentKind, FileEntry};
use crate::icons::Icons;
use crate::tree::TreeNode;
use crate::tree::utils::{format_count, format_duration, format_megapixels, format_size};

use super::flatten::FlatNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Size,
    Files,
    /// Lines, megapixels, duration or pages, depending on content.
    Info,
    Modified,
    Git,
    Added,
    Removed,
}

pub const LONG_COLUMNS: &[Column] = &[
    Column::Size,
    Column::Files,
    Column::Info,
    Column::Modified,
    Column::Git,
    Column::Added,
    Column::Removed,
];

pub const SUMMARY_COLUMNS: &[Column] = &[
    Column::Size,
    Column::Files,
    Column::Info,
    Column::Modified,
    Column::Git,
];

/// Short listings still show the git code.
pub const SHORT_COLUMNS: &[Column] = &[Column::Git];

impl Column {
    /// Cell text; empty when the entry has nothing for this column.
    pub fn format(self, entry: &FileEntry) -> String {
        match self {
            Column::Size => format_size(entry.size),
            Column::Files if entry.is_dir() => format_count(entry.file_count),
            Column::Files => String::new(),
            Column::Info => format_info(entry),
            Column::Modified => format_mtime(entry.mtime),
            Column::Git => entry
                .git
                .status
                .as_ref()
                .map(|s| s.code.clone())
                .unwrap_or_default(),
            Column::Added => match entry.git.diff_added() {
                0 => String::new(),
                n => format!("+{n}"),
            },
            Column::Removed => match entry.git.diff_removed() {
                0 => String::new(),
                n => format!("-{n}"),
            },
        }
    }

    pub fn right_aligned(self) -> bool {
        matches!(
            self,
            Column::Size | Column::Files | Column::Info | Column::Added | Column::Removed
        )
    }
}

fn format_info(entry: &FileEntry) -> String {
    let Some(value) = entry.content_value else {
        return String::new();
    };
    match entry.content {
        ContentKind::Text => format!("{}L", format_count(value)),
        ContentKind::Image => format_megapixels(value),
        ContentKind::Audio => format_duration(value),
        ContentKind::Pdf => format!("{value}p"),
        ContentKind::Binary | ContentKind::Unknown => String::new(),
    }
}

fn format_mtime(mtime: i64) -> String {
    if mtime == 0 {
        return String::new();
    }
    Local
        .timestamp_opt(mtime, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Columns of one projection with widths fitted to its rows.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    columns: Vec<Column>,
    widths: Vec<usize>,
    icon_width: usize,
}

impl Layout {
    pub fn new(columns: &[Column]) -> Self {
        Self {
            columns: columns.to_vec(),
            widths: vec![0; columns.len()],
            icon_width: 0,
        }
    }

    /// Fit every column to the widest cell among `rows`. A column whose
    /// cells are all empty gets width 0 and is not drawn.
    pub fn fit(&mut self, rows: &[FlatNode], roots: &[TreeNode], icons: &Icons) {
        self.widths.iter_mut().for_each(|w| *w = 0);
        self.icon_width = 0;
        for node in rows.iter().filter_map(|r| r.node(roots)) {
            for (width, column) in self.widths.iter_mut().zip(&self.columns) {
                *width = (*width).max(column.format(&node.entry).width());
            }
            self.icon_width = self.icon_width.max(icons.for_entry(&node.entry).width());
        }
    }

    pub fn width(&self, column: Column) -> usize {
        self.columns
            .iter()
            .position(|c| *c == column)
            .map_or(0, |i| self.widths[i])
    }

    pub fn icon_width(&self) -> usize {
        self.icon_width
    }

    /// Drawn columns with their widths.
    pub fn visible(&self) -> impl Iterator<Item = (Column, usize)> + '_ {
        self.columns
            .iter()
            .copied()
            .zip(self.widths.iter().copied())
            .filter(|(_, w)| *w > 0)
    }
}

/// `text` padded to `width` display cells.
pub fn pad(text: &str, width: usize, right: bool) -> String {
    let fill = width.saturating_sub(text.width());
    if right {
        format!("{}{}", " ".repeat(fill), text)
    } else {
        format!("{}{}", text, " ".repeat(fill))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FileKind;
    use crate::git::GitStatus;
    use crate::output::flatten::{Collapsed, flatten};
    use crate::output::visibility::Visibility;
    use std::path::PathBuf;

    fn file(path: &str, size: u64, added: u32) -> TreeNode {
        let mut entry = FileEntry::unknown(PathBuf::from(path));
        entry.kind = FileKind::File;
        entry.size = size;
        if added > 0 {
            entry.git.status = Some(GitStatus {
                code: " M".to_string(),
                ignored: false,
                diff_added: added,
                diff_removed: 0,
            });
        }
        TreeNode::new(entry)
    }

    #[test]
    fn test_cells() {
        let mut e = FileEntry::unknown(PathBuf::from("/x/a.txt"));
        e.kind = FileKind::File;
        e.content = ContentKind::Text;
        e.content_value = Some(1234);
        assert_eq!(Column::Info.format(&e), "1,234L");
        e.content = ContentKind::Audio;
        e.content_value = Some(100);
        assert_eq!(Column::Info.format(&e), "1:40");
        e.content = ContentKind::Pdf;
        e.content_value = Some(42);
        assert_eq!(Column::Info.format(&e), "42p");
        assert_eq!(Column::Files.format(&e), "");
        assert_eq!(Column::Modified.format(&e), "");
        assert_eq!(pad("ab", 4, true), "  ab");
        assert_eq!(pad("ab", 4, false), "ab  ");
    }

    #[test]
    fn test_widths_follow_visible_rows() {
        let mut root = TreeNode::new(FileEntry::unknown(PathBuf::from("/r")));
        root.entry.kind = FileKind::Dir;
        root.children = vec![file("/r/a", 5, 0), file("/r/b", 3 * 1024, 12)];
        let roots = vec![root];
        let icons = Icons::disabled();
        let mut layout = Layout::new(LONG_COLUMNS);

        let rows = flatten(&roots, &Collapsed::default(), &Visibility::default());
        layout.fit(&rows, &roots, &icons);
        assert_eq!(layout.width(Column::Size), 4);
        assert_eq!(layout.width(Column::Added), 3);
        assert_eq!(layout.width(Column::Removed), 0);
        assert!(layout.visible().all(|(c, _)| c != Column::Removed));

        layout.fit(&rows[..2], &roots, &icons);
        assert_eq!(layout.width(Column::Added), 0);
        assert_eq!(layout.width(Column::Size), 2);
    }
}
