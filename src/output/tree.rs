//! Tree printer for listings
//!
//! `TreePrinter` flattens built trees with the configured visibility, fits
//! the columns and writes one colored row per visible entry. `write_row` is
//! shared with the interactive selector.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, NoColor, StandardStream, WriteColor};

use crate::entry::{FileEntry, FileKind};
use crate::icons::Icons;
use crate::tree::TreeNode;

use super::columns::{Column, Layout, pad};
use super::config::OutputConfig;
use super::flatten::{Collapsed, FlatNode, flatten};

pub struct TreePrinter<'a> {
    config: &'a OutputConfig,
    icons: &'a Icons,
}

impl<'a> TreePrinter<'a> {
    pub fn new(config: &'a OutputConfig, icons: &'a Icons) -> Self {
        Self { config, icons }
    }

    /// Plain text rendering, mostly for tests.
    pub fn format(&self, roots: &[TreeNode]) -> String {
        let mut out = NoColor::new(Vec::new());
        // Writing into a Vec cannot fail.
        let _ = self.write(&mut out, roots);
        String::from_utf8_lossy(&out.into_inner()).into_owned()
    }

    pub fn print(&self, roots: &[TreeNode]) -> io::Result<()> {
        let choice = if self.config.use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let mut stdout = StandardStream::stdout(choice);
        self.write(&mut stdout, roots)
    }

    pub fn write<W: WriteColor>(&self, out: &mut W, roots: &[TreeNode]) -> io::Result<()> {
        let rows = flatten(roots, &Collapsed::default(), &self.config.visibility);
        let mut layout = Layout::new(self.config.format.columns());
        layout.fit(&rows, roots, self.icons);
        for row in &rows {
            if let Some(node) = row.node(roots) {
                write_row(out, row, node, &layout, self.icons)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

/// One row without its line terminator.
pub fn write_row<W: WriteColor>(
    out: &mut W,
    row: &FlatNode,
    node: &TreeNode,
    layout: &Layout,
    icons: &Icons,
) -> io::Result<()> {
    let entry = &node.entry;
    for (column, width) in layout.visible() {
        let text = column.format(entry);
        match column_spec(column, entry) {
            Some(spec) => {
                out.set_color(&spec)?;
                write!(out, "{}", pad(&text, width, column.right_aligned()))?;
                out.reset()?;
            }
            None => write!(out, "{}", pad(&text, width, column.right_aligned()))?,
        }
        write!(out, " ")?;
    }

    write!(out, "{}", row.guides())?;
    if layout.icon_width() > 0 {
        write!(out, "{} ", pad(icons.for_entry(entry), layout.icon_width(), false))?;
    }

    out.set_color(&name_spec(entry))?;
    write!(out, "{}", entry.name)?;
    out.reset()?;

    if let Some(target) = &entry.symlink_target {
        write!(out, " -> {}", target.display())?;
    }
    if let Some(branch) = &entry.git.branch {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(out, "  ({})", branch)?;
        out.reset()?;
    }
    if entry.git.is_repo_root
        && let Some(summary) = entry.git.summary.filter(|s| !s.is_clean())
    {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(out, " [{}]", summary)?;
        out.reset()?;
    }
    Ok(())
}

fn name_spec(entry: &FileEntry) -> ColorSpec {
    let mut spec = ColorSpec::new();
    if entry.is_mount_point {
        spec.set_fg(Some(Color::Yellow)).set_bold(true);
        return spec;
    }
    match entry.kind {
        FileKind::Dir => {
            spec.set_fg(Some(Color::Blue)).set_bold(true);
        }
        FileKind::Executable => {
            spec.set_fg(Some(Color::Green)).set_bold(true);
        }
        FileKind::Symlink | FileKind::SymlinkDir => {
            spec.set_fg(Some(Color::Cyan));
        }
        FileKind::SymlinkBroken => {
            spec.set_fg(Some(Color::Red));
        }
        FileKind::Fifo | FileKind::Socket | FileKind::CharDevice | FileKind::BlockDevice => {
            spec.set_fg(Some(Color::Yellow));
        }
        FileKind::File | FileKind::Unknown => {}
    }
    spec
}

fn column_spec(column: Column, entry: &FileEntry) -> Option<ColorSpec> {
    let mut spec = ColorSpec::new();
    match column {
        Column::Added => {
            spec.set_fg(Some(Color::Green));
        }
        Column::Removed => {
            spec.set_fg(Some(Color::Red));
        }
        Column::Modified | Column::Files => {
            spec.set_dimmed(true);
        }
        Column::Git => {
            let code = entry.git.status.as_ref()?.code.as_str();
            match code {
                "??" => spec.set_fg(Some(Color::Red)),
                "!!" => spec.set_dimmed(true),
                c if c.contains('U') => spec.set_fg(Some(Color::Magenta)),
                c if !c.starts_with(' ') => spec.set_fg(Some(Color::Green)),
                _ => spec.set_fg(Some(Color::Yellow)),
            };
        }
        Column::Size | Column::Info => return None,
    }
    Some(spec)
}
