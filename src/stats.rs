//! Summary statistics collection and display
//!
//! This module aggregates a built tree into totals, a per-filetype table and
//! the root repository's facts, and prints them after a summary listing.

use std::io::{self, Write};

use serde::Serialize;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::filetype::FileTypes;
use crate::git::RepoInfo;
use crate::tree::TreeNode;
use crate::tree::utils::{format_count, format_size};

/// Distinct filetypes tracked; files of further types are only counted in `dropped`.
pub const TYPE_STATS_CAPACITY: usize = 64;

/// Label for files no filetype rule recognises.
const OTHER_TYPE: &str = "Other";

/// Totals for one filetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeStat {
    pub name: String,
    pub files: u64,
    pub lines: u64,
    /// At least one file of this type had a line count.
    pub has_lines: bool,
}

/// Bounded filetype table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeStats {
    entries: Vec<TypeStat>,
    /// Files whose type arrived after the table was full.
    dropped: u64,
}

impl TypeStats {
    pub fn record(&mut self, name: &str, lines: Option<u64>) {
        let index = match self.entries.iter().position(|t| t.name == name) {
            Some(index) => index,
            None if self.entries.len() < TYPE_STATS_CAPACITY => {
                self.entries.push(TypeStat {
                    name: name.to_string(),
                    files: 0,
                    lines: 0,
                    has_lines: false,
                });
                self.entries.len() - 1
            }
            None => {
                self.dropped += 1;
                return;
            }
        };
        let stat = &mut self.entries[index];
        stat.files += 1;
        if let Some(lines) = lines {
            stat.lines += lines;
            stat.has_lines = true;
        }
    }

    /// Most files first, then by name.
    pub fn sorted(&self) -> Vec<&TypeStat> {
        let mut sorted: Vec<&TypeStat> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.files.cmp(&a.files).then_with(|| a.name.cmp(&b.name)));
        sorted
    }

    pub fn get(&self, name: &str) -> Option<&TypeStat> {
        self.entries.iter().find(|t| t.name == name)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregates of one built tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub directories: u64,
    pub files: u64,
    pub size: u64,
    pub types: TypeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<RepoInfo>,
}

impl Summary {
    /// Walk everything the builder materialised below `tree`. Directories
    /// that were measured or cache-filled instead of listed contribute their
    /// file counts but no per-type rows. Without `types` only totals are kept.
    pub fn collect(tree: &TreeNode, types: Option<&FileTypes>) -> Self {
        let mut summary = Summary {
            size: tree.entry.size,
            repo: tree.entry.git.repo.as_deref().cloned(),
            ..Summary::default()
        };
        if !tree.is_dir() {
            summary.files = 1;
            summary.size = tree.entry.size;
            summary.record(tree, types);
            return summary;
        }
        tree.walk(&mut |node, depth| {
            if depth == 0 {
                return;
            }
            if node.is_dir() {
                summary.directories += 1;
                if !node.was_expanded {
                    summary.files += node.entry.file_count;
                }
            } else {
                summary.files += 1;
                summary.record(node, types);
            }
        });
        summary
    }

    fn record(&mut self, node: &TreeNode, types: Option<&FileTypes>) {
        let Some(types) = types else {
            return;
        };
        let name = types.detect(&node.entry.path).unwrap_or(OTHER_TYPE);
        self.types.record(name, node.entry.line_count);
    }
}

/// Print the totals block, the type table and repository facts.
pub fn print_summary<W: WriteColor>(out: &mut W, summary: &Summary) -> io::Result<()> {
    let mut bold = ColorSpec::new();
    bold.set_bold(true);

    writeln!(out)?;
    out.set_color(&bold)?;
    writeln!(out, "Summary")?;
    out.reset()?;
    writeln!(out, "───────")?;
    writeln!(out, "Directories:  {}", format_count(summary.directories))?;
    writeln!(out, "Files:        {}", format_count(summary.files))?;
    writeln!(out, "Size:         {}", format_size(summary.size))?;

    if !summary.types.is_empty() {
        writeln!(out)?;
        out.set_color(&bold)?;
        writeln!(out, "By Type:")?;
        out.reset()?;

        let mut type_color = ColorSpec::new();
        type_color.set_fg(Some(Color::Cyan));

        for stat in summary.types.sorted() {
            write!(out, "  ")?;
            out.set_color(&type_color)?;
            write!(out, "{:<16}", stat.name)?;
            out.reset()?;

            write!(out, "{:>6} files", format_count(stat.files))?;
            if stat.has_lines {
                write!(out, "  {:>10} lines", format_count(stat.lines))?;
            }
            writeln!(out)?;
        }
        if summary.types.dropped() > 0 {
            writeln!(
                out,
                "  ({} more files of other types)",
                format_count(summary.types.dropped())
            )?;
        }
    }

    if let Some(repo) = &summary.repo {
        print_repo(out, repo, &bold)?;
    }
    Ok(())
}

fn print_repo<W: WriteColor>(out: &mut W, repo: &RepoInfo, bold: &ColorSpec) -> io::Result<()> {
    writeln!(out)?;
    out.set_color(bold)?;
    writeln!(out, "Repository:")?;
    out.reset()?;

    let mut branch_color = ColorSpec::new();
    branch_color.set_fg(Some(Color::Magenta));
    write!(out, "  Branch:   ")?;
    out.set_color(&branch_color)?;
    write!(out, "{}", repo.branch)?;
    out.reset()?;
    if !repo.summary.is_clean() {
        write!(out, "  [{}]", repo.summary)?;
    }
    writeln!(out)?;

    if let Some(tag) = &repo.tag {
        if repo.tag_distance > 0 {
            writeln!(out, "  Tag:      {} (+{})", tag, repo.tag_distance)?;
        } else {
            writeln!(out, "  Tag:      {}", tag)?;
        }
    }
    if let Some(url) = &repo.remote_url {
        writeln!(out, "  Remote:   {}", url)?;
    }
    if !repo.short_hash.is_empty() {
        writeln!(out, "  Commit:   {} ({} commits)", repo.short_hash, repo.commit_count)?;
    }

    let upstream = if !repo.has_upstream {
        "none".to_string()
    } else if repo.out_of_sync {
        format!("out of sync (ahead {}, behind {})", repo.ahead, repo.behind)
    } else {
        "in sync".to_string()
    };
    writeln!(out, "  Upstream: {}", upstream)?;
    Ok(())
}
