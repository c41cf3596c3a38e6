//! The per-entry record produced by the directory reader.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::git::{GitStatus, GitSummary, RepoInfo};

/// What an entry is on disk, after following symlinks for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Dir,
    File,
    Executable,
    Symlink,
    SymlinkDir,
    SymlinkBroken,
    Fifo,
    Socket,
    CharDevice,
    BlockDevice,
    Unknown,
}

impl FileKind {
    pub fn is_dir(self) -> bool {
        matches!(self, FileKind::Dir)
    }

    pub fn is_regular(self) -> bool {
        matches!(self, FileKind::File | FileKind::Executable)
    }

    pub fn is_symlink(self) -> bool {
        matches!(
            self,
            FileKind::Symlink | FileKind::SymlinkDir | FileKind::SymlinkBroken
        )
    }

    /// Classify from `lstat` data and, for symlinks, the result of `stat`.
    pub fn classify(link_meta: &Metadata, target_meta: Option<&Metadata>) -> Self {
        let ft = link_meta.file_type();
        if ft.is_symlink() {
            return match target_meta {
                Some(m) if m.is_dir() => FileKind::SymlinkDir,
                Some(_) => FileKind::Symlink,
                None => FileKind::SymlinkBroken,
            };
        }
        if ft.is_dir() {
            return FileKind::Dir;
        }
        if ft.is_file() {
            return if is_executable(link_meta) {
                FileKind::Executable
            } else {
                FileKind::File
            };
        }
        special_kind(link_meta)
    }
}

#[cfg(unix)]
fn is_executable(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &Metadata) -> bool {
    false
}

#[cfg(unix)]
fn special_kind(meta: &Metadata) -> FileKind {
    use std::os::unix::fs::FileTypeExt;
    let ft = meta.file_type();
    if ft.is_fifo() {
        FileKind::Fifo
    } else if ft.is_socket() {
        FileKind::Socket
    } else if ft.is_char_device() {
        FileKind::CharDevice
    } else if ft.is_block_device() {
        FileKind::BlockDevice
    } else {
        FileKind::Unknown
    }
}

#[cfg(not(unix))]
fn special_kind(_meta: &Metadata) -> FileKind {
    FileKind::Unknown
}

/// Result of content classification. Starts as `Unknown`; every other state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    #[default]
    Unknown,
    Text,
    Binary,
    Image,
    Audio,
    Pdf,
}

/// Git facts attached to one entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GitFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GitStatus>,
    pub is_repo_root: bool,
    /// Checked-out branch, for repository roots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Rollup over everything below a directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<GitSummary>,
    /// Only filled for repository roots when repo info was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<Box<RepoInfo>>,
}

impl GitFields {
    pub fn ignored(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ignored)
    }

    pub fn diff_added(&self) -> u32 {
        self.status.as_ref().map_or(0, |s| s.diff_added)
    }

    pub fn diff_removed(&self) -> u32 {
        self.status.as_ref().map_or(0, |s| s.diff_removed)
    }

    /// True when the entry itself, or anything below it, differs from HEAD.
    pub fn is_dirty(&self) -> bool {
        let own = self
            .status
            .as_ref()
            .is_some_and(|s| !s.ignored && s.code.trim() != "");
        own || self.summary.as_ref().is_some_and(|s| !s.is_clean())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Path as it should be displayed and re-opened.
    pub path: PathBuf,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symlink_target: Option<PathBuf>,
    pub kind: FileKind,

    pub mode: u32,
    pub dev: u64,
    pub size: u64,
    /// Seconds since the epoch; 0 when unavailable.
    pub mtime: i64,
    /// Recursive file count; only meaningful for directories.
    pub file_count: u64,
    pub is_mount_point: bool,

    pub content: ContentKind,
    /// Newline count for text files; `None` for anything that is not text.
    pub line_count: Option<u64>,
    pub word_count: Option<u64>,
    /// Lines for text, megapixels x10 for images, seconds for audio, pages for PDFs.
    pub content_value: Option<u64>,

    pub git: GitFields,
}

impl FileEntry {
    /// Build an entry from `lstat` data plus the symlink target's `stat`, if any.
    pub fn from_metadata(path: PathBuf, link_meta: &Metadata, target_meta: Option<&Metadata>) -> Self {
        let kind = FileKind::classify(link_meta, target_meta);
        let symlink_target = if kind.is_symlink() {
            std::fs::read_link(&path).ok()
        } else {
            None
        };
        let mut entry = Self::bare(path, kind);
        entry.symlink_target = symlink_target;
        entry.mode = mode_of(link_meta);
        entry.dev = dev_of(link_meta);
        entry.mtime = mtime_of(link_meta);
        if !kind.is_dir() {
            entry.size = link_meta.len();
        }
        entry
    }

    /// An entry that could not be stat-ed.
    pub fn unknown(path: PathBuf) -> Self {
        Self::bare(path, FileKind::Unknown)
    }

    fn bare(path: PathBuf, kind: FileKind) -> Self {
        let name = display_name(&path);
        Self {
            path,
            name,
            symlink_target: None,
            kind,
            mode: 0,
            dev: 0,
            size: 0,
            mtime: 0,
            file_count: 0,
            is_mount_point: false,
            content: ContentKind::Unknown,
            line_count: None,
            word_count: None,
            content_value: None,
            git: GitFields::default(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.') && self.name != "." && self.name != ".."
    }

    /// Lower-cased extension, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(unix)]
fn mode_of(meta: &Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    meta.mode()
}

#[cfg(not(unix))]
fn mode_of(_meta: &Metadata) -> u32 {
    0
}

#[cfg(unix)]
pub(crate) fn dev_of(meta: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.dev()
}

#[cfg(not(unix))]
pub(crate) fn dev_of(_meta: &Metadata) -> u64 {
    0
}

fn mtime_of(meta: &Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_classify_regular_and_dir() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "hello").unwrap();

        let meta = fs::symlink_metadata(&file).unwrap();
        let entry = FileEntry::from_metadata(file.clone(), &meta, None);
        assert_eq!(entry.kind, FileKind::File);
        assert_eq!(entry.size, 5);
        assert_eq!(entry.name, "a.txt");
        assert_eq!(entry.file_count, 0);

        let meta = fs::symlink_metadata(dir.path()).unwrap();
        let entry = FileEntry::from_metadata(dir.path().to_path_buf(), &meta, None);
        assert_eq!(entry.kind, FileKind::Dir);
        assert_eq!(entry.size, 0, "directory size is filled by the builder");
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_symlinks() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.txt");
        fs::write(&target, "x").unwrap();
        let good = dir.path().join("good");
        let broken = dir.path().join("broken");
        symlink(&target, &good).unwrap();
        symlink(dir.path().join("missing"), &broken).unwrap();

        let lmeta = fs::symlink_metadata(&good).unwrap();
        let tmeta = fs::metadata(&good).ok();
        let entry = FileEntry::from_metadata(good, &lmeta, tmeta.as_ref());
        assert_eq!(entry.kind, FileKind::Symlink);
        assert_eq!(entry.symlink_target.as_deref(), Some(target.as_path()));

        let lmeta = fs::symlink_metadata(&broken).unwrap();
        let tmeta = fs::metadata(&broken).ok();
        let entry = FileEntry::from_metadata(broken, &lmeta, tmeta.as_ref());
        assert_eq!(entry.kind, FileKind::SymlinkBroken);
    }

    #[test]
    fn test_hidden_and_extension() {
        let entry = FileEntry::unknown(PathBuf::from("/tmp/.bashrc"));
        assert!(entry.is_hidden());
        let entry = FileEntry::unknown(PathBuf::from("/tmp/Photo.JPG"));
        assert!(!entry.is_hidden());
        assert_eq!(entry.extension().as_deref(), Some("jpg"));
        assert_eq!(entry.kind, FileKind::Unknown);
    }
}
