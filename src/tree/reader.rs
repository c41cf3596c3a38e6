//! Directory listing: enumerate, stat, classify, sort.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::entry::FileEntry;
use crate::error::Result;

use super::config::{BuildOpts, SortMode};
use super::filter::list_children;

/// Entries of `dir` after the hidden/gitignore filters, sorted per `opts`.
///
/// Entries that vanish between enumeration and `lstat` are kept with kind
/// `Unknown`; a directory that cannot be enumerated is an error.
pub fn read_directory(dir: &Path, opts: &BuildOpts) -> Result<Vec<FileEntry>> {
    let mut entries: Vec<FileEntry> = list_children(dir, opts.show_hidden, opts.skip_gitignored)?
        .into_iter()
        .map(stat_entry)
        .collect();
    sort_entries(&mut entries, opts.sort_by, opts.sort_reverse, |e| e);
    Ok(entries)
}

/// `lstat` the path, and `stat` it too when it is a symlink.
pub fn stat_entry(path: std::path::PathBuf) -> FileEntry {
    match fs::symlink_metadata(&path) {
        Ok(meta) => {
            let target = if meta.file_type().is_symlink() {
                fs::metadata(&path).ok()
            } else {
                None
            };
            FileEntry::from_metadata(path, &meta, target.as_ref())
        }
        Err(e) => {
            log::debug!("cannot stat {}: {}", path.display(), e);
            FileEntry::unknown(path)
        }
    }
}

/// Stable sort of anything that carries a [`FileEntry`].
///
/// Name is always the final tiebreak. `SortMode::None` groups directories
/// first; the other modes interleave them. `reverse` flips the final order.
pub fn sort_entries<T>(items: &mut [T], mode: SortMode, reverse: bool, entry: impl Fn(&T) -> &FileEntry) {
    items.sort_by(|a, b| {
        let (a, b) = (entry(a), entry(b));
        let primary = match mode {
            SortMode::None => b.is_dir().cmp(&a.is_dir()),
            SortMode::Size => b.size.cmp(&a.size),
            SortMode::Time => b.mtime.cmp(&a.mtime),
            SortMode::Name => Ordering::Equal,
        };
        primary.then_with(|| compare_names(&a.name, &b.name))
    });
    if reverse {
        items.reverse();
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn entry(name: &str, dir: bool, size: u64, mtime: i64) -> FileEntry {
        let mut e = FileEntry::unknown(PathBuf::from(name));
        e.kind = if dir {
            crate::entry::FileKind::Dir
        } else {
            crate::entry::FileKind::File
        };
        e.size = size;
        e.mtime = mtime;
        e
    }

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_sort_modes() {
        let base = vec![
            entry("b.txt", false, 10, 3),
            entry("Zdir", true, 5, 1),
            entry("a.txt", false, 30, 2),
            entry("adir", true, 30, 9),
        ];

        let mut v = base.clone();
        sort_entries(&mut v, SortMode::None, false, |e| e);
        assert_eq!(names(&v), vec!["adir", "Zdir", "a.txt", "b.txt"]);

        let mut v = base.clone();
        sort_entries(&mut v, SortMode::Name, false, |e| e);
        assert_eq!(names(&v), vec!["a.txt", "adir", "b.txt", "Zdir"]);

        let mut v = base.clone();
        sort_entries(&mut v, SortMode::Size, false, |e| e);
        assert_eq!(names(&v), vec!["a.txt", "adir", "b.txt", "Zdir"]);

        let mut v = base.clone();
        sort_entries(&mut v, SortMode::Time, false, |e| e);
        assert_eq!(names(&v), vec!["adir", "b.txt", "a.txt", "Zdir"]);

        let mut v = base;
        sort_entries(&mut v, SortMode::Time, true, |e| e);
        assert_eq!(names(&v), vec!["Zdir", "a.txt", "b.txt", "adir"]);
    }

    #[test]
    fn test_read_directory_stats_and_filters() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("file.txt"), "12345").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();

        let opts = BuildOpts {
            skip_gitignored: false,
            ..BuildOpts::default()
        };
        let entries = read_directory(dir.path(), &opts).unwrap();
        assert_eq!(names(&entries), vec!["sub", "file.txt"]);
        assert!(entries[0].is_dir());
        assert_eq!(entries[1].size, 5);

        let opts = BuildOpts {
            show_hidden: true,
            ..opts
        };
        assert_eq!(read_directory(dir.path(), &opts).unwrap().len(), 3);
    }

    #[test]
    fn test_unreadable_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_directory(&dir.path().join("gone"), &BuildOpts::default()).is_err());
    }
}
