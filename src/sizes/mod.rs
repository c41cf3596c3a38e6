//! Cached recursive directory sizes.
//!
//! `l-sizes` walks large trees ahead of time and publishes a snapshot of
//! `(path -> size, file count)`; listings consult it before walking a
//! directory themselves.
//!
//! The snapshot is a single file: a postcard-encoded header and records in a
//! zstd stream, ended by a terminator record. The builder writes to a `.tmp`
//! shadow next to the live file and publishes it with a rename, so a reader
//! sees either the old snapshot or the new one, never a mix. Readers load
//! the whole table at open, which pins the snapshot they opened.

mod builder;
mod reader;
mod scan;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use builder::SizeCacheBuilder;
pub use reader::SizeCache;
pub use scan::{ScanOptions, ScanStats, scan};

/// Bump when the record layout changes; older files read as a miss.
pub const FORMAT_VERSION: u32 = 1;

const MAGIC: [u8; 4] = *b"LSZC";
const CACHE_FILE: &str = "sizes.db";
const SIDE_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    magic: [u8; 4],
    version: u32,
}

impl Header {
    fn current() -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
        }
    }

    fn is_current(&self) -> bool {
        self.magic == MAGIC && self.version == FORMAT_VERSION
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    path: String,
    size: u64,
    files: u64,
}

/// `$HOME/.cache/l`, or `/tmp/.cache/l` without a home directory.
pub fn cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".cache")
        .join("l")
}

pub fn default_cache_path() -> PathBuf {
    cache_dir().join(CACHE_FILE)
}

/// The builder's staging file for `live`.
pub fn shadow_path(live: &Path) -> PathBuf {
    with_suffix(live, ".tmp")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Journal siblings that may be left behind next to `path`.
fn side_files(path: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    SIDE_SUFFIXES.iter().map(move |s| with_suffix(path, s))
}

/// Remove `path` and its side files, ignoring anything already gone.
fn remove_with_side_files(path: &Path) {
    for p in std::iter::once(path.to_path_buf()).chain(side_files(path)) {
        match fs::remove_file(&p) {
            Ok(()) => log::debug!("removed {}", p.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("could not remove {}: {}", p.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadow_and_side_paths() {
        let live = Path::new("/x/sizes.db");
        assert_eq!(shadow_path(live), PathBuf::from("/x/sizes.db.tmp"));
        let sides: Vec<_> = side_files(live).collect();
        assert_eq!(sides[0], PathBuf::from("/x/sizes.db-wal"));
        assert_eq!(sides[2], PathBuf::from("/x/sizes.db-journal"));
    }

    #[test]
    fn test_default_cache_path_layout() {
        let path = default_cache_path();
        assert!(path.ends_with(".cache/l/sizes.db"));
    }
}
