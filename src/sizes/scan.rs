//! Bottom-up walk used by `l-sizes` to fill a new snapshot.

use std::fs;
use std::path::Path;

use crate::entry::dev_of;
use crate::error::Result;

use super::SizeCacheBuilder;

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Directories with fewer files than this are not worth caching.
    pub min_files: u64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { min_files: 256 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub dirs: u64,
    pub stored: u64,
    pub errors: u64,
    pub size: u64,
    pub files: u64,
}

/// Walk `root` and store every directory that holds at least
/// `opts.min_files` files. Counts hidden and ignored files, never follows
/// symlinks and stays on the root's filesystem.
pub fn scan(root: &Path, opts: ScanOptions, builder: &mut SizeCacheBuilder) -> Result<ScanStats> {
    let mut stats = ScanStats::default();
    let meta = match fs::symlink_metadata(root) {
        Ok(meta) if meta.is_dir() => meta,
        Ok(_) => return Ok(stats),
        Err(e) => {
            log::warn!("cannot scan {}: {}", root.display(), e);
            stats.errors += 1;
            return Ok(stats);
        }
    };
    let (size, files) = scan_dir(root, dev_of(&meta), opts, builder, &mut stats)?;
    stats.size = size;
    stats.files = files;
    Ok(stats)
}

fn scan_dir(
    dir: &Path,
    dev: u64,
    opts: ScanOptions,
    builder: &mut SizeCacheBuilder,
    stats: &mut ScanStats,
) -> Result<(u64, u64)> {
    stats.dirs += 1;
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("skipping {}: {}", dir.display(), e);
            stats.errors += 1;
            return Ok((0, 0));
        }
    };

    let mut size = 0u64;
    let mut files = 0u64;
    for entry in entries {
        let Ok(entry) = entry else {
            stats.errors += 1;
            continue;
        };
        let path = entry.path();
        let Ok(meta) = fs::symlink_metadata(&path) else {
            stats.errors += 1;
            continue;
        };
        if meta.is_dir() {
            if dev_of(&meta) != dev {
                log::debug!("not crossing mount point {}", path.display());
                continue;
            }
            let (sub_size, sub_files) = scan_dir(&path, dev, opts, builder, stats)?;
            size += sub_size;
            files += sub_files;
        } else {
            size += meta.len();
            files += 1;
        }
    }

    if files >= opts.min_files {
        builder.store(dir, size, files)?;
        stats.stored += 1;
    }
    Ok((size, files))
}
