use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use super::{Header, Record};

/// Scratch space for one postcard record; longer than any `PATH_MAX`.
const SCRATCH_LEN: usize = 16 * 1024;

/// Read-only view of one published snapshot.
#[derive(Debug, Default)]
pub struct SizeCache {
    entries: HashMap<PathBuf, (u64, u64)>,
}

impl SizeCache {
    /// Load the snapshot at `path`. Missing, foreign or corrupt files all
    /// yield `None`, which callers treat as a miss for every path.
    pub fn open(path: &Path) -> Option<Self> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no size cache at {}", path.display());
                return None;
            }
            Err(e) => {
                log::warn!("size cache {} unreadable: {}", path.display(), e);
                return None;
            }
        };
        let decoder = match zstd::Decoder::new(file) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("size cache {} decompress failed: {}", path.display(), e);
                return None;
            }
        };
        match read_snapshot(BufReader::new(decoder)) {
            Ok(entries) => {
                log::debug!(
                    "loaded {} cached sizes from {}",
                    entries.len(),
                    path.display()
                );
                Some(Self { entries })
            }
            Err(message) => {
                log::warn!("size cache {} ignored: {}", path.display(), message);
                None
            }
        }
    }

    /// `(size, file_count)` for the directory at `path`, if cached.
    pub fn lookup(&self, path: &Path) -> Option<(u64, u64)> {
        self.entries.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_snapshot<R: Read>(mut input: R) -> Result<HashMap<PathBuf, (u64, u64)>, String> {
    let mut scratch = vec![0u8; SCRATCH_LEN];

    let (header, _): (Header, _) =
        postcard::from_io((&mut input, &mut scratch)).map_err(|e| format!("header: {e}"))?;
    if !header.is_current() {
        return Err(format!("unsupported format version {}", header.version));
    }

    let mut entries = HashMap::new();
    loop {
        let (record, _): (Option<Record>, _) =
            postcard::from_io((&mut input, &mut scratch)).map_err(|e| format!("record: {e}"))?;
        let Some(record) = record else {
            return Ok(entries);
        };
        // First insert wins.
        entries
            .entry(PathBuf::from(record.path))
            .or_insert((record.size, record.files));
    }
}
