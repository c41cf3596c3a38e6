//! Line and word counting for text files.
//!
//! Files are memory-mapped and scanned once. Anything that looks binary is
//! refused so that line counts stay meaningful: a known binary extension,
//! a NUL byte in the first kilobyte, or a size of 1 MiB and up.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

/// Files at or above this size are not counted.
pub const MAX_TEXT_SIZE: u64 = 1 << 20;

/// How much of the head is checked for NUL bytes.
const BINARY_SNIFF_LEN: usize = 1024;

/// Extensions that are never worth scanning.
const BINARY_EXTENSIONS: &[&str] = &[
    "7z", "a", "aac", "apk", "avi", "bin", "bmp", "bz2", "class", "cr2", "cr3", "dat", "db",
    "dll", "dmg", "doc", "docx", "dylib", "eot", "exe", "flac", "gif", "gz", "heic", "ico",
    "iso", "jar", "jpeg", "jpg", "lz4", "m4a", "mkv", "mov", "mp3", "mp4", "nef", "o", "obj",
    "ogg", "otf", "pdf", "png", "pyc", "rar", "rlib", "so", "sqlite", "tar", "tif", "tiff",
    "ttf", "wasm", "wav", "webm", "webp", "woff", "woff2", "xls", "xlsx", "xz", "zip", "zst",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextCounts {
    pub lines: u64,
    pub words: u64,
}

pub fn is_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            BINARY_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Lines in a text file; `None` if the file is refused as binary or unreadable.
pub fn count_file_lines(path: &Path) -> Option<u64> {
    count_text(path).map(|c| c.lines)
}

/// Whitespace-separated words in a text file; `None` like [`count_file_lines`].
pub fn count_file_words(path: &Path) -> Option<u64> {
    count_text(path).map(|c| c.words)
}

/// Both counts in a single pass.
pub fn count_text(path: &Path) -> Option<TextCounts> {
    if is_binary_extension(path) {
        return None;
    }
    let file = File::open(path).ok()?;
    let meta = file.metadata().ok()?;
    if !meta.is_file() || meta.len() >= MAX_TEXT_SIZE {
        return None;
    }
    if meta.len() == 0 {
        return Some(TextCounts::default());
    }
    // SAFETY: read-only map of a regular file, dropped before returning.
    let map = unsafe { Mmap::map(&file) }.ok()?;
    count_bytes(&map)
}

/// Counts over an in-memory buffer, with the same binary refusal.
pub fn count_bytes(data: &[u8]) -> Option<TextCounts> {
    let head = &data[..data.len().min(BINARY_SNIFF_LEN)];
    if memchr::memchr(0, head).is_some() {
        return None;
    }
    let mut lines = memchr::memchr_iter(b'\n', data).count() as u64;
    if data.last().is_some_and(|&b| b != b'\n') {
        lines += 1;
    }
    Some(TextCounts {
        lines,
        words: count_words(data),
    })
}

fn count_words(data: &[u8]) -> u64 {
    let mut words = 0;
    let mut in_space = true;
    for &b in data {
        let space = b.is_ascii_whitespace() || b == b'\x0b';
        if in_space && !space {
            words += 1;
        }
        in_space = space;
    }
    words
}
