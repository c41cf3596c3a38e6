//! PDF page count without a PDF parser.
//!
//! Pass one scans for `/Type /Pages` dictionaries and keeps the largest
//! `/Count`. Documents that hide their page tree inside compressed object
//! streams get a second pass that inflates each `/ObjStm` and scans again.

use std::fs::File;
use std::path::Path;

use flate2::{Decompress, FlushDecompress, Status};
use memchr::memmem;
use memmap2::Mmap;

const HEADER: &[u8] = b"%PDF-";
const STREAM_DICT_WINDOW: usize = 512;
/// How far a `/Type /Pages` hit may sit from its `<<` and `>>`.
const PAGES_DICT_WINDOW: usize = 4096;

const INFLATE_MIN: usize = 4 * 1024;
const INFLATE_FIRST_CAP: usize = 16 * 1024 * 1024;
const INFLATE_GROWN_CAP: usize = 64 * 1024 * 1024;

pub fn get_pdf_page_count(path: &Path) -> Option<u64> {
    let file = File::open(path).ok()?;
    if file.metadata().ok()?.len() < HEADER.len() as u64 {
        return None;
    }
    // SAFETY: the map is read-only and dropped before returning; a file
    // truncated underneath us can at worst fault this process.
    let map = unsafe { Mmap::map(&file) }.ok()?;
    page_count(&map)
}

pub(crate) fn page_count(data: &[u8]) -> Option<u64> {
    if !data.starts_with(HEADER) {
        return None;
    }
    max_pages_count(data).or_else(|| object_stream_pages(data))
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !b"()<>[]{}/%".contains(&b)
}

fn skip_whitespace(data: &[u8], mut at: usize) -> usize {
    while at < data.len() && is_whitespace(data[at]) {
        at += 1;
    }
    at
}

fn parse_uint(data: &[u8], at: usize) -> Option<(u64, usize)> {
    let start = at;
    let mut end = at;
    let mut value = 0u64;
    while end < data.len() && data[end].is_ascii_digit() {
        value = value.checked_mul(10)?.checked_add((data[end] - b'0') as u64)?;
        end += 1;
    }
    (end > start).then_some((value, end))
}

/// Value following `key` inside `dict`, e.g. `/Count 42`.
fn dict_uint(dict: &[u8], key: &[u8]) -> Option<u64> {
    for pos in memmem::find_iter(dict, key) {
        let after = pos + key.len();
        if dict.get(after).copied().is_some_and(is_regular) {
            continue;
        }
        if let Some((value, _)) = parse_uint(dict, skip_whitespace(dict, after)) {
            return Some(value);
        }
    }
    None
}

/// Largest `/Count` among `/Type /Pages` dictionaries in `data`.
fn max_pages_count(data: &[u8]) -> Option<u64> {
    let mut best: Option<u64> = None;
    for pos in memmem::find_iter(data, b"/Type") {
        let at = skip_whitespace(data, pos + 5);
        let rest = &data[at..];
        if !rest.starts_with(b"/Pages") || rest.get(6).copied().is_some_and(is_regular) {
            continue;
        }
        let from = pos.saturating_sub(PAGES_DICT_WINDOW);
        let Some(open) = memmem::rfind(&data[from..pos], b"<<").map(|i| from + i) else {
            continue;
        };
        let to = at.saturating_add(PAGES_DICT_WINDOW).min(data.len());
        let Some(close) = memmem::find(&data[at..to], b">>").map(|i| at + i) else {
            continue;
        };
        if let Some(count) = dict_uint(&data[open..close], b"/Count") {
            best = Some(best.map_or(count, |b| b.max(count)));
        }
    }
    best
}

/// `/Length N` of a stream dictionary, refusing indirect `N 0 R` lengths.
fn direct_length(dict: &[u8]) -> Option<usize> {
    for pos in memmem::find_iter(dict, b"/Length") {
        let after = pos + 7;
        if dict.get(after).copied().is_some_and(is_regular) {
            continue;
        }
        let (value, end) = parse_uint(dict, skip_whitespace(dict, after))?;
        let next = skip_whitespace(dict, end);
        if let Some((_, gen_end)) = parse_uint(dict, next) {
            if dict.get(skip_whitespace(dict, gen_end)) == Some(&b'R') {
                return None;
            }
        }
        return usize::try_from(value).ok();
    }
    None
}

fn object_stream_pages(data: &[u8]) -> Option<u64> {
    let mut best: Option<u64> = None;
    for pos in memmem::find_iter(data, b"stream") {
        if pos >= 3 && &data[pos - 3..pos] == b"end" {
            continue;
        }
        let mut window = &data[pos.saturating_sub(STREAM_DICT_WINDOW)..pos];
        if let Some(obj) = memmem::rfind(window, b" obj") {
            window = &window[obj..];
        }
        let is_objstm = memmem::find(window, b"/ObjStm").is_some();
        let is_flate = memmem::find(window, b"/FlateDecode").is_some();
        if !is_objstm || !is_flate {
            continue;
        }
        let Some(length) = direct_length(window) else {
            continue;
        };

        let mut start = pos + 6;
        if data.get(start) == Some(&b'\r') {
            start += 1;
        }
        if data.get(start) == Some(&b'\n') {
            start += 1;
        }
        let end = start.saturating_add(length).min(data.len());
        if start >= end {
            continue;
        }
        let Some(inflated) = inflate(&data[start..end]) else {
            log::debug!("object stream at {} failed to inflate", pos);
            continue;
        };
        if let Some(count) = max_pages_count(&inflated) {
            best = Some(best.map_or(count, |b| b.max(count)));
        }
    }
    best
}

/// zlib inflate with bounded output: the buffer starts at
/// `max(4 KiB, 4 x input)` capped at 16 MiB and may grow once, 4x, up to 64 MiB.
pub(crate) fn inflate(input: &[u8]) -> Option<Vec<u8>> {
    let initial = input
        .len()
        .saturating_mul(4)
        .max(INFLATE_MIN)
        .min(INFLATE_FIRST_CAP);
    let mut out = Vec::with_capacity(initial);
    let mut limit = initial;
    let mut grown = false;
    let mut z = Decompress::new(true);

    loop {
        let consumed = z.total_in() as usize;
        let before = (z.total_in(), z.total_out());
        let status = z
            .decompress_vec(&input[consumed..], &mut out, FlushDecompress::None)
            .ok()?;
        if status == Status::StreamEnd {
            return Some(out);
        }
        if out.len() >= out.capacity() {
            if grown || limit >= INFLATE_GROWN_CAP {
                return None;
            }
            grown = true;
            limit = limit.saturating_mul(4).min(INFLATE_GROWN_CAP);
            out.reserve_exact(limit - out.len());
            continue;
        }
        if (z.total_in(), z.total_out()) == before || z.total_in() as usize >= input.len() {
            // Truncated stream: keep what was recovered.
            return (!out.is_empty()).then_some(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_uncompressed_pages_dict() {
        let pdf = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
                    2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 42 >>\nendobj\n%%EOF\n";
        assert_eq!(page_count(pdf), Some(42));
    }

    #[test]
    fn test_count_before_type_and_compact_syntax() {
        let pdf = b"%PDF-1.7\n<</Count 7/Kids[3 0 R]/Type/Pages>>\n<</Type/Pages/Count 3/Parent 1 0 R>>";
        assert_eq!(page_count(pdf), Some(7));
    }

    #[test]
    fn test_pages_prefix_is_not_pages() {
        let pdf = b"%PDF-1.4\n<< /Type /PagesX /Count 9 >>";
        assert_eq!(page_count(pdf), None);
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(page_count(b"<< /Type /Pages /Count 3 >>"), None);
    }

    #[test]
    fn test_object_stream() {
        let inner = b"2 0 << /Type /Pages /Kids [4 0 R 5 0 R] /Count 12 >>";
        let compressed = zlib(inner);
        let mut pdf = b"%PDF-1.5\n".to_vec();
        pdf.extend_from_slice(
            format!(
                "7 0 obj\n<< /Type /ObjStm /N 1 /First 4 /Filter /FlateDecode /Length {} >>\nstream\r\n",
                compressed.len()
            )
            .as_bytes(),
        );
        pdf.extend_from_slice(&compressed);
        pdf.extend_from_slice(b"\nendstream\nendobj\n%%EOF\n");
        assert_eq!(page_count(&pdf), Some(12));
    }

    #[test]
    fn test_indirect_length_is_skipped() {
        assert_eq!(direct_length(b"<< /Length 12 0 R /Filter /FlateDecode >>"), None);
        assert_eq!(direct_length(b"<< /Length 12 /Filter /FlateDecode >>"), Some(12));
    }

    fn noise(len: usize) -> Vec<u8> {
        let mut state = 0x2545_F491u32;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn test_inflate_grows_once() {
        // Compresses to more than 1/16 but less than 1/4 of its size.
        let mut raw = noise(6000);
        raw.extend(vec![0u8; 60_000]);
        let compressed = zlib(&raw);
        assert!(compressed.len() * 4 < raw.len());
        assert!(compressed.len() * 16 > raw.len());
        assert_eq!(inflate(&compressed).unwrap(), raw);
    }

    #[test]
    fn test_object_stream_needing_grown_buffer() {
        let mut inner = b"2 0 << /Type /Pages /Kids [4 0 R] /Count 31 >>\n".to_vec();
        inner.extend(noise(6000));
        inner.extend(vec![b' '; 60_000]);
        let compressed = zlib(&inner);
        assert!(compressed.len() * 4 < inner.len());
        let mut pdf = b"%PDF-1.5\n".to_vec();
        pdf.extend_from_slice(
            format!(
                "7 0 obj\n<< /Type /ObjStm /N 1 /First 4 /Filter /FlateDecode /Length {} >>\nstream\n",
                compressed.len()
            )
            .as_bytes(),
        );
        pdf.extend_from_slice(&compressed);
        pdf.extend_from_slice(b"\nendstream\nendobj\n");
        assert_eq!(page_count(&pdf), Some(31));
    }

    #[test]
    fn test_pages_dict_far_from_brackets_is_ignored() {
        let mut pdf = b"%PDF-1.4\n<< ".to_vec();
        pdf.extend(vec![b' '; 2 * PAGES_DICT_WINDOW]);
        pdf.extend_from_slice(b"/Type /Pages /Count 5 >>");
        assert_eq!(page_count(&pdf), None);
    }

    #[test]
    fn test_many_unclosed_type_keys_terminate() {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        for _ in 0..5_000 {
            pdf.extend_from_slice(b"<< /Type /Pages /Count ");
        }
        assert_eq!(page_count(&pdf), None);
    }

    #[test]
    fn test_inflate_refuses_bombs() {
        // Ratio far beyond 16x: exceeds the grown buffer.
        let raw = vec![0u8; 16 << 20];
        let compressed = zlib(&raw);
        assert!(inflate(&compressed).is_none());
    }

    #[test]
    fn test_inflate_truncated_keeps_prefix() {
        let raw = noise(10_000);
        let compressed = zlib(&raw);
        let out = inflate(&compressed[..compressed.len() / 2]).unwrap();
        assert!(!out.is_empty());
        assert_eq!(&raw[..out.len()], &out[..]);
    }

    #[test]
    fn test_inflate_garbage() {
        assert!(inflate(b"definitely not zlib").is_none());
    }
}
