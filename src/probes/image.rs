//! Image dimensions from file headers: PNG, GIF, JPEG, BMP, HEIC/HEIF,
//! TIFF (and TIFF-based RAW) and CR3.

use std::collections::HashSet;
use std::io::{Read, Seek};
use std::path::Path;

use super::bmff;
use super::bytes::{Endian, Source, be16, be32, le16, le32};

const HEIF_BRANDS: [&[u8; 4]; 4] = [b"heic", b"mif1", b"msf1", b"heix"];
const CR3_BRAND: &[u8; 4] = b"crx ";

const TIFF_MAX_IFDS: usize = 32;
const TIFF_MAX_ENTRIES: u16 = 1000;
const TIFF_MAX_OFFSET: u64 = 100_000_000;
const TIFF_TAG_WIDTH: u16 = 0x0100;
const TIFF_TAG_HEIGHT: u16 = 0x0101;
const TIFF_TAG_SUBIFDS: u16 = 0x014A;
const TIFF_TAG_EXIF_IFD: u16 = 0x8769;

const JPEG_MAX_SEGMENTS: usize = 4096;

/// Megapixels x10, rounded; `None` if the file is not a recognised image.
pub fn get_image_megapixels(path: &Path) -> Option<u64> {
    let (width, height) = image_dimensions(path)?;
    megapixels_x10(width, height)
}

/// Pixel width and height of the image at `path`.
pub fn image_dimensions(path: &Path) -> Option<(u64, u64)> {
    let mut src = Source::open(path)?;
    dimensions(&mut src)
}

pub(crate) fn megapixels_x10(width: u64, height: u64) -> Option<u64> {
    if width == 0 || height == 0 {
        return None;
    }
    let pixels = width.checked_mul(height)?;
    Some((pixels as f64 / 100_000.0).round() as u64)
}

pub(crate) fn dimensions<R: Read + Seek>(src: &mut Source<R>) -> Option<(u64, u64)> {
    let head = src.prefix(32)?;
    let dims = if head.starts_with(&[0x89, b'P', b'N', b'G']) {
        png(&head)
    } else if head.starts_with(b"GIF") {
        gif(&head)
    } else if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        jpeg(src)
    } else if head.starts_with(b"BM") {
        bmp(src)
    } else if head.starts_with(b"II\x2A\x00") {
        tiff(src, Endian::Little)
    } else if head.starts_with(b"MM\x00\x2A") {
        tiff(src, Endian::Big)
    } else if head.get(4..8) == Some(b"ftyp") {
        ftyp_image(src)
    } else {
        None
    }?;
    if dims.0 == 0 || dims.1 == 0 {
        return None;
    }
    Some(dims)
}

fn png(head: &[u8]) -> Option<(u64, u64)> {
    Some((be32(head, 16)? as u64, be32(head, 20)? as u64))
}

fn gif(head: &[u8]) -> Option<(u64, u64)> {
    Some((le16(head, 6)? as u64, le16(head, 8)? as u64))
}

fn bmp<R: Read + Seek>(src: &mut Source<R>) -> Option<(u64, u64)> {
    let header = src.bytes_at(0, 26)?;
    let width = le32(&header, 18)? as i32;
    let height = le32(&header, 22)? as i32;
    if width <= 0 {
        return None;
    }
    Some((width as u64, height.unsigned_abs() as u64))
}

fn jpeg<R: Read + Seek>(src: &mut Source<R>) -> Option<(u64, u64)> {
    let mut offset = 2u64;
    for _ in 0..JPEG_MAX_SEGMENTS {
        if src.u8_at(offset)? != 0xFF {
            return None;
        }
        // Markers may be padded with any number of 0xFF fill bytes.
        let mut marker = src.u8_at(offset + 1)?;
        while marker == 0xFF {
            offset += 1;
            marker = src.u8_at(offset + 1)?;
        }
        offset += 2;
        match marker {
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return None,
            _ => {}
        }
        let length = src.be16_at(offset)? as u64;
        if length < 2 {
            return None;
        }
        if matches!(marker, 0xC0..=0xC2) {
            let sof = src.bytes_at(offset, 7)?;
            let height = be16(&sof, 3)? as u64;
            let width = be16(&sof, 5)? as u64;
            return Some((width, height));
        }
        offset += length;
    }
    None
}

fn ftyp_image<R: Read + Seek>(src: &mut Source<R>) -> Option<(u64, u64)> {
    let brands = bmff::brands(src)?;
    if brands[0] == *CR3_BRAND {
        return cr3(src);
    }
    if brands.iter().any(|b| HEIF_BRANDS.contains(&b)) {
        return heif(src);
    }
    None
}

fn heif<R: Read + Seek>(src: &mut Source<R>) -> Option<(u64, u64)> {
    let len = src.len();
    let meta = bmff::find_child(src, 0, len, b"meta")?;
    // `meta` is a full box: version and flags precede its children.
    let iprp = bmff::find_child(src, meta.payload + 4, meta.end, b"iprp")?;
    let ipco = bmff::find_child(src, iprp.payload, iprp.end, b"ipco")?;
    let mut best: Option<(u64, u64)> = None;
    for ispe in bmff::children(src, ipco.payload, ipco.end, b"ispe") {
        if ispe.payload_len() < 12 {
            continue;
        }
        let body = src.bytes_at(ispe.payload, 12)?;
        let dims = (be32(&body, 4)? as u64, be32(&body, 8)? as u64);
        best = larger(best, dims);
    }
    best
}

fn cr3<R: Read + Seek>(src: &mut Source<R>) -> Option<(u64, u64)> {
    let len = src.len();
    let moov = bmff::find_child(src, 0, len, b"moov")?;
    let mut best: Option<(u64, u64)> = None;
    for trak in bmff::children(src, moov.payload, moov.end, b"trak") {
        let Some(tkhd) = bmff::find_child(src, trak.payload, trak.end, b"tkhd") else {
            continue;
        };
        let version = src.u8_at(tkhd.payload)?;
        let at = if version == 1 { 84 } else { 76 };
        if tkhd.payload_len() < at + 8 {
            continue;
        }
        // 16.16 fixed point.
        let width = src.be32_at(tkhd.payload + at)? >> 16;
        let height = src.be32_at(tkhd.payload + at + 4)? >> 16;
        best = larger(best, (width as u64, height as u64));
    }
    best
}

fn larger(current: Option<(u64, u64)>, candidate: (u64, u64)) -> Option<(u64, u64)> {
    match current {
        Some(c) if c.0 * c.1 >= candidate.0 * candidate.1 => Some(c),
        _ if candidate.0 > 0 && candidate.1 > 0 => Some(candidate),
        other => other,
    }
}

fn tiff<R: Read + Seek>(src: &mut Source<R>, endian: Endian) -> Option<(u64, u64)> {
    let header = src.bytes_at(0, 8)?;
    let first = endian.u32(&header, 4)? as u64;

    let mut queue = vec![first];
    let mut seen = HashSet::new();
    let mut best: Option<(u64, u64)> = None;
    let mut walked = 0;

    while let Some(offset) = queue.pop() {
        if walked >= TIFF_MAX_IFDS {
            break;
        }
        if offset == 0 || offset > TIFF_MAX_OFFSET || !seen.insert(offset) {
            continue;
        }
        walked += 1;

        let Some(count) = src.bytes_at(offset, 2).and_then(|b| endian.u16(&b, 0)) else {
            continue;
        };
        if count > TIFF_MAX_ENTRIES {
            continue;
        }
        let table_len = count as usize * 12 + 4;
        let Some(table) = src.bytes_at(offset + 2, table_len) else {
            continue;
        };

        let (mut width, mut height) = (0u64, 0u64);
        for entry in table[..count as usize * 12].chunks_exact(12) {
            let tag = endian.u16(entry, 0)?;
            let kind = endian.u16(entry, 2)?;
            let n = endian.u32(entry, 4)?;
            let value = tiff_value(endian, entry, kind);
            match tag {
                TIFF_TAG_WIDTH => width = value,
                TIFF_TAG_HEIGHT => height = value,
                TIFF_TAG_EXIF_IFD => queue.push(value),
                TIFF_TAG_SUBIFDS => {
                    let pointer = endian.u32(entry, 8)? as u64;
                    if n == 1 {
                        queue.push(pointer);
                    } else if (1..=TIFF_MAX_IFDS as u32).contains(&n) {
                        if let Some(list) = src.bytes_at(pointer, n as usize * 4) {
                            for chunk in list.chunks_exact(4) {
                                queue.push(endian.u32(chunk, 0)? as u64);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        best = larger(best, (width, height));

        let next = endian.u32(&table, count as usize * 12)? as u64;
        queue.push(next);
    }
    best
}

/// Inline value of an IFD entry: SHORT is stored in the first two bytes.
fn tiff_value(endian: Endian, entry: &[u8], kind: u16) -> u64 {
    match kind {
        3 => endian.u16(entry, 8).map_or(0, u64::from),
        _ => endian.u32(entry, 8).map_or(0, u64::from),
    }
}
