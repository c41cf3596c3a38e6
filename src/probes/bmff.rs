//! ISO base media file format box walking, shared by the HEIC/CR3 image
//! probe and the MP4/MOV duration probe.

use std::io::{Read, Seek};

use super::bytes::Source;

/// Sibling boxes scanned per level before giving up.
const MAX_BOXES_PER_LEVEL: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BoxHeader {
    pub kind: [u8; 4],
    /// First byte after the header.
    pub payload: u64,
    /// One past the last byte of the box.
    pub end: u64,
}

impl BoxHeader {
    pub(crate) fn payload_len(&self) -> u64 {
        self.end - self.payload
    }
}

/// Parse the box header at `offset`, which must fit inside `limit`.
pub(crate) fn read_header<R: Read + Seek>(
    src: &mut Source<R>,
    offset: u64,
    limit: u64,
) -> Option<BoxHeader> {
    if offset.checked_add(8)? > limit {
        return None;
    }
    let size = src.be32_at(offset)? as u64;
    let mut kind = [0u8; 4];
    src.read_exact_at(offset + 4, &mut kind)?;
    let (header_len, total) = match size {
        0 => (8, limit - offset),
        1 => (16, src.be64_at(offset + 8)?),
        n => (8, n),
    };
    if total < header_len {
        return None;
    }
    let end = offset.checked_add(total)?;
    if end > limit {
        return None;
    }
    Some(BoxHeader {
        kind,
        payload: offset + header_len,
        end,
    })
}

/// All direct children of the range `[start, end)` with the given type.
pub(crate) fn children<R: Read + Seek>(
    src: &mut Source<R>,
    start: u64,
    end: u64,
    kind: &[u8; 4],
) -> Vec<BoxHeader> {
    let mut found = Vec::new();
    let mut offset = start;
    for _ in 0..MAX_BOXES_PER_LEVEL {
        let Some(header) = read_header(src, offset, end) else {
            break;
        };
        if &header.kind == kind {
            found.push(header);
        }
        if header.end <= offset {
            break;
        }
        offset = header.end;
    }
    found
}

pub(crate) fn find_child<R: Read + Seek>(
    src: &mut Source<R>,
    start: u64,
    end: u64,
    kind: &[u8; 4],
) -> Option<BoxHeader> {
    let mut offset = start;
    for _ in 0..MAX_BOXES_PER_LEVEL {
        let header = read_header(src, offset, end)?;
        if &header.kind == kind {
            return Some(header);
        }
        if header.end <= offset {
            return None;
        }
        offset = header.end;
    }
    None
}

/// Major and compatible brands of a leading `ftyp` box.
pub(crate) fn brands<R: Read + Seek>(src: &mut Source<R>) -> Option<Vec<[u8; 4]>> {
    let len = src.len();
    let ftyp = read_header(src, 0, len)?;
    if &ftyp.kind != b"ftyp" || ftyp.payload_len() < 8 {
        return None;
    }
    let body_len = ftyp.payload_len().min(256) as usize;
    let body = src.bytes_at(ftyp.payload, body_len)?;
    let mut out = vec![body[0..4].try_into().ok()?];
    // Skip minor_version at 4..8.
    for chunk in body[8..].chunks_exact(4) {
        out.push(chunk.try_into().ok()?);
    }
    Some(out)
}

#[cfg(test)]
pub(crate) fn make_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&((8 + payload.len()) as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}
