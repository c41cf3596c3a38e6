//! Playback duration from container headers: WAV/RIFF, Matroska/WebM and
//! ISO base media (MP4, M4A, M4B, MOV, 3GP, 3G2). Payloads are never decoded.

use std::io::{Read, Seek};
use std::path::Path;

use super::bmff;
use super::bytes::{Source, be32, be64};

const RIFF_MAX_CHUNKS: usize = 1024;

const EBML_HEADER: u64 = 0x1A45_DFA3;
const MKV_SEGMENT: u64 = 0x1853_8067;
const MKV_INFO: u64 = 0x1549_A966;
const MKV_TIMECODE_SCALE: u64 = 0x2A_D7B1;
const MKV_DURATION: u64 = 0x4489;
const MKV_DEFAULT_SCALE: u64 = 1_000_000;
const MKV_MAX_ELEMENTS: usize = 1024;
const MKV_MAX_INFO_LEN: u64 = 64 * 1024;
const UNKNOWN_SIZE: u64 = u64::MAX;

/// Duration in whole seconds; `None` if no supported container header is found.
pub fn get_audio_duration(path: &Path) -> Option<u64> {
    let mut src = Source::open(path)?;
    duration(&mut src)
}

pub(crate) fn duration<R: Read + Seek>(src: &mut Source<R>) -> Option<u64> {
    let head = src.prefix(12)?;
    if head.len() < 12 {
        return None;
    }
    if head.starts_with(b"RIFF") && &head[8..12] == b"WAVE" {
        return wav(src);
    }
    if be32(&head, 0)? as u64 == EBML_HEADER {
        return matroska(src);
    }
    if &head[4..8] == b"ftyp" {
        return isobmff(src);
    }
    None
}

fn wav<R: Read + Seek>(src: &mut Source<R>) -> Option<u64> {
    let mut offset = 12u64;
    let mut byte_rate = None;
    let mut data_size = None;
    for _ in 0..RIFF_MAX_CHUNKS {
        if byte_rate.is_some() && data_size.is_some() {
            break;
        }
        let Some(header) = src.bytes_at(offset, 8) else {
            break;
        };
        let size = src.le32_at(offset + 4)? as u64;
        let payload = offset + 8;
        match &header[0..4] {
            b"fmt " if size >= 12 => byte_rate = Some(src.le32_at(payload + 8)? as u64),
            b"data" => data_size = Some(size),
            _ => {}
        }
        // Chunks are word aligned.
        offset = payload.checked_add(size + (size & 1))?;
    }
    let byte_rate = byte_rate.filter(|&r| r > 0)?;
    Some(data_size? / byte_rate)
}

/// Read an EBML variable-length integer at `offset`. IDs keep their marker
/// bit; sizes drop it and report all-ones as [`UNKNOWN_SIZE`].
fn vint<R: Read + Seek>(src: &mut Source<R>, offset: u64, is_id: bool) -> Option<(u64, u64)> {
    let first = src.u8_at(offset)?;
    if first == 0 {
        return None;
    }
    let len = first.leading_zeros() as usize + 1;
    if is_id && len > 4 {
        return None;
    }
    let mut raw = [0u8; 8];
    src.read_exact_at(offset, &mut raw[..len])?;
    let mut value = 0u64;
    for b in &raw[..len] {
        value = (value << 8) | *b as u64;
    }
    if !is_id {
        let bits = 7 * len as u32;
        let mask = (1u64 << bits) - 1;
        value &= mask;
        if value == mask {
            value = UNKNOWN_SIZE;
        }
    }
    Some((value, len as u64))
}

/// Element header at `offset`: (id, payload offset, payload size).
fn element<R: Read + Seek>(src: &mut Source<R>, offset: u64) -> Option<(u64, u64, u64)> {
    let (id, id_len) = vint(src, offset, true)?;
    let (size, size_len) = vint(src, offset + id_len, false)?;
    Some((id, offset + id_len + size_len, size))
}

fn matroska<R: Read + Seek>(src: &mut Source<R>) -> Option<u64> {
    let len = src.len();
    let (id, payload, size) = element(src, 0)?;
    if id != EBML_HEADER || size == UNKNOWN_SIZE {
        return None;
    }
    let mut offset = payload.checked_add(size)?;

    // Top level: find the Segment, skipping anything else (e.g. Void).
    let (segment_start, segment_end) = loop {
        let (id, payload, size) = element(src, offset)?;
        if id == MKV_SEGMENT {
            let end = if size == UNKNOWN_SIZE {
                len
            } else {
                payload.checked_add(size)?.min(len)
            };
            break (payload, end);
        }
        if size == UNKNOWN_SIZE {
            return None;
        }
        offset = payload.checked_add(size)?;
    };

    let mut offset = segment_start;
    for _ in 0..MKV_MAX_ELEMENTS {
        if offset >= segment_end {
            return None;
        }
        let (id, payload, size) = element(src, offset)?;
        if id == MKV_INFO {
            if size == UNKNOWN_SIZE || size > MKV_MAX_INFO_LEN {
                return None;
            }
            return matroska_info(src, payload, payload + size);
        }
        if size == UNKNOWN_SIZE {
            return None;
        }
        offset = payload.checked_add(size)?;
    }
    None
}

fn matroska_info<R: Read + Seek>(src: &mut Source<R>, start: u64, end: u64) -> Option<u64> {
    let mut scale = MKV_DEFAULT_SCALE;
    let mut duration = None;
    let mut offset = start;
    for _ in 0..MKV_MAX_ELEMENTS {
        if offset >= end {
            break;
        }
        let (id, payload, size) = element(src, offset)?;
        if size == UNKNOWN_SIZE || payload.checked_add(size)? > end {
            return None;
        }
        match id {
            MKV_TIMECODE_SCALE if (1..=8).contains(&size) => {
                let bytes = src.bytes_at(payload, size as usize)?;
                scale = bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
            }
            MKV_DURATION if size == 4 => {
                let bits = src.be32_at(payload)?;
                duration = Some(f32::from_bits(bits) as f64);
            }
            MKV_DURATION if size == 8 => {
                let bits = src.be64_at(payload)?;
                duration = Some(f64::from_bits(bits));
            }
            _ => {}
        }
        offset = payload + size;
    }
    let seconds = duration? * scale as f64 / 1e9;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(seconds.round() as u64)
}

fn isobmff<R: Read + Seek>(src: &mut Source<R>) -> Option<u64> {
    let len = src.len();
    let moov = bmff::find_child(src, 0, len, b"moov")?;
    let mvhd = bmff::find_child(src, moov.payload, moov.end, b"mvhd")?;
    let body_len = mvhd.payload_len().min(32) as usize;
    let body = src.bytes_at(mvhd.payload, body_len)?;
    let (timescale, duration) = match body.first()? {
        0 => (be32(&body, 12)? as u64, be32(&body, 16)? as u64),
        1 => (be32(&body, 20)? as u64, be64(&body, 24)?),
        _ => return None,
    };
    if timescale == 0 {
        return None;
    }
    Some(duration / timescale)
}
