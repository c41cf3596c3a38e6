//! Bounded random-access reads over a file, plus endian helpers.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Largest single read any probe may request.
pub(crate) const MAX_READ: usize = 1 << 20;

pub(crate) struct Source<R> {
    inner: R,
    len: u64,
}

impl Source<File> {
    pub(crate) fn open(path: &Path) -> Option<Self> {
        let file = File::open(path).ok()?;
        let len = file.metadata().ok()?.len();
        Some(Self { inner: file, len })
    }
}

impl<R: Read + Seek> Source<R> {
    pub(crate) fn new(mut inner: R) -> Option<Self> {
        let len = inner.seek(SeekFrom::End(0)).ok()?;
        Some(Self { inner, len })
    }

    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    /// Fill `buf` from `offset`; fails on short reads.
    pub(crate) fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Option<()> {
        let end = offset.checked_add(buf.len() as u64)?;
        if end > self.len {
            return None;
        }
        self.inner.seek(SeekFrom::Start(offset)).ok()?;
        self.inner.read_exact(buf).ok()
    }

    /// Read `len` bytes at `offset`, refusing anything over [`MAX_READ`].
    pub(crate) fn bytes_at(&mut self, offset: u64, len: usize) -> Option<Vec<u8>> {
        if len > MAX_READ {
            return None;
        }
        let mut buf = vec![0u8; len];
        self.read_exact_at(offset, &mut buf)?;
        Some(buf)
    }

    /// Up to `len` bytes from the start of the file (shorter if the file is).
    pub(crate) fn prefix(&mut self, len: usize) -> Option<Vec<u8>> {
        let len = len.min(self.len as usize).min(MAX_READ);
        self.bytes_at(0, len)
    }

    pub(crate) fn u8_at(&mut self, offset: u64) -> Option<u8> {
        let mut b = [0u8; 1];
        self.read_exact_at(offset, &mut b)?;
        Some(b[0])
    }

    pub(crate) fn be16_at(&mut self, offset: u64) -> Option<u16> {
        let mut b = [0u8; 2];
        self.read_exact_at(offset, &mut b)?;
        Some(u16::from_be_bytes(b))
    }

    pub(crate) fn be32_at(&mut self, offset: u64) -> Option<u32> {
        let mut b = [0u8; 4];
        self.read_exact_at(offset, &mut b)?;
        Some(u32::from_be_bytes(b))
    }

    pub(crate) fn be64_at(&mut self, offset: u64) -> Option<u64> {
        let mut b = [0u8; 8];
        self.read_exact_at(offset, &mut b)?;
        Some(u64::from_be_bytes(b))
    }

    pub(crate) fn le32_at(&mut self, offset: u64) -> Option<u32> {
        let mut b = [0u8; 4];
        self.read_exact_at(offset, &mut b)?;
        Some(u32::from_le_bytes(b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Little,
    Big,
}

impl Endian {
    pub(crate) fn u16(self, b: &[u8], at: usize) -> Option<u16> {
        let raw: [u8; 2] = b.get(at..at + 2)?.try_into().ok()?;
        Some(match self {
            Endian::Little => u16::from_le_bytes(raw),
            Endian::Big => u16::from_be_bytes(raw),
        })
    }

    pub(crate) fn u32(self, b: &[u8], at: usize) -> Option<u32> {
        let raw: [u8; 4] = b.get(at..at + 4)?.try_into().ok()?;
        Some(match self {
            Endian::Little => u32::from_le_bytes(raw),
            Endian::Big => u32::from_be_bytes(raw),
        })
    }
}

pub(crate) fn be16(b: &[u8], at: usize) -> Option<u16> {
    Endian::Big.u16(b, at)
}

pub(crate) fn be32(b: &[u8], at: usize) -> Option<u32> {
    Endian::Big.u32(b, at)
}

pub(crate) fn le16(b: &[u8], at: usize) -> Option<u16> {
    Endian::Little.u16(b, at)
}

pub(crate) fn le32(b: &[u8], at: usize) -> Option<u32> {
    Endian::Little.u32(b, at)
}

pub(crate) fn be64(b: &[u8], at: usize) -> Option<u64> {
    let raw: [u8; 8] = b.get(at..at + 8)?.try_into().ok()?;
    Some(u64::from_be_bytes(raw))
}
