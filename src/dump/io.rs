//! Buffered byte-level access to a dump file.
//!
//! Parsers consume single bytes, little-endian integers and raw runs from
//! a forward-moving position; the only backward movements are the
//! single-byte rewind before record framing and the sliding
//! corruption-recovery scans, both served from the reader's buffer via
//! relative seeks.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::dump::constants::FILE_BUF_LEN;
use crate::error::Result;

pub struct DumpReader {
    inner: BufReader<File>,
    pos: u64,
    len: u64,
}

impl DumpReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            inner: BufReader::with_capacity(FILE_BUF_LEN, file),
            pos: 0,
            len,
        })
    }

    /// Total file size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Current read position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Read one byte; `None` at end of file.
    pub fn read_u8(&mut self) -> Result<Option<u8>> {
        let buf = self.inner.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        let b = buf[0];
        self.inner.consume(1);
        self.pos += 1;
        Ok(Some(b))
    }

    /// Fill `buf` completely; returns `false` when the file ends first
    /// (truncated input is an end-of-data condition, not an error).
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<bool> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // Position is unreliable after a partial read; pin to EOF.
                self.pos = self.len;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a little-endian u16; `None` at end of file.
    pub fn read_u16_le(&mut self) -> Result<Option<u16>> {
        let mut b = [0u8; 2];
        if !self.read_exact(&mut b)? {
            return Ok(None);
        }
        Ok(Some(u16::from_le_bytes(b)))
    }

    /// Read a little-endian u32; `None` at end of file.
    pub fn read_u32_le(&mut self) -> Result<Option<u32>> {
        let mut b = [0u8; 4];
        if !self.read_exact(&mut b)? {
            return Ok(None);
        }
        Ok(Some(u32::from_le_bytes(b)))
    }

    /// Jump to an absolute position.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    /// Step back one byte. Served from the buffer in the common case.
    pub fn rewind_one(&mut self) -> Result<()> {
        self.inner.seek_relative(-1)?;
        self.pos -= 1;
        Ok(())
    }

    /// Skip forward `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.inner.seek_relative(n as i64)?;
        self.pos += n;
        Ok(())
    }
}

/// Locate `needle` in `haystack`.
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_rewind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.bin");
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let mut r = DumpReader::open(&path).unwrap();
        assert_eq!(r.len(), 4);
        assert_eq!(r.read_u8().unwrap(), Some(1));
        assert_eq!(r.read_u16_le().unwrap(), Some(0x0302));
        assert_eq!(r.position(), 3);
        r.rewind_one().unwrap();
        assert_eq!(r.read_u8().unwrap(), Some(3));
        assert_eq!(r.read_u8().unwrap(), Some(4));
        assert_eq!(r.read_u8().unwrap(), None);
    }

    #[test]
    fn test_read_exact_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.bin");
        std::fs::write(&path, [1u8, 2]).unwrap();

        let mut r = DumpReader::open(&path).unwrap();
        let mut buf = [0u8; 4];
        assert!(!r.read_exact(&mut buf).unwrap());
    }

    #[test]
    fn test_find_bytes() {
        assert_eq!(find_bytes(b"abcdef", b"cd"), Some(2));
        assert_eq!(find_bytes(b"abcdef", b"xy"), None);
        assert_eq!(find_bytes(b"ab", b"abc"), None);
    }
}
