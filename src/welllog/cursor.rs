//! Low-level byte reading over files and in-memory logical data.
//!
//! Two cursors live here:
//! - [`ByteCursor`] wraps any seekable source, tracks the absolute offset and
//!   turns short reads into [`WellLogError::Eof`] carrying that offset.
//! - [`LogicalData`] is the reassembled body of one logical record, read byte
//!   by byte by the EFLR, IFLR and table decoders.

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

use super::types::error::{Result, WellLogError};

/// Sequential big-endian reads from a seekable byte source.
///
/// No buffering is added; wrap a `File` in a `BufReader` if the access pattern
/// warrants it.
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    position: u64,
    len: u64,
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap `inner`, positioned at its start.
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner,
            position: 0,
            len,
        })
    }

    /// Absolute offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the source when it was opened.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    pub fn at_eof(&self) -> bool {
        self.position >= self.len
    }

    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        self.position = position;
        Ok(())
    }

    pub fn skip(&mut self, count: u64) -> Result<()> {
        self.seek(self.position + count)
    }

    /// Fill `buf` completely or fail with `Eof` at the starting offset.
    ///
    /// On failure the cursor is restored to where the read started.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let start = self.position;
        let got = self.fill(buf)?;
        if got < buf.len() {
            self.seek(start)?;
            return Err(WellLogError::Eof {
                offset: start,
                wanted: buf.len(),
                available: got,
            });
        }
        Ok(())
    }

    /// Exactly `count` bytes or `Eof`.
    pub fn read_exact(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Up to `count` bytes, fewer only at end of file.
    pub fn read_up_to(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        let got = self.fill(&mut buf)?;
        buf.truncate(got);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_into(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_into(&mut buf)?;
        Ok(BigEndian::read_u16(&buf))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf)?;
        Ok(BigEndian::read_u32(&buf))
    }

    /// Little-endian u32, used by TIF markers.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut got = 0;
        while got < buf.len() {
            match self.inner.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.position += got as u64;
        Ok(got)
    }
}

/// Write exactly two bytes, big-endian.
pub fn write_u16_be(value: u16, sink: &mut impl Write) -> Result<()> {
    sink.write_u16::<BigEndian>(value)?;
    Ok(())
}

/// The reassembled data of one logical record with a read index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalData {
    bytes: Vec<u8>,
    index: usize,
}

impl LogicalData {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, index: 0 }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes left to read.
    pub fn remain(&self) -> usize {
        self.bytes.len().saturating_sub(self.index)
    }

    pub fn has_remaining(&self) -> bool {
        self.remain() > 0
    }

    /// Next byte without advancing.
    pub fn peek(&self) -> Result<u8> {
        self.bytes.get(self.index).copied().ok_or_else(|| self.eof(1))
    }

    pub fn read(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.index += 1;
        Ok(b)
    }

    /// The next `length` bytes, advancing past them.
    pub fn chunk(&mut self, length: usize) -> Result<&[u8]> {
        if length > self.remain() {
            return Err(self.eof(length));
        }
        let start = self.index;
        self.index += length;
        Ok(&self.bytes[start..start + length])
    }

    /// Advance without reading.
    pub fn seek(&mut self, length: usize) -> Result<()> {
        if length > self.remain() {
            return Err(self.eof(length));
        }
        self.index += length;
        Ok(())
    }

    /// Up to `length` bytes from the index without advancing.
    pub fn view_remaining(&self, length: usize) -> &[u8] {
        let end = (self.index + length).min(self.bytes.len());
        &self.bytes[self.index.min(end)..end]
    }

    pub fn rewind(&mut self) {
        self.index = 0;
    }

    fn eof(&self, wanted: usize) -> WellLogError {
        WellLogError::Eof {
            offset: self.index as u64,
            wanted,
            available: self.remain(),
        }
    }
}

impl From<Vec<u8>> for LogicalData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}
