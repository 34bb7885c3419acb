//! TIF markers: three 32 bit words written before every Physical Record by
//! some tape imaging software.
//!
//! ```text
//! offset      type        back        next
//! 0x00000000  0x00000000  0x00000000  0x0000004A
//! 0x0000004A  0x00000000  0x00000000  0x00000456
//! 0x00000456  0x00000000  0x0000004A  0x00000862
//! ...
//! 0x0016E7C0  0x00000001  0x0016E776  0x0016E7CC   EOF marker
//! 0x0016E7CC  0x00000001  0x0016E7C0  0x0016E7D8   EOF marker
//! ```
//!
//! The words should be little-endian but big-endian writers exist; the byte
//! order is detected from the first marker.

use byteorder::{LittleEndian, WriteBytesExt};
use log::{error, warn};
use std::io::{Read, Seek, Write};

use crate::welllog::cursor::ByteCursor;
use crate::welllog::types::error::{Result, WellLogError};

pub const TIF_WORD_BYTES: usize = 4;
pub const TIF_TOTAL_BYTES: usize = 3 * TIF_WORD_BYTES;
/// A first `next` word above this can only be a byte swapped marker.
pub const TIF_FIRST_WORD_LIMIT: u32 = 0xFFFF + TIF_TOTAL_BYTES as u32;
pub const TIF_TYPE_EOF: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TifWords {
    pub tif_type: u32,
    pub back: u32,
    pub next: u32,
}

impl TifWords {
    fn read<R: Read + Seek>(cursor: &mut ByteCursor<R>, big_endian: bool) -> Result<Self> {
        let mut word = || -> Result<u32> {
            if big_endian {
                cursor.read_u32()
            } else {
                cursor.read_u32_le()
            }
        };
        Ok(Self {
            tif_type: word()?,
            back: word()?,
            next: word()?,
        })
    }

    fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Reading state for TIF markers.
#[derive(Debug, Clone)]
pub struct TifMarkers {
    has_tif: bool,
    is_reversed: bool,
    allow_pr_padding: bool,
    words: TifWords,
    /// Start of the previous marker, `None` after a random access seek.
    previous: Option<u64>,
}

impl TifMarkers {
    /// Detect the presence and byte order of TIF markers from the start of
    /// the source, leaving it at offset 0.
    ///
    /// # Arguments
    /// * `allow_pr_padding` - Consume padding after a Physical Record by
    ///   trusting the `next` marker instead of failing.
    pub fn detect<R: Read + Seek>(cursor: &mut ByteCursor<R>, allow_pr_padding: bool) -> Result<Self> {
        cursor.seek(0)?;
        let (has_tif, is_reversed) = match TifWords::read(cursor, false) {
            Ok(w) if w.tif_type == 0 && w.back == 0 => (true, w.next > TIF_FIRST_WORD_LIMIT),
            Ok(_) => (false, false),
            Err(WellLogError::Eof { .. }) => (false, false),
            Err(e) => return Err(e),
        };
        cursor.seek(0)?;
        Ok(Self {
            has_tif,
            is_reversed,
            allow_pr_padding,
            words: TifWords::default(),
            previous: Some(0),
        })
    }

    pub fn has_tif(&self) -> bool {
        self.has_tif
    }

    /// True if the markers were written big-endian.
    pub fn is_reversed(&self) -> bool {
        self.is_reversed
    }

    pub fn words(&self) -> TifWords {
        self.words
    }

    /// The last marker read was an EOF marker.
    pub fn eof(&self) -> bool {
        self.words.tif_type == TIF_TYPE_EOF
    }

    /// Forget the previous marker; the caller is seeking so linear checks
    /// no longer apply.
    pub fn reset(&mut self) {
        self.words = TifWords::default();
        self.previous = None;
    }

    fn has_previous(&self) -> bool {
        self.previous.is_some() && !self.words.is_zero()
    }

    /// Read the marker (and a following one if this is an EOF marker).
    ///
    /// Returns the offset of the marker, which differs from the position on
    /// entry when padding was consumed, or `None` if the file has no markers.
    ///
    /// # Errors
    /// `Framing` if `next` or `back` do not agree with the file position,
    /// `Eof` if the file ends inside a marker.
    pub fn read<R: Read + Seek>(&mut self, cursor: &mut ByteCursor<R>) -> Result<Option<u64>> {
        if !self.has_tif {
            return Ok(None);
        }
        let tell = self.read_one(cursor)?;
        if self.eof() {
            self.read_one(cursor)?;
        }
        Ok(Some(tell))
    }

    fn read_one<R: Read + Seek>(&mut self, cursor: &mut ByteCursor<R>) -> Result<u64> {
        let mut tell = cursor.position();
        if self.has_previous() && u64::from(self.words.next) != tell {
            let next = u64::from(self.words.next);
            if self.allow_pr_padding && next > tell {
                warn!(
                    "TIF: tell 0x{:x} making up PR padding of 0x{:x} by seeking to 0x{:x}",
                    tell,
                    next - tell,
                    next
                );
                cursor.seek(next)?;
                tell = next;
            } else {
                return Err(WellLogError::Framing {
                    offset: tell,
                    message: format!("TIF expected next marker at 0x{:x}", next),
                });
            }
        }
        self.words = TifWords::read(cursor, self.is_reversed)?;
        if self.has_previous() {
            if let Some(previous) = self.previous {
                if u64::from(self.words.back) != previous {
                    let message = format!(
                        "TIF back marker 0x{:x} does not match previous marker at 0x{:x}",
                        self.words.back, previous
                    );
                    if !self.allow_pr_padding {
                        return Err(WellLogError::Framing { offset: tell, message });
                    }
                    error!("{}", message);
                }
            }
        }
        self.previous = Some(tell);
        Ok(tell)
    }
}

/// Writing state for TIF markers.
#[derive(Debug, Clone, Default)]
pub struct TifWriter {
    words: TifWords,
    previous_diff: u32,
}

impl TifWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the marker for a Physical Record of `pr_length` bytes including
    /// its header and trailer.
    pub fn write(&mut self, sink: &mut impl Write, pr_length: usize) -> Result<()> {
        let step = u32::try_from(pr_length + TIF_TOTAL_BYTES).map_err(|_| WellLogError::Framing {
            offset: u64::from(self.words.next),
            message: format!("physical record of {} bytes too long for TIF markers", pr_length),
        })?;
        self.words.next += step;
        sink.write_u32::<LittleEndian>(self.words.tif_type)?;
        sink.write_u32::<LittleEndian>(self.words.back)?;
        sink.write_u32::<LittleEndian>(self.words.next)?;
        self.words.back += self.previous_diff;
        self.previous_diff = step;
        Ok(())
    }

    /// The pair of EOF markers that end a TIF file.
    pub fn close(&mut self, sink: &mut impl Write) -> Result<()> {
        self.words.tif_type = TIF_TYPE_EOF;
        self.write(sink, 0)?;
        self.write(sink, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn written(lengths: &[usize]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = TifWriter::new();
        for &len in lengths {
            writer.write(&mut out, len).unwrap();
            out.extend(vec![0u8; len]);
        }
        writer.close(&mut out).unwrap();
        out
    }

    #[test]
    fn writer_markers_chain() {
        let bytes = written(&[0x3E, 0x400]);
        assert_eq!(&bytes[..12], &[0, 0, 0, 0, 0, 0, 0, 0, 0x4A, 0, 0, 0]);
        let second = &bytes[0x4A..0x4A + 12];
        assert_eq!(second, &[0, 0, 0, 0, 0, 0, 0, 0, 0x56, 0x04, 0, 0]);
        let eof = &bytes[0x456..0x456 + 12];
        assert_eq!(eof, &[1, 0, 0, 0, 0x4A, 0, 0, 0, 0x62, 0x04, 0, 0]);
        assert_eq!(bytes.len(), 0x456 + 24);
    }

    #[test]
    fn detect_and_read() {
        let bytes = written(&[0x3E, 0x400]);
        let mut cursor = ByteCursor::new(Cursor::new(bytes)).unwrap();
        let mut tif = TifMarkers::detect(&mut cursor, false).unwrap();
        assert!(tif.has_tif());
        assert!(!tif.is_reversed());
        assert_eq!(tif.read(&mut cursor).unwrap(), Some(0));
        cursor.skip(0x3E).unwrap();
        assert_eq!(tif.read(&mut cursor).unwrap(), Some(0x4A));
        cursor.skip(0x400).unwrap();
        assert_eq!(tif.read(&mut cursor).unwrap(), Some(0x456));
        assert!(tif.eof());
        assert!(cursor.at_eof());
    }

    #[test]
    fn detect_reversed_and_absent() {
        let mut bytes = vec![0u8; 8];
        bytes.extend([0, 0, 0, 0x4A]);
        let mut cursor = ByteCursor::new(Cursor::new(bytes)).unwrap();
        assert!(TifMarkers::detect(&mut cursor, false).unwrap().is_reversed());

        let mut cursor = ByteCursor::new(Cursor::new(vec![0x00, 0x3E, 0x80, 0x00])).unwrap();
        assert!(!TifMarkers::detect(&mut cursor, false).unwrap().has_tif());
    }

    #[test]
    fn padding_needs_allowance() {
        let marker = |t: u32, b: u32, n: u32| {
            let mut out = Vec::new();
            for w in [t, b, n] {
                out.extend(w.to_le_bytes());
            }
            out
        };
        // Two bytes of padding after the first record.
        let mut bytes = marker(0, 0, 18);
        bytes.extend([0u8; 6]);
        bytes.extend(marker(0, 0, 34));
        bytes.extend([0u8; 4]);

        let mut cursor = ByteCursor::new(Cursor::new(bytes.clone())).unwrap();
        let mut tif = TifMarkers::detect(&mut cursor, false).unwrap();
        tif.read(&mut cursor).unwrap();
        cursor.skip(4).unwrap();
        assert!(matches!(tif.read(&mut cursor), Err(WellLogError::Framing { .. })));

        let mut cursor = ByteCursor::new(Cursor::new(bytes)).unwrap();
        let mut tif = TifMarkers::detect(&mut cursor, true).unwrap();
        tif.read(&mut cursor).unwrap();
        cursor.skip(4).unwrap();
        assert_eq!(tif.read(&mut cursor).unwrap(), Some(18));
        assert_eq!(tif.words().next, 34);
    }
}
