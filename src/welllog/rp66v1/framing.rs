//! Visible Record and Logical Record Segment framing.
//!
//! ```text
//! SUL (80) | VR hdr (4) | LRSH (4) body [pad] [chk] [tl] | LRSH (4) body ... | VR hdr (4) | ...
//!          |<---------------------- VR length ---------------------------->|
//! ```
//!
//! A logical record is one or more segments, possibly spanning Visible
//! Records. [`FileRead`] walks them in file order: either reassembling whole
//! records ([`FileRead::next_logical_record`]) or just collecting positions
//! ([`FileRead::scan_positions`]), and can later re-read any part of a record
//! from its position ([`FileRead::get_file_logical_data`]).

use byteorder::{BigEndian, ByteOrder};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Seek};

use super::index::IndexOptions;
use super::sul::{StorageUnitLabel, SUL_SIZE};
use crate::welllog::cursor::{ByteCursor, LogicalData};
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::ProgressSink;

pub const VISIBLE_RECORD_HEADER_LENGTH: u64 = 4;
pub const VISIBLE_RECORD_VERSION: u16 = 0xFF01;
pub const VISIBLE_RECORD_MIN_LENGTH: u16 = 20;
pub const VISIBLE_RECORD_MAX_LENGTH: u16 = 16384;
pub const LRSH_LENGTH: u64 = 4;
/// Smallest segment a well formed file contains.
pub const LRSH_MIN_LENGTH: u16 = 16;

const FIRST_VISIBLE_RECORD: u64 = SUL_SIZE as u64;
const FIRST_LRSH: u64 = FIRST_VISIBLE_RECORD + VISIBLE_RECORD_HEADER_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRecord {
    pub position: u64,
    pub length: u16,
    pub version: u16,
}

impl VisibleRecord {
    /// Read and validate a Visible Record header at the cursor.
    ///
    /// # Errors
    /// `Eof` if the header is cut short, `Framing` for a bad length or version.
    pub fn read<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let position = cursor.position();
        let length = cursor.read_u16()?;
        let version = cursor.read_u16()?;
        let vr = Self {
            position,
            length,
            version,
        };
        vr.validate()?;
        trace!("{}", vr);
        Ok(vr)
    }

    pub fn validate(&self) -> Result<()> {
        if self.length < VISIBLE_RECORD_MIN_LENGTH || self.length > VISIBLE_RECORD_MAX_LENGTH {
            return Err(WellLogError::Framing {
                offset: self.position,
                message: format!(
                    "Visible Record length {} not in range [{}, {}]",
                    self.length, VISIBLE_RECORD_MIN_LENGTH, VISIBLE_RECORD_MAX_LENGTH
                ),
            });
        }
        if self.version != VISIBLE_RECORD_VERSION {
            return Err(WellLogError::Framing {
                offset: self.position,
                message: format!(
                    "Visible Record version 0x{:04X} is not 0x{:04X}",
                    self.version, VISIBLE_RECORD_VERSION
                ),
            });
        }
        Ok(())
    }

    /// File offset just past this Visible Record.
    pub fn next_position(&self) -> u64 {
        self.position + self.length as u64
    }

    pub fn as_bytes(&self) -> [u8; 4] {
        let mut out = [0u8; 4];
        BigEndian::write_u16(&mut out[0..2], self.length);
        BigEndian::write_u16(&mut out[2..4], self.version);
        out
    }
}

impl fmt::Display for VisibleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<VisibleRecord: position=0x{:08x} length=0x{:04x} version=0x{:04x}>",
            self.position, self.length, self.version
        )
    }
}

/// The attribute byte of a Logical Record Segment Header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LrshAttributes(pub u8);

impl LrshAttributes {
    pub const EFLR: u8 = 0x80;
    pub const HAS_PREDECESSOR: u8 = 0x40;
    pub const HAS_SUCCESSOR: u8 = 0x20;
    pub const ENCRYPTED: u8 = 0x10;
    pub const ENCRYPTION_PACKET: u8 = 0x08;
    pub const CHECKSUM: u8 = 0x04;
    pub const TRAILING_LENGTH: u8 = 0x02;
    pub const PADDING: u8 = 0x01;

    pub fn is_eflr(self) -> bool {
        self.0 & Self::EFLR != 0
    }

    pub fn is_first(self) -> bool {
        self.0 & Self::HAS_PREDECESSOR == 0
    }

    pub fn is_last(self) -> bool {
        self.0 & Self::HAS_SUCCESSOR == 0
    }

    pub fn is_encrypted(self) -> bool {
        self.0 & Self::ENCRYPTED != 0
    }

    pub fn has_encryption_packet(self) -> bool {
        self.0 & Self::ENCRYPTION_PACKET != 0
    }

    pub fn has_checksum(self) -> bool {
        self.0 & Self::CHECKSUM != 0
    }

    pub fn has_trailing_length(self) -> bool {
        self.0 & Self::TRAILING_LENGTH != 0
    }

    pub fn has_pad(self) -> bool {
        self.0 & Self::PADDING != 0
    }

    /// Bytes after the logical data: checksum and trailing length.
    pub fn tail_length(self) -> u16 {
        let mut n = 0;
        if self.has_checksum() {
            n += 2;
        }
        if self.has_trailing_length() {
            n += 2;
        }
        n
    }

    /// Padding is only stripped from unencrypted segments.
    pub fn must_strip_padding(self) -> bool {
        self.has_pad() && !self.is_encrypted()
    }
}

impl fmt::Display for LrshAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![if self.is_eflr() { "EFLR" } else { "IFLR" }];
        if !self.is_first() {
            parts.push("predecessor");
        }
        if !self.is_last() {
            parts.push("successor");
        }
        if self.is_encrypted() {
            parts.push("encrypted");
        }
        if self.has_encryption_packet() {
            parts.push("encryption packet");
        }
        if self.has_checksum() {
            parts.push("checksum");
        }
        if self.has_trailing_length() {
            parts.push("trailing length");
        }
        if self.has_pad() {
            parts.push("padding");
        }
        write!(f, "{}", parts.join("-"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalRecordSegmentHeader {
    pub position: u64,
    pub length: u16,
    pub attributes: LrshAttributes,
    pub record_type: u8,
}

impl LogicalRecordSegmentHeader {
    /// # Errors
    /// `Eof` if the header is cut short, `Framing` if the length can not hold
    /// the header and its trailing fields.
    pub fn read<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Self> {
        let position = cursor.position();
        let length = cursor.read_u16()?;
        let attributes = LrshAttributes(cursor.read_u8()?);
        let record_type = cursor.read_u8()?;
        let lrsh = Self {
            position,
            length,
            attributes,
            record_type,
        };
        if (length as u64) < LRSH_LENGTH + attributes.tail_length() as u64 {
            return Err(WellLogError::Framing {
                offset: position,
                message: format!("Logical Record Segment length {} is too short", length),
            });
        }
        trace!("{}", lrsh);
        Ok(lrsh)
    }

    pub fn next_position(&self) -> u64 {
        self.position + self.length as u64
    }

    /// Segment body length, padding included.
    pub fn logical_data_length(&self) -> u16 {
        self.length - LRSH_LENGTH as u16 - self.attributes.tail_length()
    }

    pub fn as_bytes(&self) -> [u8; 4] {
        let mut out = [0u8; 4];
        BigEndian::write_u16(&mut out[0..2], self.length);
        out[2] = self.attributes.0;
        out[3] = self.record_type;
        out
    }
}

impl fmt::Display for LogicalRecordSegmentHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<LogicalRecordSegmentHeader: @ 0x{:08x} len=0x{:04x} type={:3} {}>",
            self.position, self.length, self.record_type, self.attributes
        )
    }
}

/// Where a logical record starts: its Visible Record and first segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicalRecordPosition {
    pub vr_position: u64,
    pub lrsh_position: u64,
}

impl LogicalRecordPosition {
    /// # Errors
    /// `Framing` if the segment does not lie inside the Visible Record or
    /// either is before the end of the Storage Unit Label.
    pub fn new(vr: &VisibleRecord, lrsh: &LogicalRecordSegmentHeader) -> Result<Self> {
        let fail = |message: String| WellLogError::Framing {
            offset: lrsh.position,
            message,
        };
        if vr.position < FIRST_VISIBLE_RECORD {
            return Err(fail(format!("Visible Record at {} is inside the Storage Unit Label", vr.position)));
        }
        if lrsh.position < FIRST_LRSH {
            return Err(fail(format!("segment at {} is before the first possible segment", lrsh.position)));
        }
        if lrsh.position + (LRSH_MIN_LENGTH as u64) > vr.next_position() {
            return Err(fail(format!(
                "segment at {} leaves no room for a segment in Visible Record at {} length {}",
                lrsh.position, vr.position, vr.length
            )));
        }
        if lrsh.length < LRSH_MIN_LENGTH || lrsh.length > vr.length - VISIBLE_RECORD_HEADER_LENGTH as u16 {
            return Err(fail(format!(
                "segment length {} not in range [{}, {}]",
                lrsh.length,
                LRSH_MIN_LENGTH,
                vr.length - VISIBLE_RECORD_HEADER_LENGTH as u16
            )));
        }
        Ok(Self {
            vr_position: vr.position,
            lrsh_position: lrsh.position,
        })
    }
}

impl fmt::Display for LogicalRecordPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VR: 0x{:08x} LRSH: 0x{:08x}", self.vr_position, self.lrsh_position)
    }
}

/// What the scan learnt about a logical record without reading its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalDataDescription {
    /// Attributes of the first segment.
    pub attributes: LrshAttributes,
    pub lr_type: u8,
    /// Sum of the segment body lengths, padding included.
    pub ld_length: u64,
}

impl LogicalDataDescription {
    pub fn is_eflr(&self) -> bool {
        self.attributes.is_eflr()
    }

    pub fn is_first(&self) -> bool {
        self.attributes.is_first()
    }

    pub fn is_encrypted(&self) -> bool {
        self.attributes.is_encrypted()
    }
}

/// One index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LrPosDesc {
    pub position: LogicalRecordPosition,
    pub description: LogicalDataDescription,
}

impl fmt::Display for LrPosDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<LrPosDesc {} type: {:3} {} ld_length: {}>",
            self.position, self.description.lr_type, self.description.attributes, self.description.ld_length
        )
    }
}

/// Logical data of one record read back from the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLogicalData {
    pub position: LogicalRecordPosition,
    pub lr_type: u8,
    pub attributes: LrshAttributes,
    pub data: LogicalData,
    sealed: bool,
}

impl FileLogicalData {
    pub fn is_eflr(&self) -> bool {
        self.attributes.is_eflr()
    }

    /// Encrypted data is returned as stored, padding included.
    pub fn is_encrypted(&self) -> bool {
        self.attributes.is_encrypted()
    }

    /// True if the last segment of the record was reached.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

/// A segment body and whether all of it was in the file.
struct SegmentBody {
    bytes: Vec<u8>,
    complete: bool,
}

/// Sequential and positioned reads of logical records.
#[derive(Debug)]
pub struct FileRead<R> {
    cursor: ByteCursor<R>,
    sul: StorageUnitLabel,
    visible_record: Option<VisibleRecord>,
}

impl<R: Read + Seek> FileRead<R> {
    /// Read the Storage Unit Label and position before the first Visible
    /// Record.
    ///
    /// # Errors
    /// `InvalidFormat` if the label is missing or malformed.
    pub fn new(reader: R) -> Result<Self> {
        let mut cursor = ByteCursor::new(reader)?;
        if cursor.len() < SUL_SIZE as u64 {
            return Err(WellLogError::InvalidFormat(format!(
                "file of {} bytes is too short for a Storage Unit Label",
                cursor.len()
            )));
        }
        let sul = StorageUnitLabel::parse(&cursor.read_exact(SUL_SIZE)?)?;
        debug!("Storage Unit Label: sequence {} max record length {}", sul.sequence_number, sul.maximum_record_length);
        Ok(Self {
            cursor,
            sul,
            visible_record: None,
        })
    }

    pub fn sul(&self) -> &StorageUnitLabel {
        &self.sul
    }

    pub fn file_len(&self) -> u64 {
        self.cursor.len()
    }

    /// Go back to the first Visible Record.
    pub fn rewind(&mut self) -> Result<()> {
        self.visible_record = None;
        self.cursor.seek(FIRST_VISIBLE_RECORD)
    }

    /// The next segment header in file order, reading Visible Record headers
    /// as needed. `None` at a clean end of file.
    fn next_segment(&mut self) -> Result<Option<LogicalRecordSegmentHeader>> {
        loop {
            match self.visible_record {
                Some(vr) if self.cursor.position() < vr.next_position() => {
                    let lrsh = LogicalRecordSegmentHeader::read(&mut self.cursor)?;
                    if lrsh.next_position() > vr.next_position() {
                        return Err(WellLogError::Framing {
                            offset: lrsh.position,
                            message: format!(
                                "segment ending at {} overruns Visible Record ending at {}",
                                lrsh.next_position(),
                                vr.next_position()
                            ),
                        });
                    }
                    return Ok(Some(lrsh));
                }
                Some(vr) if self.cursor.position() > vr.next_position() => {
                    return Err(WellLogError::Framing {
                        offset: self.cursor.position(),
                        message: format!("position is past the end of Visible Record at {}", vr.position),
                    });
                }
                _ => {
                    if self.cursor.at_eof() {
                        return Ok(None);
                    }
                    self.visible_record = Some(VisibleRecord::read(&mut self.cursor)?);
                }
            }
        }
    }

    fn current_visible_record(&self, offset: u64) -> Result<VisibleRecord> {
        self.visible_record.ok_or_else(|| WellLogError::Framing {
            offset,
            message: "segment without a Visible Record".into(),
        })
    }

    /// Read a segment body with the cursor just past its header, leaving
    /// the cursor at the next segment.
    fn read_segment_body(&mut self, lrsh: &LogicalRecordSegmentHeader) -> Result<SegmentBody> {
        let wanted = lrsh.logical_data_length() as usize;
        let mut bytes = self.cursor.read_up_to(wanted)?;
        if bytes.len() < wanted {
            return Ok(SegmentBody {
                bytes,
                complete: false,
            });
        }
        if lrsh.attributes.must_strip_padding() {
            let pad = bytes.last().copied().unwrap_or(0) as usize;
            if pad > bytes.len() {
                return Err(WellLogError::Framing {
                    offset: lrsh.position,
                    message: format!("pad count {} exceeds segment data length {}", pad, bytes.len()),
                });
            }
            bytes.truncate(bytes.len() - pad);
        }
        self.cursor.seek(lrsh.next_position())?;
        Ok(SegmentBody {
            bytes,
            complete: true,
        })
    }

    /// Reassemble the next logical record in file order.
    ///
    /// A record cut short by the end of the file is returned unsealed.
    ///
    /// # Errors
    /// `Framing` on malformed headers or segments out of sequence.
    pub fn next_logical_record(&mut self) -> Result<Option<FileLogicalData>> {
        let first = match self.next_segment()? {
            Some(lrsh) => lrsh,
            None => return Ok(None),
        };
        if !first.attributes.is_first() {
            return Err(WellLogError::Framing {
                offset: first.position,
                message: "expected the first segment of a logical record".into(),
            });
        }
        let vr = self.current_visible_record(first.position)?;
        let position = LogicalRecordPosition::new(&vr, &first)?;
        let (data, sealed) = self.read_segments(first, 0, None)?;
        if !sealed {
            warn!("Logical record at {} is incomplete at end of file", position);
        }
        Ok(Some(FileLogicalData {
            position,
            lr_type: first.record_type,
            attributes: first.attributes,
            data: LogicalData::new(data),
            sealed,
        }))
    }

    /// Iterate the remaining logical records.
    pub fn iter_logical_records(&mut self) -> LogicalRecords<'_, R> {
        LogicalRecords { file: self }
    }

    /// Read segment bodies starting with `first`, keeping the logical data
    /// in `[offset, offset + length)`.
    fn read_segments(
        &mut self,
        first: LogicalRecordSegmentHeader,
        offset: usize,
        length: Option<usize>,
    ) -> Result<(Vec<u8>, bool)> {
        let mut out = Vec::new();
        let mut consumed = 0usize;
        let mut lrsh = first;
        loop {
            let body = self.read_segment_body(&lrsh)?;
            let start = offset.saturating_sub(consumed).min(body.bytes.len());
            out.extend_from_slice(&body.bytes[start..]);
            consumed += body.bytes.len();
            if !body.complete {
                return Ok((out, false));
            }
            if let Some(length) = length {
                if out.len() >= length {
                    out.truncate(length);
                    return Ok((out, lrsh.attributes.is_last()));
                }
            }
            if lrsh.attributes.is_last() {
                return Ok((out, true));
            }
            lrsh = match self.next_segment() {
                Ok(Some(next)) => next,
                Ok(None) | Err(WellLogError::Eof { .. }) => return Ok((out, false)),
                Err(e) => return Err(e),
            };
            if lrsh.attributes.is_first() {
                return Err(WellLogError::Framing {
                    offset: lrsh.position,
                    message: "first segment found while the previous record has a successor".into(),
                });
            }
        }
    }

    /// Seek to a record's first segment, checking the headers on the way.
    fn seek_record(&mut self, position: LogicalRecordPosition) -> Result<LogicalRecordSegmentHeader> {
        self.cursor.seek(position.vr_position)?;
        let vr = VisibleRecord::read(&mut self.cursor)?;
        self.cursor.seek(position.lrsh_position)?;
        let lrsh = LogicalRecordSegmentHeader::read(&mut self.cursor)?;
        LogicalRecordPosition::new(&vr, &lrsh)?;
        if !lrsh.attributes.is_first() {
            return Err(WellLogError::Framing {
                offset: lrsh.position,
                message: "position is not the first segment of a logical record".into(),
            });
        }
        self.visible_record = Some(vr);
        Ok(lrsh)
    }

    /// Logical data of the record at `position`, from byte `offset` for
    /// `length` bytes or to the end of the record.
    ///
    /// The result is sealed only if the record's last segment was reached.
    ///
    /// # Errors
    /// `Framing` if `position` does not hold the start of a logical record.
    pub fn get_file_logical_data(
        &mut self,
        position: LogicalRecordPosition,
        offset: usize,
        length: Option<usize>,
    ) -> Result<FileLogicalData> {
        let first = self.seek_record(position)?;
        let (data, sealed) = self.read_segments(first, offset, length)?;
        Ok(FileLogicalData {
            position,
            lr_type: first.record_type,
            attributes: first.attributes,
            data: LogicalData::new(data),
            sealed,
        })
    }

    pub fn visible_record_at(&mut self, position: u64) -> Result<VisibleRecord> {
        self.cursor.seek(position)?;
        let vr = VisibleRecord::read(&mut self.cursor)?;
        self.visible_record = Some(vr);
        Ok(vr)
    }

    /// Check that `position` still frames the start of a record.
    pub fn check_position(&mut self, position: LogicalRecordPosition) -> Result<()> {
        self.seek_record(position).map(|_| ())
    }

    /// One pass over the file collecting record positions and descriptions
    /// without reading record bodies.
    ///
    /// # Errors
    /// The first framing error, unless `options.skip_malformed` is set in
    /// which case the scan resumes at the next Visible Record.
    pub fn scan_positions(&mut self, options: &IndexOptions, progress: &mut dyn ProgressSink) -> Result<Vec<LrPosDesc>> {
        self.rewind()?;
        let total = self.cursor.len();
        let mut entries: Vec<LrPosDesc> = Vec::new();
        let mut current: Option<LrPosDesc> = None;
        loop {
            progress.record(self.cursor.position(), total);
            let lrsh = match self.next_segment() {
                Ok(Some(lrsh)) => lrsh,
                Ok(None) => break,
                Err(e @ WellLogError::Eof { .. }) => {
                    if options.skip_malformed {
                        warn!("Stopping scan at truncated header: {}", e);
                        break;
                    }
                    return Err(e);
                }
                Err(e) => {
                    self.resync(options, e)?;
                    current = None;
                    continue;
                }
            };
            match self.extend_entry(&lrsh, current.take()) {
                Ok(entry) => {
                    if lrsh.attributes.is_last() {
                        entries.push(entry);
                    } else {
                        current = Some(entry);
                    }
                    self.cursor.seek(lrsh.next_position())?;
                }
                Err(e) => {
                    self.resync(options, e)?;
                }
            }
        }
        if let Some(entry) = current {
            warn!("Logical record {} has no last segment before end of file", entry);
            entries.push(entry);
        }
        progress.record(total, total);
        Ok(entries)
    }

    fn extend_entry(&self, lrsh: &LogicalRecordSegmentHeader, current: Option<LrPosDesc>) -> Result<LrPosDesc> {
        match (lrsh.attributes.is_first(), current) {
            (true, None) => {
                let vr = self.current_visible_record(lrsh.position)?;
                Ok(LrPosDesc {
                    position: LogicalRecordPosition::new(&vr, lrsh)?,
                    description: LogicalDataDescription {
                        attributes: lrsh.attributes,
                        lr_type: lrsh.record_type,
                        ld_length: lrsh.logical_data_length() as u64,
                    },
                })
            }
            (true, Some(previous)) => Err(WellLogError::Framing {
                offset: lrsh.position,
                message: format!("first segment found while {} has a successor", previous),
            }),
            (false, None) => Err(WellLogError::Framing {
                offset: lrsh.position,
                message: "segment has a predecessor but follows a last segment".into(),
            }),
            (false, Some(mut entry)) => {
                entry.description.ld_length += lrsh.logical_data_length() as u64;
                Ok(entry)
            }
        }
    }

    /// Skip to the next Visible Record after a framing error, or give up.
    fn resync(&mut self, options: &IndexOptions, error: WellLogError) -> Result<()> {
        if !options.skip_malformed {
            return Err(error);
        }
        match self.visible_record.take() {
            Some(vr) => {
                warn!("Skipping to Visible Record at {} after: {}", vr.next_position(), error);
                self.cursor.seek(vr.next_position())
            }
            None => Err(error),
        }
    }
}

/// Iterator over reassembled logical records, see
/// [`FileRead::iter_logical_records`].
pub struct LogicalRecords<'a, R> {
    file: &'a mut FileRead<R>,
}

impl<R: Read + Seek> Iterator for LogicalRecords<'_, R> {
    type Item = Result<FileLogicalData>;

    fn next(&mut self) -> Option<Self::Item> {
        self.file.next_logical_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::welllog::types::models::NoProgress;
    use std::io::Cursor;

    /// SUL + one Visible Record holding `segments` of `(attributes, type, body)`.
    fn file_with(segments: &[(u8, u8, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (attributes, lr_type, data) in segments {
            let lrsh = LogicalRecordSegmentHeader {
                position: 0,
                length: (LRSH_LENGTH as usize + data.len()) as u16,
                attributes: LrshAttributes(*attributes),
                record_type: *lr_type,
            };
            body.extend(lrsh.as_bytes());
            body.extend(data);
        }
        let vr = VisibleRecord {
            position: 80,
            length: (VISIBLE_RECORD_HEADER_LENGTH as usize + body.len()) as u16,
            version: VISIBLE_RECORD_VERSION,
        };
        let mut out = StorageUnitLabel::create(1, 8192, b"test").as_bytes();
        out.extend(vr.as_bytes());
        out.extend(body);
        out
    }

    #[test]
    fn attribute_bits() {
        let a = LrshAttributes(0x81);
        assert!(a.is_eflr() && a.is_first() && a.is_last() && a.has_pad());
        assert!(a.must_strip_padding());
        assert!(!LrshAttributes(0x11).must_strip_padding());
        assert_eq!(LrshAttributes(0x06).tail_length(), 4);
        assert!(!LrshAttributes(0x60).is_first());
        assert!(!LrshAttributes(0x60).is_last());
    }

    #[test]
    fn records_span_segments_and_strip_padding() {
        let bytes = file_with(&[
            (0x80 | 0x20, 3, vec![1u8; 12]),
            (0x80 | 0x40 | 0x01, 3, vec![2, 2, 2, 2, 2, 2, 2, 2, 2, 0, 0, 3]),
            (0x00, 0, vec![9u8; 12]),
        ]);
        let mut file = FileRead::new(Cursor::new(bytes)).unwrap();
        let records: Vec<_> = file.iter_logical_records().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].data.len(), 21);
        assert!(records[0].is_sealed());
        assert!(records[0].is_eflr());
        assert_eq!(records[1].lr_type, 0);
        assert_eq!(records[1].position.lrsh_position, 84 + 16 + 16);

        let entries = file.scan_positions(&IndexOptions::default(), &mut NoProgress).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description.ld_length, 24);
        let part = file.get_file_logical_data(entries[0].position, 2, Some(4)).unwrap();
        assert_eq!(part.data.bytes(), &[1, 1, 1, 1]);
        assert!(!part.is_sealed());
        let across = file.get_file_logical_data(entries[0].position, 10, Some(4)).unwrap();
        assert_eq!(across.data.bytes(), &[1, 1, 2, 2]);
        assert!(across.is_sealed());
        let tail = file.get_file_logical_data(entries[0].position, 20, None).unwrap();
        assert_eq!(tail.data.bytes(), &[2]);
        assert!(tail.is_sealed());
    }

    #[test]
    fn segments_out_of_sequence() {
        let bytes = file_with(&[(0x80, 3, vec![0u8; 12]), (0x80 | 0x40, 3, vec![0u8; 12])]);
        let mut file = FileRead::new(Cursor::new(bytes)).unwrap();
        let err = file
            .scan_positions(&IndexOptions::default(), &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, WellLogError::Framing { offset: 100, .. }));
    }

    #[test]
    fn bad_visible_record_version() {
        let mut bytes = file_with(&[(0x80, 0, vec![0u8; 12])]);
        bytes[83] = 0x02;
        let mut file = FileRead::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(file.next_logical_record(), Err(WellLogError::Framing { offset: 80, .. })));
    }
}
