//! LIS Physical Records.
//!
//! ```text
//! [TIF markers] | length u16 | attributes u16 | logical data ... | [record number i16] [file number i16] [checksum u16]
//! ```
//!
//! A Logical Record is carried by one or more Physical Records chained by the
//! successor/predecessor attribute bits. [`PhysicalRecordReader`] presents the
//! logical data of each Logical Record as a contiguous stream and
//! [`PhysicalRecordWriter`] does the reverse.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use log::{trace, warn};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use std::path::Path;

use super::tif::{TifMarkers, TifWriter};
use crate::welllog::cursor::ByteCursor;
use crate::welllog::types::error::{Result, WellLogError};

pub const PR_PRH_LENGTH: usize = 4;
pub const PR_MAX_LENGTH: usize = 0xFFFF;
/// Each of the three optional trailer fields is two bytes.
pub const PR_PRT_FIELD_LENGTH: usize = 2;

pub const PR_SUCCESSOR_ATTRIBUTE_BIT: u16 = 0;
pub const PR_PREDECESSOR_ATTRIBUTE_BIT: u16 = 1;
pub const PR_OLD_CHECK_ERROR_BIT: u16 = 5;
pub const PR_OLD_PARITY_ERROR_BIT: u16 = 6;
pub const PR_RECORD_NUMBER_BIT: u16 = 9;
pub const PR_FILE_NUMBER_BIT: u16 = 10;
pub const PR_CHECKSUM_BIT: u16 = 12;
pub const PR_CHECKSUM_UNDEFINED_BIT: u16 = 13;
/// Only type 0 is defined.
pub const PR_TYPE_BIT: u16 = 14;

/// The attribute word of a Physical Record Header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrAttributes(pub u16);

impl PrAttributes {
    pub fn is_set(&self, bit: u16) -> bool {
        self.0 & (1 << bit) != 0
    }

    pub fn set(&mut self, bit: u16) {
        self.0 |= 1 << bit;
    }

    pub fn has_successor(&self) -> bool {
        self.is_set(PR_SUCCESSOR_ATTRIBUTE_BIT)
    }

    pub fn has_predecessor(&self) -> bool {
        self.is_set(PR_PREDECESSOR_ATTRIBUTE_BIT)
    }

    pub fn has_record_number(&self) -> bool {
        self.is_set(PR_RECORD_NUMBER_BIT)
    }

    pub fn has_file_number(&self) -> bool {
        self.is_set(PR_FILE_NUMBER_BIT)
    }

    pub fn has_checksum(&self) -> bool {
        self.is_set(PR_CHECKSUM_BIT)
    }

    /// Bytes of trailer these attributes declare.
    pub fn tail_length(&self) -> usize {
        [self.has_record_number(), self.has_file_number(), self.has_checksum()]
            .iter()
            .filter(|b| **b)
            .count()
            * PR_PRT_FIELD_LENGTH
    }
}

/// Trailer fields of the last Physical Record read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrTrailer {
    pub record_number: Option<i16>,
    pub file_number: Option<i16>,
    pub checksum: Option<u16>,
}

/// The 16 bit rotate-and-add checksum over pairs of bytes.
pub fn checksum(bytes: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    for pair in bytes.chunks_exact(2) {
        sum += u32::from(pair[1]) + 256 * u32::from(pair[0]);
        if sum & 0x10000 != 0 {
            sum += 1;
        }
        sum *= 2;
        if sum & 0x10000 != 0 {
            sum += 1;
        }
        sum &= 0xFFFF;
    }
    sum as u16
}

fn truncated(err: WellLogError, message: &str) -> WellLogError {
    match err {
        WellLogError::Eof { offset, .. } => WellLogError::Truncated {
            offset,
            message: message.to_string(),
        },
        other => other,
    }
}

/// Reads the logical data of Logical Records across Physical Records.
///
/// The reader always sits within one Logical Record: reads and skips stop at
/// its end and [`PhysicalRecordReader::skip_to_next_logical_record`] moves on.
#[derive(Debug)]
pub struct PhysicalRecordReader<R = BufReader<File>> {
    cursor: ByteCursor<R>,
    tif: TifMarkers,
    keep_going: bool,
    attributes: PrAttributes,
    trailer: PrTrailer,
    ld_len: usize,
    ld_index: usize,
    lr_index: usize,
    start_of_lr: u64,
    must_read_head: bool,
    lr_done: bool,
    eof: bool,
}

impl PhysicalRecordReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, keep_going: bool) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?), keep_going)
    }
}

impl<R: Read + Seek> PhysicalRecordReader<R> {
    /// # Arguments
    /// * `keep_going` - Tolerate TIF padding and undefined attribute bits,
    ///   logging instead of failing.
    pub fn new(inner: R, keep_going: bool) -> Result<Self> {
        let mut cursor = ByteCursor::new(inner)?;
        let tif = TifMarkers::detect(&mut cursor, keep_going)?;
        Ok(Self {
            cursor,
            tif,
            keep_going,
            attributes: PrAttributes::default(),
            trailer: PrTrailer::default(),
            ld_len: 0,
            ld_index: 0,
            lr_index: 0,
            start_of_lr: 0,
            must_read_head: true,
            lr_done: false,
            eof: false,
        })
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn has_tif(&self) -> bool {
        self.tif.has_tif()
    }

    pub fn file_len(&self) -> u64 {
        self.cursor.len()
    }

    /// Absolute position of the file.
    pub fn tell(&self) -> u64 {
        self.cursor.position()
    }

    /// File position of the start of the current Logical Record (its TIF
    /// marker or first PRH), suitable for [`Self::seek_logical_record`].
    pub fn tell_logical_record(&self) -> u64 {
        self.start_of_lr
    }

    /// Bytes of logical data consumed so far in the current Logical Record.
    pub fn logical_data_index(&self) -> usize {
        self.lr_index
    }

    pub fn trailer(&self) -> PrTrailer {
        self.trailer
    }

    /// Move to a position previously returned by
    /// [`Self::tell_logical_record`]. Nothing is checked until the next read.
    pub fn seek_logical_record(&mut self, position: u64) -> Result<()> {
        self.cursor.seek(position)?;
        self.tif.reset();
        self.attributes = PrAttributes::default();
        self.trailer = PrTrailer::default();
        self.ld_len = 0;
        self.ld_index = 0;
        self.lr_index = 0;
        self.start_of_lr = position;
        self.must_read_head = true;
        self.lr_done = false;
        self.eof = false;
        Ok(())
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.seek_logical_record(0)
    }

    fn read_head(&mut self) -> Result<()> {
        let is_lr_start = !self.attributes.has_successor();
        if is_lr_start {
            self.lr_index = 0;
        }
        if self.cursor.at_eof() {
            self.eof = true;
            return Ok(());
        }
        let mut start_of_pr = self.cursor.position();
        if let Some(tell) = self
            .tif
            .read(&mut self.cursor)
            .map_err(|e| truncated(e, "EOF in TIF marker"))?
        {
            start_of_pr = tell;
        }
        if self.cursor.at_eof() {
            self.eof = true;
            return Ok(());
        }
        let length = self
            .cursor
            .read_u16()
            .map_err(|e| truncated(e, "EOF in physical record header"))? as usize;
        self.attributes = PrAttributes(
            self.cursor
                .read_u16()
                .map_err(|e| truncated(e, "EOF in physical record header"))?,
        );
        if self.attributes.is_set(PR_TYPE_BIT) && !self.keep_going {
            return Err(WellLogError::Framing {
                offset: start_of_pr,
                message: "illegal physical record type of 1".into(),
            });
        }
        if self.attributes.is_set(PR_CHECKSUM_UNDEFINED_BIT) && !self.keep_going {
            return Err(WellLogError::Framing {
                offset: start_of_pr,
                message: "undefined bit in checksum attribute".into(),
            });
        }
        if is_lr_start {
            self.start_of_lr = start_of_pr;
        } else if !self.attributes.has_predecessor() {
            warn!(
                "Physical record at 0x{:X} is successor but has no predecessor bit set.",
                start_of_pr
            );
        }
        self.ld_len = length
            .checked_sub(PR_PRH_LENGTH + self.attributes.tail_length())
            .ok_or_else(|| WellLogError::Framing {
                offset: start_of_pr,
                message: format!("illegal negative logical data length from PR length {}", length),
            })?;
        trace!(
            "PR at 0x{:x} length {} attributes 0x{:04x} logical data {}",
            start_of_pr,
            length,
            self.attributes.0,
            self.ld_len
        );
        self.ld_index = 0;
        self.must_read_head = false;
        self.lr_done = false;
        Ok(())
    }

    fn read_tail(&mut self) -> Result<()> {
        let message = "EOF in physical record trailer";
        let mut trailer = PrTrailer::default();
        if self.attributes.has_record_number() {
            trailer.record_number = Some(self.cursor.read_u16().map_err(|e| truncated(e, message))? as i16);
        }
        if self.attributes.has_file_number() {
            trailer.file_number = Some(self.cursor.read_u16().map_err(|e| truncated(e, message))? as i16);
        }
        if self.attributes.has_checksum() {
            trailer.checksum = Some(self.cursor.read_u16().map_err(|e| truncated(e, message))?);
        }
        self.trailer = trailer;
        if !self.attributes.has_successor() {
            self.lr_done = true;
        }
        Ok(())
    }

    /// Read a head if needed, false if there is nothing left in this record.
    fn prepare(&mut self) -> Result<bool> {
        if self.eof {
            return Ok(false);
        }
        if self.must_read_head {
            self.read_head()?;
        }
        Ok(!self.eof && !self.lr_done)
    }

    /// Read into `sink` or skip `size` bytes (all remaining if `None`).
    fn transfer(&mut self, size: Option<usize>, mut sink: Option<&mut Vec<u8>>) -> Result<usize> {
        if !self.prepare()? {
            return Ok(0);
        }
        let mut done = 0;
        loop {
            let available = self.ld_len - self.ld_index;
            let want = size.map_or(available, |s| (s - done).min(available));
            if want > 0 {
                match sink.as_deref_mut() {
                    Some(buf) => {
                        let start = buf.len();
                        buf.resize(start + want, 0);
                        self.cursor
                            .read_into(&mut buf[start..])
                            .map_err(|e| truncated(e, "EOF in logical data"))?;
                    }
                    None => {
                        if self.cursor.remaining() < want as u64 {
                            return Err(WellLogError::Truncated {
                                offset: self.cursor.position(),
                                message: format!("skipping {} bytes past EOF", want),
                            });
                        }
                        self.cursor.skip(want as u64)?;
                    }
                }
                self.ld_index += want;
                self.lr_index += want;
                done += want;
            }
            if size.is_some_and(|s| done >= s) {
                break;
            }
            self.read_tail()?;
            if self.lr_done {
                break;
            }
            let offset = self.cursor.position();
            self.read_head()?;
            if self.eof {
                return Err(WellLogError::Truncated {
                    offset,
                    message: "EOF where a successor physical record was expected".into(),
                });
            }
        }
        Ok(done)
    }

    /// Up to `size` bytes of logical data, fewer at the end of the record.
    pub fn read(&mut self, size: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(size);
        self.transfer(Some(size), Some(&mut buf))?;
        Ok(buf)
    }

    /// Exactly `size` bytes of logical data.
    ///
    /// # Errors
    /// `Truncated` if the Logical Record ends first.
    pub fn read_exact(&mut self, size: usize) -> Result<Vec<u8>> {
        let bytes = self.read(size)?;
        if bytes.len() != size {
            return Err(WellLogError::Truncated {
                offset: self.start_of_lr,
                message: format!("logical record has {} bytes, wanted {}", bytes.len(), size),
            });
        }
        Ok(bytes)
    }

    /// The rest of this Logical Record's logical data.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.transfer(None, Some(&mut buf))?;
        Ok(buf)
    }

    /// Skip up to `size` bytes, returning the count skipped.
    pub fn skip(&mut self, size: usize) -> Result<usize> {
        self.transfer(Some(size), None)
    }

    /// The two byte Logical Record header (type, attributes), `None` at EOF.
    pub fn read_logical_record_header(&mut self) -> Result<Option<(u8, u8)>> {
        if !self.prepare()? {
            return Ok(None);
        }
        let bytes = self.read(2)?;
        match bytes[..] {
            [lr_type, attributes] => Ok(Some((lr_type, attributes))),
            _ => Err(WellLogError::Truncated {
                offset: self.start_of_lr,
                message: format!("logical record header of {} bytes", bytes.len()),
            }),
        }
    }

    /// Skip the rest of this Logical Record and read the head of the next.
    /// Returns the logical data bytes skipped.
    pub fn skip_to_next_logical_record(&mut self) -> Result<usize> {
        let skipped = self.transfer(None, None)?;
        if !self.eof {
            self.read_head()?;
        }
        Ok(skipped)
    }
}

/// Trailer settings for written Physical Records.
#[derive(Debug, Clone, Default)]
pub struct PhysicalRecordTail {
    pub has_record_number: bool,
    pub file_number: Option<i16>,
    pub has_checksum: bool,
    record_number: i32,
}

impl PhysicalRecordTail {
    pub fn new(has_record_number: bool, file_number: Option<i16>, has_checksum: bool) -> Self {
        Self {
            has_record_number,
            file_number,
            has_checksum,
            record_number: 0,
        }
    }

    pub fn attributes(&self) -> PrAttributes {
        let mut attributes = PrAttributes::default();
        if self.has_record_number {
            attributes.set(PR_RECORD_NUMBER_BIT);
        }
        if self.file_number.is_some() {
            attributes.set(PR_FILE_NUMBER_BIT);
        }
        if self.has_checksum {
            attributes.set(PR_CHECKSUM_BIT);
        }
        attributes
    }

    pub fn length(&self) -> usize {
        self.attributes().tail_length()
    }

    fn next_record_number(&mut self) -> i16 {
        if i16::try_from(self.record_number).is_err() {
            let normalised = (self.record_number - i32::from(i16::MIN)).rem_euclid(1 << 16) + i32::from(i16::MIN);
            warn!(
                "Record number {} out of range, normalising to {}",
                self.record_number, normalised
            );
            self.record_number = normalised;
        }
        let number = self.record_number as i16;
        self.record_number += 1;
        number
    }

    /// Append the trailer of the Physical Record in `record`.
    fn append(&mut self, record: &mut Vec<u8>) -> Result<()> {
        if self.has_record_number {
            let number = self.next_record_number();
            record.write_i16::<BigEndian>(number)?;
        }
        if let Some(file_number) = self.file_number {
            record.write_i16::<BigEndian>(file_number)?;
        }
        if self.has_checksum {
            let sum = checksum(record);
            record.write_u16::<BigEndian>(sum)?;
        }
        Ok(())
    }
}

/// Splits Logical Records into Physical Records, optionally with TIF
/// markers.
#[derive(Debug)]
pub struct PhysicalRecordWriter<W: Write> {
    sink: W,
    tif: Option<TifWriter>,
    tail: PhysicalRecordTail,
    max_payload: usize,
    position: u64,
}

impl<W: Write> PhysicalRecordWriter<W> {
    /// # Arguments
    /// * `pr_length` - Maximum Physical Record length including header and
    ///   trailer, at most [`PR_MAX_LENGTH`].
    ///
    /// # Errors
    /// `Framing` if `pr_length` is too long or leaves no room for data.
    pub fn new(sink: W, has_tif: bool, pr_length: usize, tail: PhysicalRecordTail) -> Result<Self> {
        if pr_length > PR_MAX_LENGTH {
            return Err(WellLogError::Framing {
                offset: 0,
                message: format!("PR length {} greater than allowed: {}", pr_length, PR_MAX_LENGTH),
            });
        }
        let max_payload = pr_length.saturating_sub(PR_PRH_LENGTH + tail.length());
        if max_payload < 1 {
            return Err(WellLogError::Framing {
                offset: 0,
                message: format!("no space for payload in PR length {}", pr_length),
            });
        }
        Ok(Self {
            sink,
            tif: has_tif.then(TifWriter::new),
            tail,
            max_payload,
            position: 0,
        })
    }

    /// Write one Logical Record (header bytes included), returning the file
    /// position it starts at.
    pub fn write_logical_record(&mut self, lr: &[u8]) -> Result<u64> {
        let start = self.position;
        let mut offset = 0;
        while offset < lr.len() {
            let payload = &lr[offset..(offset + self.max_payload).min(lr.len())];
            let mut attributes = self.tail.attributes();
            if offset + self.max_payload < lr.len() {
                attributes.set(PR_SUCCESSOR_ATTRIBUTE_BIT);
            }
            if offset > 0 {
                attributes.set(PR_PREDECESSOR_ATTRIBUTE_BIT);
            }
            let mut record = vec![0u8; PR_PRH_LENGTH];
            // max_payload keeps the total within PR_MAX_LENGTH.
            BigEndian::write_u16(&mut record[0..2], (PR_PRH_LENGTH + payload.len() + self.tail.length()) as u16);
            BigEndian::write_u16(&mut record[2..4], attributes.0);
            record.extend_from_slice(payload);
            self.tail.append(&mut record)?;
            if let Some(tif) = self.tif.as_mut() {
                tif.write(&mut self.sink, record.len())?;
                self.position += super::tif::TIF_TOTAL_BYTES as u64;
            }
            self.sink.write_all(&record)?;
            self.position += record.len() as u64;
            offset += payload.len();
        }
        Ok(start)
    }

    /// Write any TIF EOF markers and return the sink.
    pub fn close(mut self) -> Result<W> {
        if let Some(tif) = self.tif.as_mut() {
            tif.close(&mut self.sink)?;
        }
        self.sink.flush()?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn write(records: &[Vec<u8>], has_tif: bool, pr_length: usize, tail: PhysicalRecordTail) -> Vec<u8> {
        let mut writer = PhysicalRecordWriter::new(Vec::new(), has_tif, pr_length, tail).unwrap();
        for lr in records {
            writer.write_logical_record(lr).unwrap();
        }
        writer.close().unwrap()
    }

    fn records() -> Vec<Vec<u8>> {
        vec![
            [vec![128, 0], vec![b'A'; 56]].concat(),
            [vec![0, 0], (0..200u8).collect()].concat(),
            vec![129, 0, 1, 2, 3],
        ]
    }

    #[test]
    fn attributes() {
        let a = PrAttributes(0x1601);
        assert!(a.has_successor());
        assert!(!a.has_predecessor());
        assert!(a.has_record_number());
        assert!(a.has_file_number());
        assert!(a.has_checksum());
        assert_eq!(a.tail_length(), 6);
    }

    #[test]
    fn single_physical_record_layout() {
        let bytes = write(&[vec![64, 0, 1]], false, PR_MAX_LENGTH, PhysicalRecordTail::default());
        assert_eq!(bytes, vec![0, 7, 0, 0, 64, 0, 1]);
    }

    #[test]
    fn split_records_read_back() {
        for has_tif in [false, true] {
            let tail = PhysicalRecordTail::new(true, Some(3), true);
            let bytes = write(&records(), has_tif, 40, tail);
            let mut reader = PhysicalRecordReader::new(Cursor::new(bytes), false).unwrap();
            assert_eq!(reader.has_tif(), has_tif);
            let mut seen = Vec::new();
            while !reader.is_eof() {
                let tell = reader.tell_logical_record();
                let Some(header) = reader.read_logical_record_header().unwrap() else {
                    break;
                };
                let body = reader.read_all().unwrap();
                seen.push((tell, header, body));
                reader.skip_to_next_logical_record().unwrap();
            }
            assert_eq!(seen.len(), 3);
            for ((_, header, body), lr) in seen.iter().zip(records()) {
                assert_eq!(vec![header.0, header.1], lr[..2].to_vec());
                assert_eq!(body, &lr[2..]);
            }
            assert_eq!(seen[0].0, 0);
            assert_eq!(reader.trailer().file_number, Some(3));

            // Random access back into the second record.
            reader.seek_logical_record(seen[1].0).unwrap();
            assert_eq!(reader.read_logical_record_header().unwrap(), Some((0, 0)));
            assert_eq!(reader.skip(50).unwrap(), 50);
            assert_eq!(reader.read(3).unwrap(), vec![50, 51, 52]);
            assert_eq!(reader.logical_data_index(), 55);
            assert_eq!(reader.skip_to_next_logical_record().unwrap(), 147);
            assert_eq!(reader.tell_logical_record(), seen[2].0);
        }
    }

    #[test]
    fn short_read_at_end_of_record() {
        let bytes = write(&[vec![34, 0, 9, 9]], false, PR_MAX_LENGTH, PhysicalRecordTail::default());
        let mut reader = PhysicalRecordReader::new(Cursor::new(bytes), false).unwrap();
        reader.read_logical_record_header().unwrap();
        assert_eq!(reader.read(10).unwrap(), vec![9, 9]);
        assert!(matches!(reader.read_exact(1), Err(WellLogError::Truncated { .. })));
        reader.skip_to_next_logical_record().unwrap();
        assert!(reader.is_eof());
    }

    #[test]
    fn truncated_record_is_not_clean_eof() {
        let mut bytes = write(&[vec![34, 0, 9, 9, 9, 9]], false, PR_MAX_LENGTH, PhysicalRecordTail::default());
        bytes.truncate(7);
        let mut reader = PhysicalRecordReader::new(Cursor::new(bytes), false).unwrap();
        reader.read_logical_record_header().unwrap();
        assert!(matches!(reader.read_all(), Err(WellLogError::Truncated { .. })));
    }

    #[test]
    fn checksum_rotates() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0x00, 0x01]), 2);
        assert_eq!(checksum(&[0x80, 0x00]), 1);
        assert_eq!(checksum(&[0x00, 0x01, 0x00, 0x01]), 6);
    }
}
