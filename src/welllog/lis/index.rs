//! One pass index of a LIS file.
//!
//! Every Logical Record becomes an [`IndexEntry`] except the type 0/1 data
//! records, which are folded into the run length encoding of the
//! [`LogPass`] whose DFSR preceded them:
//!
//! ```text
//! 130 tape head   -> HeadTail
//! 128 file head   -> HeadTail          (delimiters end any open log pass)
//!  34 well data   -> Table
//!  64 DFSR        -> LogPass  <─┐
//!   0 data        ──────────────┤  position, frame count, first X value
//!   0 data        ──────────────┘
//! 129 file tail   -> HeadTail
//! ```

use log::{debug, info, warn};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use super::dfsr::Dfsr;
use super::log_pass::LogPass;
use super::logi_rec::{
    description, is_delimiter, is_log_data, is_table, FileHeadTail, ReelTapeHeadTail, LR_DESCRIPTION_UNKNOWN,
    LR_HEADER_LENGTH, LR_TYPE_DATA_FORMAT, LR_TYPE_FILE_HEAD, LR_TYPE_FILE_TAIL,
};
use super::phys_rec::PhysicalRecordReader;
use super::table::{DuplicateRowPolicy, Table};
use crate::welllog::codec::lis as rc;
use crate::welllog::frame::slice::FrameSlice;
use crate::welllog::types::error::{Result, WellLogError};

/// Options for reading a LIS file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Tolerate framing oddities and undecodable records, logging them.
    pub keep_going: bool,
    pub duplicate_rows: DuplicateRowPolicy,
}

/// Where a Logical Record is and what it claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPosition {
    pub tell: u64,
    pub lr_type: u8,
    pub lr_attributes: u8,
}

impl RecordPosition {
    pub fn description(&self) -> &'static str {
        description(self.lr_type).unwrap_or(LR_DESCRIPTION_UNKNOWN)
    }
}

#[derive(Debug, Clone)]
pub enum IndexEntry {
    /// A record that is not decoded further.
    Plain(RecordPosition),
    Table(RecordPosition, Table),
    FileHeadTail(RecordPosition, FileHeadTail),
    ReelTapeHeadTail(RecordPosition, ReelTapeHeadTail),
    LogPass(RecordPosition, Box<LogPass>),
}

impl IndexEntry {
    pub fn position(&self) -> &RecordPosition {
        match self {
            IndexEntry::Plain(p)
            | IndexEntry::Table(p, _)
            | IndexEntry::FileHeadTail(p, _)
            | IndexEntry::ReelTapeHeadTail(p, _)
            | IndexEntry::LogPass(p, _) => p,
        }
    }
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.position();
        write!(f, "0x{:08x} {:3} {}", p.tell, p.lr_type, p.description())?;
        match self {
            IndexEntry::Plain(_) => Ok(()),
            IndexEntry::Table(_, table) => write!(f, ": {} rows", table.len()),
            IndexEntry::FileHeadTail(_, record) => write!(f, ": {}", record),
            IndexEntry::ReelTapeHeadTail(_, record) => write!(f, ": {}", record),
            IndexEntry::LogPass(_, pass) => write!(f, ": {}", pass),
        }
    }
}

#[derive(Debug)]
pub struct FileIndex<R = BufReader<File>> {
    path: PathBuf,
    reader: PhysicalRecordReader<R>,
    options: ReadOptions,
    entries: Vec<IndexEntry>,
    data_records: usize,
}

impl FileIndex<BufReader<File>> {
    /// Open and index the LIS file at `path`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file can not be opened
    /// - The physical record framing is broken
    /// - A record fails to decode and `options.keep_going` is not set
    pub fn open(path: impl AsRef<Path>, options: ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Indexing LIS file: {}", path.display());
        let reader = PhysicalRecordReader::open(path, options.keep_going)?;
        Self::new(reader, path, options)
    }
}

impl<R: Read + Seek> FileIndex<R> {
    /// Index from any reader. `path` is for reporting.
    pub fn new(mut reader: PhysicalRecordReader<R>, path: impl AsRef<Path>, options: ReadOptions) -> Result<Self> {
        let mut entries = Vec::new();
        // Log pass entry for each data record type, cleared by delimiters.
        let mut passes: [Option<usize>; 2] = [None, None];
        let mut data_records = 0;
        while !reader.is_eof() {
            let Some((lr_type, lr_attributes)) = reader.read_logical_record_header()? else {
                break;
            };
            let position = RecordPosition {
                tell: reader.tell_logical_record(),
                lr_type,
                lr_attributes,
            };
            debug!("LR at 0x{:x} type {} {}", position.tell, lr_type, position.description());
            match Self::index_record(&mut reader, position, options, &mut entries, &mut passes) {
                Ok(true) => data_records += 1,
                Ok(false) => {}
                Err(err) if options.keep_going && is_record_local(&err) => {
                    warn!("Skipping LR at 0x{:x} type {}: {}", position.tell, lr_type, err);
                    entries.push(IndexEntry::Plain(position));
                }
                Err(err) => return Err(err),
            }
            reader.skip_to_next_logical_record()?;
        }
        let index = Self {
            path: path.as_ref().to_path_buf(),
            reader,
            options,
            entries,
            data_records,
        };
        info!(
            "Indexed {} logical records, {} log passes, {} data records in {}",
            index.entries.len(),
            index.log_passes().count(),
            index.data_records,
            index.path.display()
        );
        Ok(index)
    }

    /// Index one record, true if it was a data record.
    fn index_record(
        reader: &mut PhysicalRecordReader<R>,
        position: RecordPosition,
        options: ReadOptions,
        entries: &mut Vec<IndexEntry>,
        passes: &mut [Option<usize>; 2],
    ) -> Result<bool> {
        let lr_type = position.lr_type;
        if is_log_data(lr_type) {
            let slot = passes[lr_type as usize];
            match slot.and_then(|i| match entries.get_mut(i) {
                Some(IndexEntry::LogPass(_, pass)) => Some(pass),
                _ => None,
            }) {
                Some(pass) => {
                    let x = read_x_axis(reader, pass)?;
                    reader.skip(usize::MAX)?;
                    let lr_len = reader.logical_data_index() - LR_HEADER_LENGTH;
                    pass.add_type01_data(position.tell, lr_type, lr_len, x)?;
                    return Ok(true);
                }
                None => {
                    warn!("Data record at 0x{:x} with no preceding DFSR", position.tell);
                    entries.push(IndexEntry::Plain(position));
                    return Ok(false);
                }
            }
        }
        if is_delimiter(lr_type) {
            *passes = [None, None];
        }
        let entry = if is_table(lr_type) {
            IndexEntry::Table(position, Table::parse(lr_type, &reader.read_all()?, options.duplicate_rows)?)
        } else if lr_type == LR_TYPE_DATA_FORMAT {
            let dfsr = Dfsr::parse(&reader.read_all()?)?;
            let pass = LogPass::new(dfsr, 0).map_err(|e| match e {
                WellLogError::Ctor(message) => WellLogError::InvalidFormat(format!("DFSR: {}", message)),
                other => other,
            })?;
            match pass.iflr_type() {
                t @ (0 | 1) => passes[t as usize] = Some(entries.len()),
                t => warn!("DFSR at 0x{:x} declares data records of type {}", position.tell, t),
            }
            IndexEntry::LogPass(position, Box::new(pass))
        } else if lr_type == LR_TYPE_FILE_HEAD || lr_type == LR_TYPE_FILE_TAIL {
            IndexEntry::FileHeadTail(position, FileHeadTail::parse(lr_type, &reader.read_all()?)?)
        } else if is_delimiter(lr_type) {
            IndexEntry::ReelTapeHeadTail(position, ReelTapeHeadTail::parse(lr_type, &reader.read_all()?)?)
        } else {
            IndexEntry::Plain(position)
        };
        entries.push(entry);
        Ok(false)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> ReadOptions {
        self.options
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of type 0/1 records folded into log passes.
    pub fn num_data_records(&self) -> usize {
        self.data_records
    }

    pub fn log_passes(&self) -> impl Iterator<Item = &LogPass> {
        self.entries.iter().filter_map(|e| match e {
            IndexEntry::LogPass(_, pass) => Some(pass.as_ref()),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.entries.iter().filter_map(|e| match e {
            IndexEntry::Table(_, table) => Some(table),
            _ => None,
        })
    }

    pub fn log_pass(&self, n: usize) -> Result<&LogPass> {
        let count = self.log_passes().count();
        self.log_passes()
            .nth(n)
            .ok_or_else(|| WellLogError::index("log pass", n as i64, count))
    }

    /// Read frames of the `n`th log pass, see [`LogPass::set_frame_set`].
    pub fn set_frame_set(&mut self, n: usize, selection: Option<FrameSlice>, channels: Option<&[usize]>) -> Result<&LogPass> {
        let count = self.log_passes().count();
        let pass = self
            .entries
            .iter_mut()
            .filter_map(|e| match e {
                IndexEntry::LogPass(_, pass) => Some(pass.as_mut()),
                _ => None,
            })
            .nth(n)
            .ok_or_else(|| WellLogError::index("log pass", n as i64, count))?;
        pass.set_frame_set(&mut self.reader, selection, channels)?;
        Ok(pass)
    }

    /// The logical data of the record at `tell`, header excluded.
    pub fn logical_data(&mut self, tell: u64) -> Result<Vec<u8>> {
        self.reader.seek_logical_record(tell)?;
        if self.reader.read_logical_record_header()?.is_none() {
            return Err(WellLogError::Truncated {
                offset: tell,
                message: "no logical record at this position".into(),
            });
        }
        self.reader.read_all()
    }
}

fn is_record_local(err: &WellLogError) -> bool {
    err.is_record_local()
        || matches!(
            err,
            WellLogError::Geometry(_) | WellLogError::FrameSizeMismatch { .. } | WellLogError::InvalidFormat(_)
        )
}

/// X value of the first frame of a data record, leaving the reader inside it.
fn read_x_axis<R: Read + Seek>(reader: &mut PhysicalRecordReader<R>, pass: &LogPass) -> Result<f64> {
    if pass.is_indirect_x() {
        let bytes = reader.read_exact(pass.plan().indirect_size())?;
        return rc::read_f64(pass.dfsr().ebs.depth_rep_code(), &bytes);
    }
    let x = pass.x_axis_index();
    let rep_code = pass.dfsr().dsbs[x].rep_code;
    let offset = pass.plan().ch_offset(0, x)?;
    if offset > 0 && reader.skip(offset)? != offset {
        return Err(WellLogError::Truncated {
            offset: reader.tell_logical_record(),
            message: format!("data record ends before its X axis at {}", offset),
        });
    }
    let bytes = reader.read_exact(rc::lis_size(rep_code)?)?;
    rc::read_f64(rep_code, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::welllog::lis::dfsr::{DatumSpecBlock, EntryBlockSet};
    use crate::welllog::lis::phys_rec::{PhysicalRecordTail, PhysicalRecordWriter};
    use std::io::Cursor;

    fn direct_dfsr() -> Dfsr {
        Dfsr::new(
            EntryBlockSet::new(),
            vec![
                DatumSpecBlock::new(b"DEPT", b"FEET", rc::RC_68, 1, 1).unwrap(),
                DatumSpecBlock::new(b"GR  ", b"GAPI", rc::RC_68, 1, 1).unwrap(),
            ],
        )
    }

    fn data_record(first: usize, frames: usize) -> Vec<u8> {
        let mut lr = vec![0, 0];
        for fr in first..first + frames {
            lr.extend(rc::encode_f64(100.0 + 0.5 * fr as f64, rc::RC_68).unwrap());
            lr.extend(rc::encode_f64(fr as f64 * 10.0, rc::RC_68).unwrap());
        }
        lr
    }

    fn index_of(records: &[Vec<u8>], options: ReadOptions) -> Result<FileIndex<Cursor<Vec<u8>>>> {
        let mut writer = PhysicalRecordWriter::new(Vec::new(), false, 128, PhysicalRecordTail::default()).unwrap();
        for lr in records {
            writer.write_logical_record(lr).unwrap();
        }
        let reader = PhysicalRecordReader::new(Cursor::new(writer.close().unwrap()), options.keep_going).unwrap();
        FileIndex::new(reader, "memory", options)
    }

    #[test]
    fn data_records_fold_into_log_pass() {
        let records = vec![
            direct_dfsr().to_bytes().unwrap(),
            data_record(0, 3),
            data_record(3, 3),
            vec![232, 0, b'h', b'i'],
        ];
        let mut index = index_of(&records, ReadOptions::default()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.num_data_records(), 2);
        let pass = index.log_pass(0).unwrap();
        assert_eq!(pass.total_frames(), 6);
        assert_eq!(pass.x_axis_first_val(), Some(100.0));
        assert_eq!(pass.x_axis_spacing().unwrap(), Some(0.5));
        assert_eq!(pass.x_axis_last_val().unwrap(), Some(102.5));
        let pass = index.set_frame_set(0, None, None).unwrap();
        let fs = pass.frame_set().unwrap();
        assert_eq!(fs.ch_sc_values(1, 0).unwrap(), vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
        let tell = index.entries()[1].position().tell;
        assert_eq!(index.logical_data(tell).unwrap(), b"hi".to_vec());
    }

    #[test]
    fn orphan_data_and_short_head_are_plain() {
        // The file head has no body.
        let records = vec![data_record(0, 2), vec![128, 0], direct_dfsr().to_bytes().unwrap()];
        assert!(matches!(
            index_of(&records, ReadOptions::default()),
            Err(WellLogError::InvalidFormat(_))
        ));
        let index = index_of(
            &records,
            ReadOptions {
                keep_going: true,
                ..ReadOptions::default()
            },
        )
        .unwrap();
        assert!(matches!(index.entries()[0], IndexEntry::Plain(_)));
        assert!(matches!(index.entries()[1], IndexEntry::Plain(_)));
        assert_eq!(index.log_passes().count(), 1);
        assert_eq!(index.num_data_records(), 0);
    }

    #[test]
    fn ragged_data_record_is_an_error() {
        let mut ragged = data_record(0, 2);
        ragged.push(0);
        let records = vec![direct_dfsr().to_bytes().unwrap(), ragged];
        assert!(matches!(
            index_of(&records, ReadOptions::default()),
            Err(WellLogError::FrameSizeMismatch { declared, computed }) if declared == computed + 1
        ));
    }
}
