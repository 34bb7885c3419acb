//! A positional index of every logical record in an RP66V1 file.
//!
//! The index holds positions and descriptions only; record bodies are read
//! back on demand through the file handle it owns. Closing the index (or
//! dropping it) releases the handle.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::ops::Index;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::framing::{FileLogicalData, FileRead, LogicalRecordPosition, LrPosDesc, VisibleRecord};
use super::sul::StorageUnitLabel;
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::ProgressSink;

/// Options for building an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOptions {
    /// Log a malformed record and resume at the next Visible Record rather
    /// than failing the scan.
    pub skip_malformed: bool,
}

/// Structural form of an index, enough to reattach to the same file.
#[derive(Debug, Serialize, Deserialize)]
struct IndexSnapshot {
    path: PathBuf,
    file_len: u64,
    entries: Vec<LrPosDesc>,
}

#[derive(Debug)]
pub struct LogicalRecordIndex<R = BufReader<File>> {
    path: PathBuf,
    file: Mutex<Option<FileRead<R>>>,
    sul: StorageUnitLabel,
    file_len: u64,
    entries: Vec<LrPosDesc>,
}

impl LogicalRecordIndex<BufReader<File>> {
    /// Open and scan the file at `path`.
    ///
    /// # Arguments
    /// * `path` - The RP66V1 file
    /// * `options` - Scan behaviour
    /// * `progress` - Receives the scan position as it advances
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file can not be opened
    /// - The Storage Unit Label is invalid
    /// - A record is malformed and `options.skip_malformed` is not set
    pub fn open(path: impl AsRef<Path>, options: IndexOptions, progress: &mut dyn ProgressSink) -> Result<Self> {
        let path = path.as_ref();
        info!("Indexing RP66V1 file: {}", path.display());
        let reader = BufReader::new(File::open(path)?);
        Self::from_reader(reader, path, options, progress)
    }

    /// Rebuild an index from [`snapshot`](LogicalRecordIndex::snapshot) bytes
    /// without scanning, reattaching to the file at `path`.
    ///
    /// # Errors
    /// `Snapshot` if the bytes do not decode, `InvalidFormat` if the file
    /// length differs from when the snapshot was taken.
    pub fn from_snapshot(path: impl AsRef<Path>, bytes: &[u8]) -> Result<Self> {
        let path = path.as_ref();
        let snapshot: IndexSnapshot = serde_json::from_slice(bytes)?;
        let file = FileRead::new(BufReader::new(File::open(path)?))?;
        if file.file_len() != snapshot.file_len {
            return Err(WellLogError::InvalidFormat(format!(
                "snapshot of {} bytes does not match {} of {} bytes",
                snapshot.file_len,
                path.display(),
                file.file_len()
            )));
        }
        info!(
            "Restored index of {} logical records for {}",
            snapshot.entries.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            sul: file.sul().clone(),
            file_len: snapshot.file_len,
            file: Mutex::new(Some(file)),
            entries: snapshot.entries,
        })
    }
}

impl<R: Read + Seek> LogicalRecordIndex<R> {
    /// Scan any seekable source. `path` is used for reporting and snapshots.
    pub fn from_reader(
        reader: R,
        path: impl AsRef<Path>,
        options: IndexOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<Self> {
        let mut file = FileRead::new(reader)?;
        let entries = file.scan_positions(&options, progress)?;
        let eflr_count = entries.iter().filter(|e| e.description.is_eflr()).count();
        info!(
            "Indexed {} logical records ({} EFLR, {} IFLR) in {} bytes",
            entries.len(),
            eflr_count,
            entries.len() - eflr_count,
            file.file_len()
        );
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            sul: file.sul().clone(),
            file_len: file.file_len(),
            file: Mutex::new(Some(file)),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sul(&self) -> &StorageUnitLabel {
        &self.sul
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LrPosDesc> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LrPosDesc> {
        self.entries.iter()
    }

    /// Distinct Visible Record positions that start a logical record.
    pub fn visible_record_positions(&self) -> Vec<u64> {
        let mut positions: Vec<u64> = self.entries.iter().map(|e| e.position.vr_position).collect();
        positions.dedup();
        positions
    }

    fn with_file<T>(&self, f: impl FnOnce(&mut FileRead<R>) -> Result<T>) -> Result<T> {
        let mut guard = self.file.lock().map_err(|_| WellLogError::LockPoisoned)?;
        match guard.as_mut() {
            Some(file) => f(file),
            None => Err(WellLogError::ClosedIndex),
        }
    }

    /// Logical data of entry `index` from byte `offset`, `length` bytes or to
    /// the end of the record.
    ///
    /// # Errors
    /// `IndexOutOfRange` for a bad entry, `ClosedIndex` after
    /// [`close`](Self::close).
    pub fn get_file_logical_data(&self, index: usize, offset: usize, length: Option<usize>) -> Result<FileLogicalData> {
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| WellLogError::index("logical record", index as i64, self.entries.len()))?;
        self.get_file_logical_data_at_position(entry.position, offset, length)
    }

    pub fn get_file_logical_data_at_position(
        &self,
        position: LogicalRecordPosition,
        offset: usize,
        length: Option<usize>,
    ) -> Result<FileLogicalData> {
        self.with_file(|file| file.get_file_logical_data(position, offset, length))
    }

    /// Re-read the headers at every entry's position.
    pub fn validate(&self) -> Result<()> {
        self.with_file(|file| {
            for entry in &self.entries {
                file.check_position(entry.position)?;
            }
            Ok(())
        })
    }

    /// The Visible Record header an entry starts in.
    pub fn visible_record(&self, index: usize) -> Result<VisibleRecord> {
        let entry = self
            .entries
            .get(index)
            .ok_or_else(|| WellLogError::index("logical record", index as i64, self.entries.len()))?;
        self.with_file(|file| file.visible_record_at(entry.position.vr_position))
    }

    /// Release the file handle. Later reads fail with `ClosedIndex`.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.file.lock().map_err(|_| WellLogError::LockPoisoned)?;
        if guard.take().is_some() {
            debug!("Closed index for {}", self.path.display());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.file.lock().map(|g| g.is_none()).unwrap_or(true)
    }

    /// Serialize the entries with the file length, see
    /// [`LogicalRecordIndex::from_snapshot`].
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let snapshot = IndexSnapshot {
            path: self.path.clone(),
            file_len: self.file_len,
            entries: self.entries.clone(),
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }
}

impl<R> Index<usize> for LogicalRecordIndex<R> {
    type Output = LrPosDesc;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

impl<'a, R> IntoIterator for &'a LogicalRecordIndex<R> {
    type Item = &'a LrPosDesc;
    type IntoIter = std::slice::Iter<'a, LrPosDesc>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
