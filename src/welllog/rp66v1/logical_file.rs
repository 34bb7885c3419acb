//! Logical Files: the FILE-HEADER, ORIGIN and other EFLRs up to the next
//! FILE-HEADER, the frame arrays they describe and an X axis per frame array
//! indexing its IFLRs.
//!
//! ```text
//! LogicalIndex
//!   LogicalRecordIndex  positions of every record, owns the file
//!   LogicalFile[]
//!     eflrs             FILE-HEADER, ORIGIN, ...
//!     log_pass          FrameArraySet from CHANNEL + FRAME
//!     iflr_position_map frame array ident -> XAxis (IFLR position, frame number, x)
//! ```

use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use super::eflr::{ExplicitlyFormattedLogicalRecord, Object};
use super::framing::LogicalRecordPosition;
use super::iflr::IndirectlyFormattedLogicalRecord;
use super::index::{IndexOptions, LogicalRecordIndex};
use super::log_pass::{log_pass_from_eflrs, read_frame, read_frame_partial, read_x_axis};
use super::types::{EFLR_FILE_HEADER, EFLR_ORIGIN, IFLR_FDATA};
use crate::welllog::cursor::LogicalData;
use crate::welllog::frame::xaxis::XAxis;
use crate::welllog::frame::{FrameArray, FrameArraySet, FrameSlice};
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::{ObName, ProgressSink};

const ORIGIN_SET_TYPES: [&[u8]; 2] = [b"ORIGIN", b"WELL-REFERENCE"];

#[derive(Debug, Clone)]
pub struct PositionEflr {
    pub position: LogicalRecordPosition,
    pub eflr: ExplicitlyFormattedLogicalRecord,
}

#[derive(Debug)]
pub struct LogicalFile {
    eflrs: Vec<PositionEflr>,
    channel_eflr: Option<usize>,
    frame_eflr: Option<usize>,
    log_pass: Option<FrameArraySet>,
    iflr_position_map: HashMap<ObName, XAxis>,
}

impl LogicalFile {
    /// Start a Logical File with its FILE-HEADER.
    ///
    /// # Errors
    /// `Ctor` if the record is not a FILE-HEADER.
    pub fn new(position: LogicalRecordPosition, fhlr: ExplicitlyFormattedLogicalRecord) -> Result<Self> {
        if fhlr.lr_type != EFLR_FILE_HEADER {
            return Err(WellLogError::Ctor(format!(
                "Logical File requires first EFLR code 0 not {}",
                fhlr.lr_type
            )));
        }
        if !Self::is_next(&fhlr) {
            return Err(WellLogError::Ctor(format!(
                "Logical File requires a first EFLR of type FILE-HEADER not {}",
                fhlr.set
            )));
        }
        Ok(Self {
            eflrs: vec![PositionEflr { position, eflr: fhlr }],
            channel_eflr: None,
            frame_eflr: None,
            log_pass: None,
            iflr_position_map: HashMap::new(),
        })
    }

    /// True if the EFLR starts the next Logical File.
    pub fn is_next(eflr: &ExplicitlyFormattedLogicalRecord) -> bool {
        eflr.set.type_name == b"FILE-HEADER"
    }

    pub fn eflrs(&self) -> &[PositionEflr] {
        &self.eflrs
    }

    pub fn file_header_logical_record(&self) -> &ExplicitlyFormattedLogicalRecord {
        &self.eflrs[0].eflr
    }

    /// # Errors
    /// `Ctor` if no ORIGIN has been added yet.
    pub fn origin_logical_record(&self) -> Result<&ExplicitlyFormattedLogicalRecord> {
        self.eflrs
            .get(1)
            .map(|p| &p.eflr)
            .ok_or_else(|| WellLogError::Ctor("have not yet seen an ORIGIN record".into()))
    }

    /// The first object of the ORIGIN record.
    pub fn defining_origin(&self) -> Result<&Object> {
        let origin = self.origin_logical_record()?;
        origin
            .objects()
            .first()
            .ok_or_else(|| WellLogError::Ctor("ORIGIN record is empty".into()))
    }

    pub fn has_log_pass(&self) -> bool {
        self.log_pass.is_some()
    }

    pub fn log_pass(&self) -> Option<&FrameArraySet> {
        self.log_pass.as_ref()
    }

    /// IFLR references of one frame array, if any were seen.
    pub fn x_axis(&self, ident: &ObName) -> Option<&XAxis> {
        self.iflr_position_map.get(ident)
    }

    pub fn iflr_position_map(&self) -> &HashMap<ObName, XAxis> {
        &self.iflr_position_map
    }

    /// Add the next EFLR in file order.
    ///
    /// The first addition must be the ORIGIN. The frame arrays are built once
    /// both a CHANNEL and a FRAME have been added.
    ///
    /// # Errors
    /// `Ctor` for a FILE-HEADER, a misplaced ORIGIN or a second CHANNEL or
    /// FRAME record.
    pub fn add_eflr(&mut self, position: LogicalRecordPosition, eflr: ExplicitlyFormattedLogicalRecord) -> Result<()> {
        if Self::is_next(&eflr) {
            return Err(WellLogError::Ctor(format!(
                "can not add EFLR code {} {} to this Logical File",
                eflr.lr_type, eflr.set
            )));
        }
        if self.eflrs.len() < 2 {
            if eflr.lr_type != EFLR_ORIGIN || !ORIGIN_SET_TYPES.contains(&eflr.set.type_name.as_slice()) {
                return Err(WellLogError::Ctor(format!(
                    "Logical File requires a second EFLR of code 1 and type ORIGIN or WELL-REFERENCE not code {} {}",
                    eflr.lr_type, eflr.set
                )));
            }
            self.eflrs.push(PositionEflr { position, eflr });
            return Ok(());
        }
        if ORIGIN_SET_TYPES.contains(&eflr.set.type_name.as_slice()) {
            warn!("Logical File encountered multiple EFLRs {} LR type: {}", eflr.set, eflr.lr_type);
        }
        let index = self.eflrs.len();
        match eflr.set.type_name.as_slice() {
            b"CHANNEL" => {
                if self.channel_eflr.is_some() || self.log_pass.is_some() {
                    return Err(WellLogError::Ctor("multiple CHANNEL EFLRs in a Logical File".into()));
                }
                self.channel_eflr = Some(index);
            }
            b"FRAME" => {
                if self.frame_eflr.is_some() || self.log_pass.is_some() {
                    return Err(WellLogError::Ctor("multiple FRAME EFLRs in a Logical File".into()));
                }
                self.frame_eflr = Some(index);
            }
            _ => {}
        }
        self.eflrs.push(PositionEflr { position, eflr });
        if let (Some(c), Some(f)) = (self.channel_eflr, self.frame_eflr) {
            if self.log_pass.is_none() {
                let log_pass = log_pass_from_eflrs(&self.eflrs[f].eflr, &self.eflrs[c].eflr)?;
                debug!("{}", log_pass);
                self.log_pass = Some(log_pass);
            }
        }
        Ok(())
    }

    /// Record an IFLR's position, frame number and X axis value. `ld` is
    /// positioned at the free data.
    ///
    /// # Errors
    /// `Ctor` before the ORIGIN or the frame arrays exist, for an empty IFLR
    /// or one naming an unknown frame array.
    pub fn add_iflr(
        &mut self,
        position: LogicalRecordPosition,
        iflr: &IndirectlyFormattedLogicalRecord,
        ld: &mut LogicalData,
    ) -> Result<()> {
        self.origin_logical_record()?;
        let log_pass = self.log_pass.as_ref().ok_or_else(|| {
            WellLogError::Ctor("can not add an IFLR without the CHANNEL and FRAME records".into())
        })?;
        if iflr.remain == 0 {
            return Err(WellLogError::Ctor("can not add an empty IFLR".into()));
        }
        let array = log_pass
            .get(&iflr.object_name)
            .ok_or_else(|| WellLogError::Ctor(format!("IFLR refers to unknown frame {}", iflr.object_name)))?;
        let x = read_x_axis(array, ld)?;
        let channel = array.x_axis()?;
        self.iflr_position_map
            .entry(iflr.object_name.clone())
            .or_insert_with(|| {
                XAxis::new(
                    channel.ident.ident.clone(),
                    channel.long_name.clone(),
                    channel.units.clone(),
                )
            })
            .append(position, iflr.frame_number, x);
        Ok(())
    }

    /// Fill `ident`'s frame array from its IFLRs for the selected frames and
    /// optionally only some channels (the X axis is always read).
    ///
    /// Frames are stored in selection order. Returns the number of frames.
    ///
    /// # Errors
    /// `Ctor` if there is no such frame array, any read or decode error.
    pub fn populate_frame_array<R: Read + Seek>(
        &mut self,
        index: &LogicalRecordIndex<R>,
        ident: &ObName,
        frame_slice: &FrameSlice,
        channels: Option<&HashSet<ObName>>,
    ) -> Result<usize> {
        let array = self
            .log_pass
            .as_mut()
            .and_then(|lp| lp.get_mut(ident))
            .ok_or_else(|| WellLogError::Ctor(format!("no frame array {}", ident)))?;
        let iflrs = self.iflr_position_map.get(ident).filter(|x_axis| !x_axis.is_empty());
        let frames = iflrs.map_or_else(Vec::new, |x_axis| frame_slice.indices(x_axis.len()));
        // An empty selection still resets the arrays.
        match channels {
            Some(channels) => array.init_arrays_partial(frames.len(), channels),
            None => array.init_arrays(frames.len()),
        }
        let iflrs = match iflrs {
            Some(iflrs) if !frames.is_empty() => iflrs,
            _ => return Ok(0),
        };
        debug!(
            "populate_frame_array(): IFLRs: {} selection: {} frames: {}",
            iflrs.len(),
            frame_slice.long_str(iflrs.len()),
            frames.len()
        );
        for (array_index, &frame) in frames.iter().enumerate() {
            let reference = iflrs
                .get(frame)
                .ok_or_else(|| WellLogError::index("frame", frame as i64, iflrs.len()))?;
            let mut fld = index.get_file_logical_data_at_position(reference.position, 0, None)?;
            IndirectlyFormattedLogicalRecord::new(fld.lr_type, &mut fld.data)?;
            read_into(array, &mut fld.data, array_index, channels)?;
        }
        Ok(frames.len())
    }
}

fn read_into(
    array: &mut FrameArray,
    ld: &mut LogicalData,
    frame: usize,
    channels: Option<&HashSet<ObName>>,
) -> Result<()> {
    match channels {
        Some(channels) => read_frame_partial(array, ld, frame, channels),
        None => read_frame(array, ld, frame),
    }
}

/// A whole RP66V1 file as a sequence of Logical Files.
#[derive(Debug)]
pub struct LogicalIndex<R = BufReader<File>> {
    index: LogicalRecordIndex<R>,
    logical_files: Vec<LogicalFile>,
}

impl LogicalIndex<BufReader<File>> {
    /// Index the file at `path` and group its records into Logical Files.
    pub fn open(path: impl AsRef<Path>, options: IndexOptions, progress: &mut dyn ProgressSink) -> Result<Self> {
        Self::from_index(LogicalRecordIndex::open(path, options, progress)?)
    }
}

impl<R: Read + Seek> LogicalIndex<R> {
    /// Decode every EFLR and the preamble and X axis of every frame IFLR.
    ///
    /// Encrypted records are skipped. EFLRs and IFLRs that fail to decode
    /// on their own are logged and skipped.
    ///
    /// # Errors
    /// `Ctor` if the records do not form valid Logical Files, and read
    /// errors.
    pub fn from_index(index: LogicalRecordIndex<R>) -> Result<Self> {
        let mut logical_files: Vec<LogicalFile> = Vec::new();
        for i in 0..index.len() {
            let entry = index[i];
            if entry.description.is_encrypted() {
                debug!("Skipping encrypted record at {}", entry.position);
                continue;
            }
            let mut fld = index.get_file_logical_data(i, 0, None)?;
            if !fld.is_sealed() {
                warn!("Skipping incomplete record at {}", entry.position);
                continue;
            }
            if fld.is_eflr() {
                let eflr = match ExplicitlyFormattedLogicalRecord::new(fld.lr_type, &mut fld.data) {
                    Ok(eflr) => eflr,
                    Err(e) if e.is_record_local() => {
                        warn!("Skipping EFLR at {}: {}", entry.position, e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                match logical_files.last_mut() {
                    Some(lf) if !LogicalFile::is_next(&eflr) => lf.add_eflr(fld.position, eflr)?,
                    _ => logical_files.push(LogicalFile::new(fld.position, eflr)?),
                }
            } else {
                let lf = logical_files
                    .last_mut()
                    .ok_or_else(|| WellLogError::Ctor("IFLR when there are no Logical Files".into()))?;
                if fld.lr_type != IFLR_FDATA {
                    debug!("Ignoring IFLR type {} at {}", fld.lr_type, entry.position);
                    continue;
                }
                let iflr = match IndirectlyFormattedLogicalRecord::new(fld.lr_type, &mut fld.data) {
                    Ok(iflr) => iflr,
                    Err(e @ WellLogError::Eof { .. }) => {
                        warn!("Skipping IFLR at {}: {}", entry.position, e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if iflr.remain > 0 {
                    match lf.add_iflr(fld.position, &iflr, &mut fld.data) {
                        Err(e) if e.is_record_local() => warn!("Skipping IFLR at {}: {}", entry.position, e),
                        other => other?,
                    }
                }
            }
        }
        info!(
            "{} Logical Files from {} logical records in {}",
            logical_files.len(),
            index.len(),
            index.path().display()
        );
        Ok(Self { index, logical_files })
    }

    pub fn len(&self) -> usize {
        self.logical_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logical_files.is_empty()
    }

    pub fn logical_files(&self) -> &[LogicalFile] {
        &self.logical_files
    }

    pub fn get(&self, index: usize) -> Result<&LogicalFile> {
        self.logical_files
            .get(index)
            .ok_or_else(|| WellLogError::index("logical file", index as i64, self.logical_files.len()))
    }

    pub fn logical_record_index(&self) -> &LogicalRecordIndex<R> {
        &self.index
    }

    /// See [`LogicalFile::populate_frame_array`].
    pub fn populate_frame_array(
        &mut self,
        logical_file: usize,
        ident: &ObName,
        frame_slice: &FrameSlice,
        channels: Option<&HashSet<ObName>>,
    ) -> Result<usize> {
        let len = self.logical_files.len();
        let lf = self
            .logical_files
            .get_mut(logical_file)
            .ok_or_else(|| WellLogError::index("logical file", logical_file as i64, len))?;
        lf.populate_frame_array(&self.index, ident, frame_slice, channels)
    }

    /// The populated frame array, after [`populate_frame_array`](Self::populate_frame_array).
    pub fn frame_array(&self, logical_file: usize, ident: &ObName) -> Option<&FrameArray> {
        self.logical_files.get(logical_file)?.log_pass()?.get(ident)
    }

    /// Release the file handle.
    pub fn close(&self) -> Result<()> {
        self.index.close()
    }
}
