//! A log pass: one DFSR and the type 0/1 records that follow it.
//!
//! ```text
//! DFSR ──> FrameSetPlan      byte layout of a frame within a record
//!     └──> RleType01         where the records are, frames and X per record
//!     └──> channel map       MNEM -> (channel, sub-channel)
//!
//! selection ──> records ──> events ──> FrameSet
//! ```
//!
//! Reading a frame set seeks to each record holding a selected frame and
//! follows the [`Event`]s of its [`FrameSetPlan`], reading only the wanted
//! channels of the wanted frames.

use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek};

use super::dfsr::Dfsr;
use super::frame_set::{FrameSet, XAxisDecl};
use super::phys_rec::PhysicalRecordReader;
use super::plan::{Event, FrameSetPlan};
use super::rle::RleType01;
use super::units;
use crate::welllog::codec::lis as rc;
use crate::welllog::frame::slice::{FrameSlice, Slice};
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::utils::trimmed_text;

/// Mnemonics compare without their trailing padding.
fn mnem_key(mnem: &[u8]) -> Vec<u8> {
    let end = mnem
        .iter()
        .rposition(|b| *b != b' ' && *b != 0)
        .map_or(0, |p| p + 1);
    mnem[..end].to_vec()
}

#[derive(Debug, Clone)]
pub struct LogPass {
    dfsr: Dfsr,
    plan: FrameSetPlan,
    x_axis_index: usize,
    ch_map: HashMap<Vec<u8>, (usize, usize)>,
    unit_map: HashMap<Vec<u8>, Vec<u8>>,
    rle: RleType01,
    frame_set: Option<FrameSet>,
}

impl LogPass {
    /// # Arguments
    /// * `x_axis_index` - DSB index of the X axis channel, ignored for an
    ///   indirect X axis but still range checked.
    ///
    /// # Errors
    /// `Ctor` if the DFSR has no channels or `x_axis_index` is out of range.
    pub fn new(dfsr: Dfsr, x_axis_index: usize) -> Result<Self> {
        if dfsr.dsbs.is_empty() {
            return Err(WellLogError::Ctor("log pass has no channels".into()));
        }
        if x_axis_index >= dfsr.dsbs.len() {
            return Err(WellLogError::Ctor(format!(
                "X axis index {} out of range for {} channels",
                x_axis_index,
                dfsr.dsbs.len()
            )));
        }
        let plan = FrameSetPlan::new(&dfsr)?;
        let mut ch_map = HashMap::new();
        let mut unit_map = HashMap::new();
        for (ch, dsb) in dfsr.dsbs.iter().enumerate() {
            for sc in 0..dsb.sub_channels() {
                let Some(mnem) = dsb.sub_channel_mnem(sc) else {
                    warn!("No mnemonic for channel {} sub-channel {}", ch, sc);
                    continue;
                };
                let key = mnem_key(mnem);
                if let Some((old_ch, old_sc)) = ch_map.insert(key.clone(), (ch, sc)) {
                    warn!(
                        "Duplicate mnemonic {} at channel {} sub-channel {} replaces channel {} sub-channel {}",
                        trimmed_text(mnem),
                        ch,
                        sc,
                        old_ch,
                        old_sc
                    );
                }
                unit_map.insert(key, dsb.units.clone());
            }
        }
        let x_units = if dfsr.ebs.is_indirect_x() {
            dfsr.ebs.depth_units().to_vec()
        } else {
            dfsr.dsbs[x_axis_index].units.clone()
        };
        Ok(Self {
            rle: RleType01::new(&x_units),
            dfsr,
            plan,
            x_axis_index,
            ch_map,
            unit_map,
            frame_set: None,
        })
    }

    pub fn dfsr(&self) -> &Dfsr {
        &self.dfsr
    }

    pub fn plan(&self) -> &FrameSetPlan {
        &self.plan
    }

    pub fn rle(&self) -> &RleType01 {
        &self.rle
    }

    /// The frames read by the last [`LogPass::set_frame_set`].
    pub fn frame_set(&self) -> Option<&FrameSet> {
        self.frame_set.as_ref()
    }

    /// Type of the data records, 0 or 1.
    pub fn iflr_type(&self) -> u8 {
        self.dfsr.ebs.data_type()
    }

    pub fn x_axis_index(&self) -> usize {
        self.x_axis_index
    }

    pub fn is_indirect_x(&self) -> bool {
        self.dfsr.ebs.is_indirect_x()
    }

    pub fn null_value(&self) -> f64 {
        self.dfsr.ebs.absent_value()
    }

    /// Bytes of frame data over all records.
    pub fn num_bytes(&self) -> usize {
        self.rle.total_frames() * self.plan.frame_size()
    }

    pub fn has_mnem(&self, mnem: &[u8]) -> bool {
        self.ch_map.contains_key(&mnem_key(mnem))
    }

    /// Every output mnemonic, sorted.
    pub fn mnems(&self) -> Vec<&[u8]> {
        let mut out: Vec<&[u8]> = self.ch_map.keys().map(Vec::as_slice).collect();
        out.sort_unstable();
        out
    }

    /// `(channel, sub-channel)` of a mnemonic.
    pub fn ch_sc(&self, mnem: &[u8]) -> Result<(usize, usize)> {
        self.ch_map
            .get(&mnem_key(mnem))
            .copied()
            .ok_or_else(|| WellLogError::InvalidFormat(format!("no channel {} in log pass", trimmed_text(mnem))))
    }

    pub fn curve_units(&self, mnem: &[u8]) -> Option<&[u8]> {
        self.unit_map.get(&mnem_key(mnem)).map(Vec::as_slice)
    }

    /// Sorted, unique channel indices for some mnemonics.
    pub fn ext_channel_indices(&self, mnems: &[&[u8]]) -> Result<Vec<usize>> {
        let mut out = mnems
            .iter()
            .map(|m| self.ch_sc(m).map(|(ch, _)| ch))
            .collect::<Result<Vec<_>>>()?;
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    pub fn total_frames(&self) -> usize {
        self.rle.total_frames()
    }

    pub fn x_axis_units(&self) -> &[u8] {
        self.rle.x_axis_units()
    }

    pub fn x_axis_units_optical(&self) -> Vec<u8> {
        units::optical_units(self.rle.x_axis_units())
    }

    pub fn x_axis_first_val(&self) -> Option<f64> {
        self.rle.x_axis_first()
    }

    pub fn x_axis_last_val(&self) -> Result<Option<f64>> {
        match self.rle.x_axis_last_frame() {
            Err(WellLogError::NullSpacing(_)) if self.is_indirect_x() => {
                let last = self.rle.items().last();
                let declared = XAxisDecl::new(&self.dfsr).signed_spacing()?;
                Ok(match (self.rle.x_axis_last(), last, declared) {
                    (Some(x), Some(item), Some(spacing)) => Some(x + (item.num_frames() - 1) as f64 * spacing),
                    _ => None,
                })
            }
            other => other,
        }
    }

    /// Spacing from the first and last records, negative for a decreasing X
    /// axis. An indirect X axis with all its frames in one record falls back
    /// to the declared spacing.
    pub fn x_axis_spacing(&self) -> Result<Option<f64>> {
        match self.rle.frame_spacing() {
            Err(WellLogError::NullSpacing(message)) if self.is_indirect_x() => {
                match XAxisDecl::new(&self.dfsr).signed_spacing()? {
                    Some(spacing) => Ok(Some(spacing)),
                    None => Err(WellLogError::NullSpacing(message)),
                }
            }
            other => other,
        }
    }

    fn optical(&self, value: Option<f64>) -> Result<Option<f64>> {
        value
            .map(|v| units::convert(v, self.x_axis_units(), &self.x_axis_units_optical()))
            .transpose()
    }

    pub fn x_axis_first_val_optical(&self) -> Result<Option<f64>> {
        self.optical(self.x_axis_first_val())
    }

    pub fn x_axis_last_val_optical(&self) -> Result<Option<f64>> {
        self.optical(self.x_axis_last_val()?)
    }

    pub fn x_axis_spacing_optical(&self) -> Result<Option<f64>> {
        self.optical(self.x_axis_spacing()?)
    }

    /// The frame at or just before `x`, in X axis units.
    ///
    /// # Errors
    /// `NullSpacing` with no usable spacing, `IndexOutOfRange` if `x` is
    /// outside the first and last X values.
    pub fn frame_from_x(&self, x: f64) -> Result<usize> {
        let total = self.rle.total_frames();
        let (Some(first), Some(last)) = (self.x_axis_first_val(), self.x_axis_last_val()?) else {
            return Err(WellLogError::index("frame", 0, total));
        };
        let spacing = self
            .x_axis_spacing()?
            .filter(|s| *s != 0.0)
            .ok_or_else(|| WellLogError::NullSpacing("can not find a frame from X with zero spacing".into()))?;
        let frame = ((x - first) / spacing).floor();
        let (lo, hi) = if first <= last { (first, last) } else { (last, first) };
        if x < lo || x > hi || frame < 0.0 || frame >= total as f64 {
            return Err(WellLogError::index("frame", frame as i64, total));
        }
        Ok(frame as usize)
    }

    /// [`LogPass::frame_from_x`] for a value in other length units.
    pub fn frame_from_x_in_units(&self, x: f64, x_units: &[u8]) -> Result<usize> {
        self.frame_from_x(units::convert(x, x_units, self.x_axis_units())?)
    }

    /// Record a type 0/1 record of this pass.
    ///
    /// # Arguments
    /// * `tell` - Position of the record from
    ///   [`PhysicalRecordReader::tell_logical_record`].
    /// * `lr_len` - Logical data length, header excluded.
    /// * `x_axis` - X value of the record's first frame.
    ///
    /// # Errors
    /// `InvalidFormat` if the record type is not the DFSR's data type,
    /// `FrameSizeMismatch` if the record does not hold a whole number of frames.
    pub fn add_type01_data(&mut self, tell: u64, lr_type: u8, lr_len: usize, x_axis: f64) -> Result<()> {
        if lr_type != self.iflr_type() {
            return Err(WellLogError::InvalidFormat(format!(
                "data record type {} in a log pass of type {}",
                lr_type,
                self.iflr_type()
            )));
        }
        let frames = self.plan.num_frames(lr_len)?;
        self.rle.add(tell, frames, x_axis);
        Ok(())
    }

    /// Seek and plan events that read `frames` (ascending) of `channels`.
    /// Frame numbers in the events are rows of the frame set.
    ///
    /// Frames in one record are read in one pass when they are evenly
    /// spaced, otherwise each evenly spaced run seeks to the record again.
    pub fn gen_frame_set_events(&self, frames: &[usize], channels: &[usize]) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        let mut base = 0;
        let mut i = 0;
        while i < frames.len() {
            let (position, local) = self.rle.tell_lr_for_frame(frames[i])?;
            let mut locals = vec![local];
            let mut j = i + 1;
            while j < frames.len() {
                let (p, l) = self.rle.tell_lr_for_frame(frames[j])?;
                if p != position || (locals.len() > 1 && l - locals[locals.len() - 1] != locals[1] - locals[0]) {
                    break;
                }
                locals.push(l);
                j += 1;
            }
            let start = locals[0];
            let step = if locals.len() > 1 { locals[1] - locals[0] } else { 1 };
            let stop = locals[locals.len() - 1] + 1;
            let row = |f: usize| base + (f - start) / step;
            events.push(Event::SeekLr(position));
            for event in self.plan.gen_events(start, stop, step, channels)? {
                events.push(match event {
                    Event::Read {
                        size,
                        frame,
                        ch_from,
                        ch_to,
                    } => Event::Read {
                        size,
                        frame: match frame {
                            Some(f) => Some(row(f)),
                            None => (start == 0).then_some(base),
                        },
                        ch_from,
                        ch_to,
                    },
                    Event::Skip {
                        size,
                        frame,
                        ch_from,
                        ch_to,
                    } => Event::Skip {
                        size,
                        frame: row(frame),
                        ch_from,
                        ch_to,
                    },
                    Event::Extrapolate { frames, frame } => Event::Extrapolate {
                        frames,
                        frame: row(frame),
                    },
                    seek => seek,
                });
            }
            base += locals.len();
            i = j;
        }
        Ok(events)
    }

    /// Read a selection of frames (default all) of some channels (default
    /// all) into a new frame set, returning the number of frames read.
    ///
    /// A negative step selection is read in file order then reversed.
    ///
    /// # Errors
    /// `InvalidFormat` if the pass has no frames or a record is not of the
    /// pass' data type, any read or decode error.
    pub fn set_frame_set<R: Read + Seek>(
        &mut self,
        reader: &mut PhysicalRecordReader<R>,
        selection: Option<FrameSlice>,
        channels: Option<&[usize]>,
    ) -> Result<usize> {
        let total = self.rle.total_frames();
        if total == 0 {
            return Err(WellLogError::InvalidFormat("log pass has no frames to load".into()));
        }
        let selection = selection.unwrap_or_default();
        let mut frames = selection.indices(total);
        let descending = frames.windows(2).any(|w| w[0] > w[1]);
        frames.sort_unstable();
        frames.dedup();
        debug!("Reading {} of {} frames", selection.long_str(total), total);

        let mut frame_set = FrameSet::new(&self.dfsr, frames.clone(), channels, self.x_axis_index)?;
        let events = self.gen_frame_set_events(&frames, frame_set.ext_channel_indices())?;
        let indirect_size = self.plan.indirect_size();
        let depth_rep_code = self.dfsr.ebs.depth_rep_code();
        let mut x_cursor = 0.0;
        for event in events {
            match event {
                Event::SeekLr(position) => {
                    reader.seek_logical_record(position)?;
                    let lr_type = match reader.read_logical_record_header()? {
                        Some((lr_type, _)) => lr_type,
                        None => {
                            return Err(WellLogError::Truncated {
                                offset: position,
                                message: "no logical record where a data record was indexed".into(),
                            })
                        }
                    };
                    if lr_type != self.iflr_type() {
                        return Err(WellLogError::InvalidFormat(format!(
                            "record at 0x{:x} is type {}, not type {}",
                            position,
                            lr_type,
                            self.iflr_type()
                        )));
                    }
                }
                Event::Skip { size, .. } => {
                    let skipped = reader.skip(size)?;
                    if skipped != size {
                        return Err(WellLogError::Truncated {
                            offset: reader.tell_logical_record(),
                            message: format!("skipped {} of {} bytes", skipped, size),
                        });
                    }
                }
                Event::Extrapolate { frames, frame } => {
                    x_cursor += frame_set.x_axis_step(frames)?;
                    frame_set.set_indirect_x(frame, x_cursor)?;
                }
                Event::Read {
                    size,
                    frame,
                    ch_from: Some(ch_from),
                    ch_to,
                } => {
                    let bytes = reader.read_exact(size)?;
                    let frame = frame.ok_or_else(|| WellLogError::Geometry("channel read without a frame".into()))?;
                    frame_set.set_frame_bytes(&bytes, frame, ch_from, ch_to.unwrap_or(ch_from))?;
                }
                Event::Read {
                    size,
                    frame,
                    ch_from: None,
                    ch_to,
                } => {
                    let bytes = reader.read_exact(size)?;
                    let (x_bytes, rest) = bytes.split_at(indirect_size.min(bytes.len()));
                    x_cursor = rc::read_f64(depth_rep_code, x_bytes)?;
                    if let Some(frame) = frame {
                        frame_set.set_indirect_x(frame, x_cursor)?;
                        if let Some(ch_to) = ch_to {
                            frame_set.set_frame_bytes(rest, frame, 0, ch_to)?;
                        }
                    }
                }
            }
        }
        if descending {
            frame_set.reverse_frames();
        }
        let read = frame_set.num_frames();
        self.frame_set = Some(frame_set);
        Ok(read)
    }

    /// Read frames from `x_start` up to, not including, `x_stop` by
    /// `step`, for some mnemonics (default all).
    pub fn set_frame_set_from_x<R: Read + Seek>(
        &mut self,
        reader: &mut PhysicalRecordReader<R>,
        mnems: Option<&[&[u8]]>,
        x_start: f64,
        x_stop: f64,
        step: usize,
    ) -> Result<usize> {
        let channels = mnems.map(|m| self.ext_channel_indices(m)).transpose()?;
        let start = self.frame_from_x(x_start)? as i64;
        let stop = self.frame_from_x(x_stop)? as i64;
        let selection = Slice::new(Some(start), Some(stop), Some(step.max(1) as i64))?;
        self.set_frame_set(reader, Some(selection.into()), channels.as_deref())
    }

    /// `(x, value)` of a mnemonic from the current frame set.
    pub fn ch_sc_points(&self, mnem: &[u8]) -> Result<Vec<(f64, f64)>> {
        let (ch, sc) = self.ch_sc(mnem)?;
        self.frame_set
            .as_ref()
            .ok_or_else(|| WellLogError::InvalidFormat("log pass has no frame set".into()))?
            .ch_sc_points(ch, sc)
    }

    /// A name and units for each value of a frame of the current frame set.
    pub fn frame_set_headings(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let frame_set = self
            .frame_set
            .as_ref()
            .ok_or_else(|| WellLogError::InvalidFormat("log pass has no frame set".into()))?;
        let mut out = Vec::with_capacity(frame_set.values_per_frame());
        for ch in frame_set.ext_channel_indices() {
            let dsb = &self.dfsr.dsbs[*ch];
            if rc::is_dipmeter(dsb.rep_code) {
                for value in 0..dsb.values() {
                    let (sc, sa) = if value < rc::DIPMETER_SIZE_FAST_CHANNELS {
                        (value % rc::DIPMETER_NUM_FAST_CHANNELS, value / rc::DIPMETER_NUM_FAST_CHANNELS)
                    } else {
                        (rc::DIPMETER_NUM_FAST_CHANNELS + value - rc::DIPMETER_SIZE_FAST_CHANNELS, 0)
                    };
                    let name = trimmed_text(rc::DIPMETER_SUB_CHANNEL_NAMES[sc]);
                    out.push((format!("{} ({}, 0)", name, sa), dsb.units.clone()));
                }
                continue;
            }
            for sc in 0..dsb.sub_channels() {
                let name = trimmed_text(dsb.sub_channel_mnem(sc).unwrap_or(&dsb.mnem[..]));
                let (samples, bursts) = (dsb.samples(sc)?, dsb.bursts());
                if samples * bursts > 1 {
                    for sa in 0..samples {
                        for bu in 0..bursts {
                            out.push((format!("{} ({}, {})", name, sa, bu), dsb.units.clone()));
                        }
                    }
                } else {
                    out.push((name, dsb.units.clone()));
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for LogPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LogPass: type {} channels {} records {} frames {} X units {}",
            self.iflr_type(),
            self.dfsr.dsbs.len(),
            self.rle.num_records(),
            self.rle.total_frames(),
            trimmed_text(self.x_axis_units())
        )
    }
}
