//! Decoded frames of one log pass: a dense `frames x values` matrix of `f64`
//! addressed as `(frame, channel, sub-channel, sample, burst)`.
//!
//! LIS channels are not homogeneous, each row is the concatenation of the
//! selected channels' values in DSB order:
//!
//! ```text
//!            ch 0        ch 2 (samples=4)     ch 3 (bursts=8)
//! frame 0 | v        | s0 s1 s2 s3       | b0 b1 ... b7 | ...
//! frame 1 | v        | s0 s1 s2 s3       | b0 b1 ... b7 | ...
//! ```
//!
//! Within a channel values are sample major, burst minor. Dipmeter channels
//! keep their on-tape order: 16 super samples of the 5 fast sub-channels
//! interleaved, then (code 234) the 10 slow sub-channels.
//!
//! Channel indices in the public API are "external", the DSB index in the
//! DFSR. Frame indices are "internal", the row in this set; the external
//! frame number of a row is [`FrameSet::frame_numbers`].

use std::collections::HashMap;
use std::fmt;

use super::dfsr::{DatumSpecBlock, Dfsr};
use super::units;
use crate::welllog::codec::lis as rc;
use crate::welllog::frame::summary::{summarise, ArraySummary};
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::utils::trimmed_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubChannelTemplate {
    pub samples: usize,
    pub bursts: usize,
}

impl SubChannelTemplate {
    pub fn num_values(&self) -> usize {
        self.samples * self.bursts
    }
}

/// Value layout of one channel in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTemplate {
    pub rep_code: u8,
    /// Bytes per decoded value, one for dipmeter codes.
    pub word_length: usize,
    sub_channels: Vec<SubChannelTemplate>,
    sc_offsets: Vec<usize>,
    num_values: usize,
    mnems: Vec<Vec<u8>>,
}

impl ChannelTemplate {
    pub fn new(dsb: &DatumSpecBlock) -> Result<Self> {
        let word_length = rc::word_length(dsb.rep_code)?;
        let mut sub_channels = Vec::with_capacity(dsb.sub_channels());
        let mut sc_offsets = Vec::with_capacity(dsb.sub_channels());
        let mut mnems = Vec::with_capacity(dsb.sub_channels());
        let mut offset = 0;
        for sc in 0..dsb.sub_channels() {
            let template = SubChannelTemplate {
                samples: dsb.samples(sc)?,
                bursts: dsb.bursts(),
            };
            sc_offsets.push(offset);
            offset += template.num_values();
            sub_channels.push(template);
            mnems.push(dsb.sub_channel_mnem(sc).unwrap_or(dsb.mnem.as_slice()).to_vec());
        }
        Ok(Self {
            rep_code: dsb.rep_code,
            word_length,
            sub_channels,
            sc_offsets,
            num_values: offset,
            mnems,
        })
    }

    pub fn num_sub_channels(&self) -> usize {
        self.sub_channels.len()
    }

    pub fn num_values(&self) -> usize {
        self.num_values
    }

    /// Bytes of this channel in one frame.
    pub fn lis_size(&self) -> usize {
        self.word_length * self.num_values
    }

    pub fn sub_channel(&self, sc: usize) -> Result<&SubChannelTemplate> {
        self.sub_channels
            .get(sc)
            .ok_or_else(|| WellLogError::index("sub-channel", sc as i64, self.sub_channels.len()))
    }

    pub fn sub_channel_mnems(&self) -> &[Vec<u8>] {
        &self.mnems
    }

    /// `(start, stop, step)` of a sub-channel's values relative to the start
    /// of the channel.
    pub fn sub_channel_range(&self, sc: usize) -> Result<(usize, usize, usize)> {
        let template = self.sub_channel(sc)?;
        if rc::is_dipmeter(self.rep_code) {
            return Ok(if sc < rc::DIPMETER_NUM_FAST_CHANNELS {
                (sc, rc::DIPMETER_SIZE_FAST_CHANNELS, rc::DIPMETER_NUM_FAST_CHANNELS)
            } else {
                let start = rc::DIPMETER_SIZE_FAST_CHANNELS + sc - rc::DIPMETER_NUM_FAST_CHANNELS;
                (start, start + 1, 1)
            });
        }
        let start = self.sc_offsets[sc];
        Ok((start, start + template.num_values(), 1))
    }

    /// Offsets of every `[sc][sa][bu]` relative to the start of the channel.
    fn offsets(&self) -> Vec<Vec<Vec<usize>>> {
        if rc::is_dipmeter(self.rep_code) {
            return (0..self.num_sub_channels())
                .map(|sc| {
                    if sc < rc::DIPMETER_NUM_FAST_CHANNELS {
                        (0..rc::DIPMETER_FAST_CHANNEL_SUPER_SAMPLES)
                            .map(|sa| vec![sc + rc::DIPMETER_NUM_FAST_CHANNELS * sa])
                            .collect()
                    } else {
                        vec![vec![rc::DIPMETER_SIZE_FAST_CHANNELS + sc - rc::DIPMETER_NUM_FAST_CHANNELS]]
                    }
                })
                .collect();
        }
        let mut offset = 0;
        self.sub_channels
            .iter()
            .map(|t| {
                (0..t.samples)
                    .map(|_| {
                        let burst: Vec<usize> = (offset..offset + t.bursts).collect();
                        offset += t.bursts;
                        burst
                    })
                    .collect()
            })
            .collect()
    }
}

/// What the DFSR entry blocks say about the X axis.
#[derive(Debug, Clone, PartialEq)]
pub struct XAxisDecl {
    pub up_down: u8,
    pub frame_spacing: Option<f64>,
    pub frame_spacing_units: Option<Vec<u8>>,
    pub recording_mode: i64,
    pub depth_units: Vec<u8>,
    pub depth_rep_code: u8,
}

impl XAxisDecl {
    pub fn new(dfsr: &Dfsr) -> Self {
        let ebs = &dfsr.ebs;
        Self {
            up_down: ebs.up_down(),
            frame_spacing: ebs.frame_spacing(),
            frame_spacing_units: ebs.frame_spacing_units().map(<[u8]>::to_vec),
            recording_mode: ebs.recording_mode(),
            depth_units: ebs.depth_units().to_vec(),
            depth_rep_code: ebs.depth_rep_code(),
        }
    }

    pub fn is_log_up(&self) -> bool {
        self.up_down == 1
    }

    pub fn is_log_down(&self) -> bool {
        self.up_down == 255
    }

    pub fn is_indirect_x(&self) -> bool {
        self.recording_mode == 1
    }

    /// The declared spacing in depth units, negative for an up log.
    ///
    /// # Errors
    /// `Units` if the spacing units can not be converted.
    pub(crate) fn signed_spacing(&self) -> Result<Option<f64>> {
        let Some(spacing) = self.frame_spacing else {
            return Ok(None);
        };
        let spacing = match &self.frame_spacing_units {
            Some(u) => units::convert(spacing, u, &self.depth_units)?,
            None => spacing,
        }
        .abs();
        Ok(Some(if self.is_log_up() { -spacing } else { spacing }))
    }
}

#[derive(Debug, Clone)]
pub struct FrameSet {
    x_axis_decl: XAxisDecl,
    absent_value: f64,
    num_ext_channels: usize,
    ch_int_ext: Vec<usize>,
    ch_ext_int: HashMap<usize, usize>,
    templates: Vec<ChannelTemplate>,
    values_per_frame: usize,
    ch_value_start: Vec<usize>,
    /// `[channel][sc][sa][bu]` to offset in the frame.
    offset_tree: Vec<Vec<Vec<Vec<usize>>>>,
    /// `[channel][sc]` to `(start, stop, step)` in the frame.
    slice_tree: Vec<Vec<(usize, usize, usize)>>,
    frame_numbers: Vec<usize>,
    frames: Vec<f64>,
    indirect_x: Option<Vec<f64>>,
    frame_spacing: Option<f64>,
    x_axis_offset: Option<usize>,
}

impl FrameSet {
    /// A set of `frame_numbers.len()` frames of the `channels` (external
    /// indices, default all) of `dfsr`. For a direct X axis the X channel
    /// is always included.
    ///
    /// # Errors
    /// `Ctor` if `x_axis_index` is out of range for a direct X axis,
    /// `IndexOutOfRange` for an unknown channel, `Units` if the declared
    /// spacing can not be converted to depth units.
    pub fn new(dfsr: &Dfsr, frame_numbers: Vec<usize>, channels: Option<&[usize]>, x_axis_index: usize) -> Result<Self> {
        let x_axis_decl = XAxisDecl::new(dfsr);
        let num_ext_channels = dfsr.dsbs.len();
        let indirect = x_axis_decl.is_indirect_x();
        if !indirect && x_axis_index >= num_ext_channels {
            return Err(WellLogError::Ctor(format!(
                "X axis index {} out of range for {} channels",
                x_axis_index, num_ext_channels
            )));
        }
        let ch_int_ext: Vec<usize> = match channels {
            None => (0..num_ext_channels).collect(),
            Some(chs) => {
                let mut chs = chs.to_vec();
                if !indirect {
                    chs.push(x_axis_index);
                }
                chs.sort_unstable();
                chs.dedup();
                if let Some(&last) = chs.last() {
                    if last >= num_ext_channels {
                        return Err(WellLogError::index("channel", last as i64, num_ext_channels));
                    }
                }
                chs
            }
        };
        let ch_ext_int = ch_int_ext.iter().enumerate().map(|(i, e)| (*e, i)).collect();
        let templates = ch_int_ext
            .iter()
            .map(|e| ChannelTemplate::new(&dfsr.dsbs[*e]))
            .collect::<Result<Vec<_>>>()?;

        let mut ch_value_start = Vec::with_capacity(templates.len());
        let mut offset_tree: Vec<Vec<Vec<Vec<usize>>>> = Vec::with_capacity(templates.len());
        let mut slice_tree = Vec::with_capacity(templates.len());
        let mut start = 0;
        for t in &templates {
            ch_value_start.push(start);
            let shifted: Vec<Vec<Vec<usize>>> = t
                .offsets()
                .into_iter()
                .map(|sc| {
                    sc.into_iter()
                        .map(|sa| sa.into_iter().map(|bu| bu + start).collect::<Vec<_>>())
                        .collect::<Vec<_>>()
                })
                .collect();
            offset_tree.push(shifted);
            slice_tree.push(
                (0..t.num_sub_channels())
                    .map(|sc| t.sub_channel_range(sc).map(|(a, b, s)| (start + a, start + b, s)))
                    .collect::<Result<Vec<_>>>()?,
            );
            start += t.num_values();
        }
        let values_per_frame = start;

        let (indirect_x, frame_spacing, x_axis_offset) = if indirect {
            (Some(vec![0.0; frame_numbers.len()]), x_axis_decl.signed_spacing()?, None)
        } else {
            let x_int = ch_int_ext.iter().position(|e| *e == x_axis_index);
            (None, None, x_int.map(|i| ch_value_start[i]))
        };
        Ok(Self {
            absent_value: dfsr.ebs.absent_value(),
            x_axis_decl,
            num_ext_channels,
            ch_int_ext,
            ch_ext_int,
            templates,
            values_per_frame,
            ch_value_start,
            offset_tree,
            slice_tree,
            frames: vec![0.0; frame_numbers.len() * values_per_frame],
            frame_numbers,
            indirect_x,
            frame_spacing,
            x_axis_offset,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.frame_numbers.len()
    }

    pub fn values_per_frame(&self) -> usize {
        self.values_per_frame
    }

    pub fn num_values(&self) -> usize {
        self.frames.len()
    }

    /// Bytes of the selected channels of all frames as recorded.
    pub fn lis_size(&self) -> usize {
        self.num_frames() * self.templates.iter().map(ChannelTemplate::lis_size).sum::<usize>()
    }

    /// The raw row-major matrix.
    pub fn frames(&self) -> &[f64] {
        &self.frames
    }

    pub fn frame(&self, fr: usize) -> Result<&[f64]> {
        self.check_frame(fr)?;
        Ok(&self.frames[fr * self.values_per_frame..(fr + 1) * self.values_per_frame])
    }

    /// External frame number of each row.
    pub fn frame_numbers(&self) -> &[usize] {
        &self.frame_numbers
    }

    pub fn ext_frame_num(&self, fr: usize) -> Result<usize> {
        self.check_frame(fr)?;
        Ok(self.frame_numbers[fr])
    }

    /// The row holding external frame `ext`.
    pub fn int_frame_num(&self, ext: usize) -> Result<usize> {
        self.frame_numbers
            .iter()
            .position(|f| *f == ext)
            .ok_or_else(|| WellLogError::index("frame", ext as i64, self.num_frames()))
    }

    pub fn num_channels(&self) -> usize {
        self.templates.len()
    }

    /// External channel indices in row order.
    pub fn ext_channel_indices(&self) -> &[usize] {
        &self.ch_int_ext
    }

    pub fn internal_ch_idx(&self, ch: usize) -> Result<usize> {
        self.ch_ext_int
            .get(&ch)
            .copied()
            .ok_or_else(|| WellLogError::index("channel", ch as i64, self.num_ext_channels))
    }

    pub fn template(&self, ch: usize) -> Result<&ChannelTemplate> {
        Ok(&self.templates[self.internal_ch_idx(ch)?])
    }

    pub fn num_sub_channels(&self, ch: usize) -> Result<usize> {
        Ok(self.template(ch)?.num_sub_channels())
    }

    pub fn num_samples(&self, ch: usize, sc: usize) -> Result<usize> {
        Ok(self.template(ch)?.sub_channel(sc)?.samples)
    }

    pub fn num_bursts(&self, ch: usize, sc: usize) -> Result<usize> {
        Ok(self.template(ch)?.sub_channel(sc)?.bursts)
    }

    pub fn is_indirect_x(&self) -> bool {
        self.x_axis_decl.is_indirect_x()
    }

    pub fn x_axis_decl(&self) -> &XAxisDecl {
        &self.x_axis_decl
    }

    pub fn absent_value(&self) -> f64 {
        self.absent_value
    }

    /// Declared spacing of an indirect X axis in depth units, negative for
    /// an up log.
    pub fn frame_spacing(&self) -> Option<f64> {
        self.frame_spacing
    }

    /// The X distance covered by `frames` frames of an indirect X axis.
    ///
    /// # Errors
    /// `NullSpacing` if no spacing was declared.
    pub fn x_axis_step(&self, frames: usize) -> Result<f64> {
        self.frame_spacing
            .map(|s| s * frames as f64)
            .ok_or_else(|| WellLogError::NullSpacing("indirect X axis with no declared frame spacing".into()))
    }

    fn check_frame(&self, fr: usize) -> Result<()> {
        if fr >= self.num_frames() {
            return Err(WellLogError::index("frame", fr as i64, self.num_frames()));
        }
        Ok(())
    }

    /// Decode the bytes of channels `ch_from..=ch_to` of one frame into row
    /// `fr`. The channels must all be in this set.
    ///
    /// # Errors
    /// `Geometry` if `bytes` is not exactly the size of those channels.
    pub fn set_frame_bytes(&mut self, bytes: &[u8], fr: usize, ch_from: usize, ch_to: usize) -> Result<()> {
        self.check_frame(fr)?;
        let row = fr * self.values_per_frame;
        let mut pos = 0;
        for ch in ch_from..=ch_to {
            let ch_int = self.internal_ch_idx(ch)?;
            let template = &self.templates[ch_int];
            let mut index = row + self.ch_value_start[ch_int];
            for _ in 0..template.num_values() {
                let end = pos + template.word_length;
                let word = bytes.get(pos..end).ok_or_else(|| {
                    WellLogError::Geometry(format!(
                        "frame bytes for channels {}..={} end at {} of {}",
                        ch_from,
                        ch_to,
                        bytes.len(),
                        end
                    ))
                })?;
                self.frames[index] = rc::read_f64(template.rep_code, word)?;
                index += 1;
                pos = end;
            }
        }
        if pos != bytes.len() {
            return Err(WellLogError::Geometry(format!(
                "frame bytes for channels {}..={}: used {} of {}",
                ch_from,
                ch_to,
                pos,
                bytes.len()
            )));
        }
        Ok(())
    }

    /// Set the indirect X value of row `fr`.
    pub fn set_indirect_x(&mut self, fr: usize, value: f64) -> Result<()> {
        self.check_frame(fr)?;
        match self.indirect_x.as_mut() {
            Some(x) => {
                x[fr] = value;
                Ok(())
            }
            None => Err(WellLogError::InvalidFormat("frame set has a direct X axis".into())),
        }
    }

    pub fn x_axis_value(&self, fr: usize) -> Result<f64> {
        self.check_frame(fr)?;
        match (&self.indirect_x, self.x_axis_offset) {
            (Some(x), _) => Ok(x[fr]),
            (None, Some(offset)) => Ok(self.frames[fr * self.values_per_frame + offset]),
            (None, None) => Err(WellLogError::Geometry("frame set has no X axis".into())),
        }
    }

    /// X axis values of every row.
    pub fn x_axis_values(&self) -> Result<Vec<f64>> {
        (0..self.num_frames()).map(|fr| self.x_axis_value(fr)).collect()
    }

    /// Offset in the frame of external channel `ch`, sub-channel, sample,
    /// burst.
    pub fn value_index_in_frame(&self, ch: usize, sc: usize, sa: usize, bu: usize) -> Result<usize> {
        let samples = self
            .offset_tree
            .get(self.internal_ch_idx(ch)?)
            .and_then(|scs| scs.get(sc))
            .ok_or_else(|| WellLogError::index("sub-channel", sc as i64, self.num_sub_channels(ch).unwrap_or(0)))?;
        let bursts = samples
            .get(sa)
            .ok_or_else(|| WellLogError::index("sample", sa as i64, samples.len()))?;
        bursts
            .get(bu)
            .copied()
            .ok_or_else(|| WellLogError::index("burst", bu as i64, bursts.len()))
    }

    pub fn value(&self, fr: usize, ch: usize, sc: usize, sa: usize, bu: usize) -> Result<f64> {
        self.check_frame(fr)?;
        Ok(self.frames[fr * self.values_per_frame + self.value_index_in_frame(ch, sc, sa, bu)?])
    }

    fn sub_channel_slice(&self, ch: usize, sc: usize) -> Result<(usize, usize, usize)> {
        let ch_int = self.internal_ch_idx(ch)?;
        self.templates[ch_int].sub_channel(sc)?;
        Ok(self.slice_tree[ch_int][sc])
    }

    /// Every value of a sub-channel, frame by frame, sample then burst
    /// order.
    pub fn ch_sc_values(&self, ch: usize, sc: usize) -> Result<Vec<f64>> {
        let (start, stop, step) = self.sub_channel_slice(ch, sc)?;
        let mut out = Vec::new();
        for row in self.frames.chunks_exact(self.values_per_frame.max(1)) {
            out.extend((start..stop).step_by(step).map(|i| row[i]));
        }
        Ok(out)
    }

    /// Per frame spacing used to place samples within a frame.
    fn sample_frame_spacing(&self, samples: usize) -> Result<f64> {
        if self.is_indirect_x() {
            return self
                .frame_spacing
                .ok_or_else(|| WellLogError::NullSpacing("indirect X axis with no declared frame spacing".into()));
        }
        let n = self.num_frames();
        if n > 1 && self.frame_numbers[n - 1] != self.frame_numbers[0] {
            let dx = self.x_axis_value(n - 1)? - self.x_axis_value(0)?;
            let df = self.frame_numbers[n - 1] as f64 - self.frame_numbers[0] as f64;
            return Ok(dx / df);
        }
        if samples > 1 {
            return self.x_axis_decl.frame_spacing.ok_or_else(|| {
                WellLogError::NullSpacing(
                    "one frame, no declared spacing and multiple samples, can not place samples on the X axis".into(),
                )
            });
        }
        Ok(0.0)
    }

    /// `(x, value)` for every value of a sub-channel. Multiple samples are
    /// spread evenly over the interval ending at the frame's X value, the
    /// interval starting at the previous frame's X value when that frame is
    /// the adjacent one, otherwise one frame spacing before.
    ///
    /// # Errors
    /// `NullSpacing` if there are multiple samples and no spacing can be
    /// found.
    pub fn ch_sc_points(&self, ch: usize, sc: usize) -> Result<Vec<(f64, f64)>> {
        let (start, stop, step) = self.sub_channel_slice(ch, sc)?;
        let template = *self.template(ch)?.sub_channel(sc)?;
        let mut out = Vec::with_capacity(self.num_frames() * template.num_values());
        if self.num_frames() == 0 {
            return Ok(out);
        }
        let x = self.x_axis_values()?;
        if template.samples == 1 {
            for (fr, row) in self.frames.chunks_exact(self.values_per_frame).enumerate() {
                out.extend((start..stop).step_by(step).map(|i| (x[fr], row[i])));
            }
            return Ok(out);
        }
        let spacing = self.sample_frame_spacing(template.samples)?;
        let sample_step = spacing / template.samples as f64;
        for (fr, row) in self.frames.chunks_exact(self.values_per_frame).enumerate() {
            let adjacent = fr > 0 && self.frame_numbers[fr - 1] + 1 == self.frame_numbers[fr];
            let mut x_sample = if adjacent { x[fr - 1] } else { x[fr] - spacing };
            for (k, i) in (start..stop).step_by(step).enumerate() {
                if k % template.bursts == 0 {
                    x_sample += sample_step;
                }
                out.push((x_sample, row[i]));
            }
        }
        Ok(out)
    }

    /// Every value as `(external frame, external channel, sc, sa, bu, value)`.
    pub fn all_values(&self) -> Vec<(usize, usize, usize, usize, usize, f64)> {
        let mut out = Vec::with_capacity(self.frames.len());
        for (fr, row) in self.frames.chunks_exact(self.values_per_frame.max(1)).enumerate() {
            for (ch_int, scs) in self.offset_tree.iter().enumerate() {
                for (sc, samples) in scs.iter().enumerate() {
                    for (sa, bursts) in samples.iter().enumerate() {
                        for (bu, offset) in bursts.iter().enumerate() {
                            out.push((self.frame_numbers[fr], self.ch_int_ext[ch_int], sc, sa, bu, row[*offset]));
                        }
                    }
                }
            }
        }
        out
    }

    /// True for each value of a sub-channel that is the absent value.
    pub fn mask(&self, ch: usize, sc: usize) -> Result<Vec<bool>> {
        Ok(self
            .ch_sc_values(ch, sc)?
            .into_iter()
            .map(|v| v == self.absent_value)
            .collect())
    }

    pub fn summary(&self, ch: usize, sc: usize) -> Result<Option<ArraySummary>> {
        Ok(summarise(&self.ch_sc_values(ch, sc)?, Some(self.absent_value)))
    }

    /// Reverse the row order, used after reading a negative step selection
    /// in file order.
    pub(crate) fn reverse_frames(&mut self) {
        let width = self.values_per_frame;
        if width > 0 {
            let rows: Vec<&[f64]> = self.frames.chunks_exact(width).rev().collect();
            self.frames = rows.concat();
        }
        self.frame_numbers.reverse();
        if let Some(x) = self.indirect_x.as_mut() {
            x.reverse();
        }
    }

    /// Tab separated mnemonics then one line per frame.
    pub fn dump_frames(&self) -> String {
        let mut out = self
            .templates
            .iter()
            .flat_map(|t| t.sub_channel_mnems().iter().map(|m| trimmed_text(m)))
            .collect::<Vec<_>>()
            .join("\t");
        out.push('\n');
        for row in self.frames.chunks_exact(self.values_per_frame.max(1)) {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            out.push_str(&line.join("\t"));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for FrameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FrameSet: {} frames x {} values, channels {:?}",
            self.num_frames(),
            self.values_per_frame,
            self.ch_int_ext
        )
    }
}
