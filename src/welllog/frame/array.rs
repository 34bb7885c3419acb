//! Dense frame storage.
//!
//! - A [`FrameArraySet`] is a set of [`FrameArray`]s recorded independently.
//! - A [`FrameArray`] is a set of [`FrameChannel`]s recorded simultaneously,
//!   the first channel being the X axis.
//! - A [`FrameChannel`] holds, for every populated frame, `count` values laid
//!   out row-major over its dimensions.
//!
//! Values are stored as `f64` whatever the representation code. Absent values
//! are kept as decoded; [`FrameChannel::mask`] reports them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::warn;

use super::summary::{summarise, ArraySummary};
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::ObName;
use crate::welllog::utils::display_text;

#[derive(Debug, Clone)]
pub struct FrameChannel {
    pub ident: ObName,
    pub long_name: Vec<u8>,
    pub units: Vec<u8>,
    pub rep_code: u8,
    pub dimensions: Vec<usize>,
    /// Values per frame, the product of the dimensions.
    pub count: usize,
    /// Bytes one frame of this channel occupies in the file, if fixed.
    pub sizeof_frame: Option<usize>,
    pub absent: Option<f64>,
    values: Vec<f64>,
    num_frames: usize,
}

impl FrameChannel {
    /// # Errors
    /// `Geometry` if there are no dimensions or any dimension is zero.
    pub fn new(
        ident: ObName,
        long_name: Vec<u8>,
        units: Vec<u8>,
        rep_code: u8,
        dimensions: Vec<usize>,
        value_size: Option<usize>,
        absent: Option<f64>,
    ) -> Result<Self> {
        if dimensions.is_empty() || dimensions.contains(&0) {
            return Err(WellLogError::Geometry(format!(
                "channel {} has dimensions {:?}, all must be > 0",
                ident, dimensions
            )));
        }
        let count = dimensions.iter().product();
        Ok(Self {
            ident,
            long_name,
            units,
            rep_code,
            dimensions,
            count,
            sizeof_frame: value_size.map(|s| s * count),
            absent,
            values: Vec::new(),
            num_frames: 0,
        })
    }

    /// Number of populated frames.
    pub fn len(&self) -> usize {
        self.num_frames
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames == 0
    }

    /// Size the storage for `num_frames`, reusing it if already that length.
    pub fn init_array(&mut self, num_frames: usize) {
        if self.num_frames != num_frames || self.values.len() != num_frames * self.count {
            self.values = vec![0.0; num_frames * self.count];
            self.num_frames = num_frames;
        }
    }

    /// All values, frame major.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The `count` values of one frame.
    ///
    /// # Errors
    /// `IndexOutOfRange` for a frame beyond those populated.
    pub fn frame(&self, frame: usize) -> Result<&[f64]> {
        if frame >= self.num_frames {
            return Err(WellLogError::index("frame", frame as i64, self.num_frames));
        }
        Ok(&self.values[frame * self.count..(frame + 1) * self.count])
    }

    pub fn get(&self, frame: usize, index: usize) -> Result<f64> {
        if index >= self.count {
            return Err(WellLogError::index("channel value", index as i64, self.count));
        }
        Ok(self.frame(frame)?[index])
    }

    pub(crate) fn set(&mut self, frame: usize, index: usize, value: f64) -> Result<()> {
        if frame >= self.num_frames {
            return Err(WellLogError::index("frame", frame as i64, self.num_frames));
        }
        if index >= self.count {
            return Err(WellLogError::index("channel value", index as i64, self.count));
        }
        self.values[frame * self.count + index] = value;
        Ok(())
    }

    /// True where a value equals the absent value.
    pub fn mask(&self) -> Vec<bool> {
        match self.absent {
            Some(a) => self.values.iter().map(|v| *v == a).collect(),
            None => vec![false; self.values.len()],
        }
    }

    pub fn summary(&self) -> Option<ArraySummary> {
        summarise(&self.values, self.absent)
    }

    /// Shape of the populated storage, `[frames, dimensions...]`.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = vec![self.num_frames];
        shape.extend(&self.dimensions);
        shape
    }
}

impl fmt::Display for FrameChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<FrameChannel: {:<4} \"{}\" units: '{}' count: {} dimensions: {:?} frames: {}>",
            display_text(&self.ident.ident),
            display_text(&self.long_name),
            display_text(&self.units),
            self.count,
            self.dimensions,
            self.num_frames
        )
    }
}

/// Channels recorded together, ordered as in the frame with the X axis first.
#[derive(Debug, Clone)]
pub struct FrameArray {
    pub ident: ObName,
    pub description: Vec<u8>,
    channels: Vec<FrameChannel>,
    channel_map: HashMap<ObName, usize>,
}

impl FrameArray {
    pub fn new(ident: ObName, description: Vec<u8>) -> Self {
        Self {
            ident,
            description,
            channels: Vec::new(),
            channel_map: HashMap::new(),
        }
    }

    /// # Errors
    /// `Geometry` if the channel identity is already present.
    pub fn append(&mut self, channel: FrameChannel) -> Result<()> {
        if self.channel_map.contains_key(&channel.ident) {
            return Err(WellLogError::Geometry(format!(
                "duplicate channel identity {} in frame {}",
                channel.ident, self.ident
            )));
        }
        self.channel_map.insert(channel.ident.clone(), self.channels.len());
        self.channels.push(channel);
        Ok(())
    }

    pub fn has(&self, ident: &ObName) -> bool {
        self.channel_map.contains_key(ident)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channels(&self) -> &[FrameChannel] {
        &self.channels
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [FrameChannel] {
        &mut self.channels
    }

    pub fn get(&self, index: usize) -> Result<&FrameChannel> {
        self.channels
            .get(index)
            .ok_or_else(|| WellLogError::index("channel", index as i64, self.channels.len()))
    }

    pub fn by_ident(&self, ident: &ObName) -> Option<&FrameChannel> {
        self.channel_map.get(ident).map(|&i| &self.channels[i])
    }

    /// First channel with this identifier regardless of origin and copy.
    pub fn by_name(&self, name: &[u8]) -> Option<&FrameChannel> {
        self.channels.iter().find(|c| c.ident.ident == name)
    }

    pub fn x_axis(&self) -> Result<&FrameChannel> {
        self.channels.first().ok_or_else(|| {
            WellLogError::Geometry(format!("frame {} has no channels, expected an X axis", self.ident))
        })
    }

    /// Bytes per frame in the file, `None` if any channel is variable length.
    pub fn sizeof_frame(&self) -> Option<usize> {
        self.channels.iter().map(|c| c.sizeof_frame).sum()
    }

    pub fn shape(&self) -> Vec<Vec<usize>> {
        self.channels.iter().map(|c| c.shape()).collect()
    }

    /// Size every channel for `num_frames` frames. Zero empties them all.
    pub fn init_arrays(&mut self, num_frames: usize) {
        for channel in &mut self.channels {
            channel.init_array(num_frames);
        }
    }

    /// Like [`init_arrays`](Self::init_arrays) but only for the X axis and the
    /// named channels, the rest are emptied. Unknown names are logged.
    pub fn init_arrays_partial(&mut self, num_frames: usize, channels: &HashSet<ObName>) {
        for ident in channels.iter().filter(|i| !self.channel_map.contains_key(*i)) {
            warn!("FrameArray {}: no channel {} to populate", self.ident, ident);
        }
        for (c, channel) in self.channels.iter_mut().enumerate() {
            if c == 0 || channels.contains(&channel.ident) {
                channel.init_array(num_frames);
            } else {
                channel.init_array(0);
            }
        }
    }
}

impl fmt::Display for FrameArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameArray: ID: {} {}", self.ident, display_text(&self.description))?;
        for channel in &self.channels {
            write!(f, "\n  {}", channel)?;
        }
        Ok(())
    }
}

/// Independent frame arrays of one log pass, keyed by frame identity.
#[derive(Debug, Clone, Default)]
pub struct FrameArraySet {
    arrays: Vec<FrameArray>,
    map: HashMap<ObName, usize>,
}

impl FrameArraySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, array: FrameArray) -> Result<()> {
        if self.map.contains_key(&array.ident) {
            return Err(WellLogError::Geometry(format!(
                "duplicate frame array identity {}",
                array.ident
            )));
        }
        self.map.insert(array.ident.clone(), self.arrays.len());
        self.arrays.push(array);
        Ok(())
    }

    pub fn has(&self, ident: &ObName) -> bool {
        self.map.contains_key(ident)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ObName> {
        self.arrays.iter().map(|a| &a.ident)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameArray> {
        self.arrays.iter()
    }

    pub fn get(&self, ident: &ObName) -> Option<&FrameArray> {
        self.map.get(ident).map(|&i| &self.arrays[i])
    }

    pub fn get_mut(&mut self, ident: &ObName) -> Option<&mut FrameArray> {
        match self.map.get(ident) {
            Some(&i) => Some(&mut self.arrays[i]),
            None => None,
        }
    }
}

impl fmt::Display for FrameArraySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogPass:")?;
        for array in &self.arrays {
            for line in array.to_string().lines() {
                write!(f, "\n  {}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str, dims: Vec<usize>) -> FrameChannel {
        FrameChannel::new(ObName::new(0, 0, name), vec![], vec![], 2, dims, Some(4), Some(-999.25))
            .unwrap()
    }

    #[test]
    fn channel_geometry() {
        let mut ch = channel("WAVE", vec![2, 3]);
        assert_eq!(ch.count, 6);
        assert_eq!(ch.sizeof_frame, Some(24));
        ch.init_array(2);
        ch.set(1, 5, -999.25).unwrap();
        assert_eq!(ch.shape(), vec![2, 2, 3]);
        assert_eq!(ch.get(1, 5).unwrap(), -999.25);
        assert!(ch.mask()[11]);
        assert!(matches!(ch.frame(2), Err(WellLogError::IndexOutOfRange { .. })));
        assert!(FrameChannel::new(ObName::new(0, 0, "X"), vec![], vec![], 2, vec![0], None, None).is_err());
    }

    #[test]
    fn array_frame_size_and_duplicates() {
        let mut array = FrameArray::new(ObName::new(2, 0, "50"), vec![]);
        array.append(channel("DEPT", vec![1])).unwrap();
        array.append(channel("GR", vec![1])).unwrap();
        assert!(array.append(channel("GR", vec![1])).is_err());
        assert_eq!(array.sizeof_frame(), Some(8));
        assert_eq!(array.x_axis().unwrap().ident.ident, b"DEPT");
        let only_x = HashSet::new();
        array.init_arrays_partial(3, &only_x);
        assert_eq!(array.get(0).unwrap().len(), 3);
        assert_eq!(array.get(1).unwrap().len(), 0);
        array.init_arrays(0);
        assert_eq!(array.shape(), vec![vec![0, 1], vec![0, 1]]);
    }

    #[test]
    fn partial_init_skips_unknown_channels() {
        let mut array = FrameArray::new(ObName::new(2, 0, "50"), vec![]);
        array.append(channel("DEPT", vec![1])).unwrap();
        array.append(channel("GR", vec![1])).unwrap();
        let wanted: HashSet<ObName> = [ObName::new(0, 0, "GR"), ObName::new(0, 0, "GRX")].into_iter().collect();
        array.init_arrays_partial(2, &wanted);
        assert_eq!(array.shape(), vec![vec![2, 1], vec![2, 1]]);
    }
}
