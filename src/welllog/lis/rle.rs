//! Run length encoding of regular sequences.
//!
//! A log pass has thousands of type 0/1 records, almost always of the same
//! length at a fixed stride in the file. [`RleType01`] stores them as runs of
//! `(first position, stride, repeat)` with the X axis value of each record's
//! first frame held the same way.

use std::ops::{Add, Mul, Sub};

use crate::welllog::types::error::{Result, WellLogError};

pub trait RleValue: Copy + PartialEq + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> + From<u32> {}

impl<T> RleValue for T where T: Copy + PartialEq + Add<Output = T> + Sub<Output = T> + Mul<Output = T> + From<u32> {}

fn times<T: RleValue>(count: usize) -> T {
    T::from(count as u32)
}

/// One run: `datum, datum + stride, ... datum + repeat * stride`.
#[derive(Debug, Clone, PartialEq)]
pub struct RleItem<T> {
    datum: T,
    stride: Option<T>,
    repeat: usize,
}

impl<T: RleValue> RleItem<T> {
    pub fn new(datum: T) -> Self {
        Self {
            datum,
            stride: None,
            repeat: 0,
        }
    }

    pub fn datum(&self) -> T {
        self.datum
    }

    /// `None` while there is a single value.
    pub fn stride(&self) -> Option<T> {
        self.stride
    }

    pub fn repeat(&self) -> usize {
        self.repeat
    }

    pub fn num_values(&self) -> usize {
        self.repeat + 1
    }

    /// Absorb `value` if it continues the run.
    pub fn add(&mut self, value: T) -> bool {
        match self.stride {
            None => {
                self.stride = Some(value - self.datum);
                self.repeat = 1;
                true
            }
            Some(stride) if value == self.datum + stride * times(self.repeat + 1) => {
                self.repeat += 1;
                true
            }
            Some(_) => false,
        }
    }

    pub fn value(&self, index: usize) -> Option<T> {
        if index > self.repeat {
            return None;
        }
        Some(match self.stride {
            None => self.datum,
            Some(stride) => self.datum + stride * times(index),
        })
    }

    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        (0..=self.repeat).filter_map(|i| self.value(i))
    }

    pub fn first(&self) -> T {
        self.datum
    }

    pub fn last(&self) -> T {
        match self.stride {
            None => self.datum,
            Some(stride) => self.datum + stride * times(self.repeat),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rle<T> {
    items: Vec<RleItem<T>>,
}

impl<T: RleValue> Rle<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn add(&mut self, value: T) {
        if !self.items.last_mut().is_some_and(|item| item.add(value)) {
            self.items.push(RleItem::new(value));
        }
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[RleItem<T>] {
        &self.items
    }

    pub fn num_values(&self) -> usize {
        self.items.iter().map(RleItem::num_values).sum()
    }

    /// The `index`th value added.
    pub fn value(&self, mut index: usize) -> Option<T> {
        for item in &self.items {
            if index < item.num_values() {
                return item.value(index);
            }
            index -= item.num_values();
        }
        None
    }

    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        self.items.iter().flat_map(|item| item.values())
    }

    pub fn first(&self) -> Option<T> {
        self.items.first().map(RleItem::first)
    }

    pub fn last(&self) -> Option<T> {
        self.items.last().map(RleItem::last)
    }
}

/// A run of type 0/1 records with the same number of frames at a fixed
/// stride in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct RleItemType01 {
    positions: RleItem<i64>,
    num_frames: usize,
    x_axis: Rle<f64>,
}

impl RleItemType01 {
    fn new(position: u64, num_frames: usize, x_axis: f64) -> Self {
        let mut axis = Rle::new();
        axis.add(x_axis);
        Self {
            positions: RleItem::new(position as i64),
            num_frames,
            x_axis: axis,
        }
    }

    fn add(&mut self, position: u64, num_frames: usize, x_axis: f64) -> bool {
        if num_frames != self.num_frames || !self.positions.add(position as i64) {
            return false;
        }
        self.x_axis.add(x_axis);
        true
    }

    /// Frames in each record of this run.
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_records(&self) -> usize {
        self.positions.num_values()
    }

    pub fn total_frames(&self) -> usize {
        self.num_frames * self.num_records()
    }

    pub fn position(&self, record: usize) -> Option<u64> {
        self.positions.value(record).map(|p| p as u64)
    }

    pub fn x_axis(&self, record: usize) -> Option<f64> {
        self.x_axis.value(record)
    }

    pub fn x_axis_first(&self) -> Option<f64> {
        self.x_axis.first()
    }

    /// X axis of the first frame of the last record.
    pub fn x_axis_last(&self) -> Option<f64> {
        self.x_axis.last()
    }

    /// `(position, frame within record)` or the frame number carried into
    /// the next run.
    fn tell_lr_for_frame(&self, frame: usize) -> std::result::Result<(u64, usize), usize> {
        let total = self.total_frames();
        if frame < total {
            if let Some(position) = self.position(frame / self.num_frames) {
                return Ok((position, frame % self.num_frames));
            }
        }
        Err(frame.saturating_sub(total))
    }
}

/// Positions of the type 0/1 records of a log pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RleType01 {
    x_units: Vec<u8>,
    items: Vec<RleItemType01>,
}

impl RleType01 {
    pub fn new(x_units: &[u8]) -> Self {
        Self {
            x_units: x_units.to_vec(),
            items: Vec::new(),
        }
    }

    pub fn x_axis_units(&self) -> &[u8] {
        &self.x_units
    }

    pub fn has_x_axis_data(&self) -> bool {
        !self.items.is_empty()
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[RleItemType01] {
        &self.items
    }

    /// Record a type 0/1 record at `position` holding `num_frames` frames,
    /// the first at X axis value `x_axis`.
    pub fn add(&mut self, position: u64, num_frames: usize, x_axis: f64) {
        if !self
            .items
            .last_mut()
            .is_some_and(|item| item.add(position, num_frames, x_axis))
        {
            self.items.push(RleItemType01::new(position, num_frames, x_axis));
        }
    }

    pub fn num_records(&self) -> usize {
        self.items.iter().map(RleItemType01::num_records).sum()
    }

    pub fn total_frames(&self) -> usize {
        self.items.iter().map(RleItemType01::total_frames).sum()
    }

    /// The position of the record holding `frame` and the frame's index in
    /// that record.
    ///
    /// # Errors
    /// `IndexOutOfRange` beyond the last frame.
    pub fn tell_lr_for_frame(&self, frame: usize) -> Result<(u64, usize)> {
        let mut remaining = frame;
        for item in &self.items {
            match item.tell_lr_for_frame(remaining) {
                Ok(found) => return Ok(found),
                Err(rest) => remaining = rest,
            }
        }
        Err(WellLogError::index("frame", frame as i64, self.total_frames()))
    }

    pub fn x_axis_first(&self) -> Option<f64> {
        self.items.first().and_then(RleItemType01::x_axis_first)
    }

    /// X axis of the first frame of the last record.
    pub fn x_axis_last(&self) -> Option<f64> {
        self.items.last().and_then(RleItemType01::x_axis_last)
    }

    /// X axis of the last frame, extrapolated from the last record.
    ///
    /// # Errors
    /// `NullSpacing` if the last record has several frames and the spacing
    /// can not be determined.
    pub fn x_axis_last_frame(&self) -> Result<Option<f64>> {
        let (Some(last), Some(item)) = (self.x_axis_last(), self.items.last()) else {
            return Ok(None);
        };
        if item.num_frames <= 1 {
            return Ok(Some(last));
        }
        let spacing = self.frame_spacing()?.unwrap_or(0.0);
        Ok(Some(last + (item.num_frames - 1) as f64 * spacing))
    }

    /// Spacing between frames from the first and last records, negative for
    /// a decreasing X axis. `None` with no records, 0 for a single frame.
    ///
    /// # Errors
    /// `NullSpacing` if all the frames are in one record.
    pub fn frame_spacing(&self) -> Result<Option<f64>> {
        let (Some(first), Some(last), Some(item)) = (self.x_axis_first(), self.x_axis_last(), self.items.last()) else {
            return Ok(None);
        };
        let total = self.total_frames();
        if total <= 1 {
            return Ok(Some(0.0));
        }
        let span = total - item.num_frames;
        if span == 0 {
            return Err(WellLogError::NullSpacing(format!(
                "{} frames all in one record at 0x{:x}",
                total,
                item.position(0).unwrap_or(0)
            )));
        }
        Ok(Some((last - first) / span as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_of_integers() {
        let mut rle = Rle::new();
        for v in [1i64, 3, 5, 7, 8, 9, 20] {
            rle.add(v);
        }
        assert_eq!(rle.len(), 3);
        assert_eq!(rle.num_values(), 7);
        assert_eq!(rle.items()[0].stride(), Some(2));
        assert_eq!(rle.items()[0].repeat(), 3);
        assert_eq!(rle.items()[2].stride(), None);
        assert_eq!(rle.values().collect::<Vec<_>>(), vec![1, 3, 5, 7, 8, 9, 20]);
        assert_eq!(rle.value(4), Some(8));
        assert_eq!(rle.value(6), Some(20));
        assert_eq!(rle.value(7), None);
        assert_eq!(rle.first(), Some(1));
        assert_eq!(rle.last(), Some(20));
    }

    #[test]
    fn empty() {
        let rle: Rle<f64> = Rle::new();
        assert!(rle.is_empty());
        assert_eq!(rle.first(), None);
        let rle = RleType01::new(b"FEET");
        assert_eq!(rle.total_frames(), 0);
        assert_eq!(rle.frame_spacing().unwrap(), None);
        assert_eq!(rle.x_axis_last_frame().unwrap(), None);
        assert!(rle.tell_lr_for_frame(0).is_err());
    }

    fn type01() -> RleType01 {
        // 10 frames of 0.5 spacing per record, records 1024 bytes apart, then
        // a short record.
        let mut rle = RleType01::new(b"FEET");
        for i in 0..4u64 {
            rle.add(80 + 1024 * i, 10, 1000.0 + 5.0 * i as f64);
        }
        rle.add(80 + 1024 * 4, 3, 1020.0);
        rle
    }

    #[test]
    fn type01_positions() {
        let rle = type01();
        assert_eq!(rle.len(), 2);
        assert_eq!(rle.num_records(), 5);
        assert_eq!(rle.total_frames(), 43);
        assert_eq!(rle.tell_lr_for_frame(0).unwrap(), (80, 0));
        assert_eq!(rle.tell_lr_for_frame(9).unwrap(), (80, 9));
        assert_eq!(rle.tell_lr_for_frame(10).unwrap(), (1104, 0));
        assert_eq!(rle.tell_lr_for_frame(39).unwrap(), (80 + 3 * 1024, 9));
        assert_eq!(rle.tell_lr_for_frame(40).unwrap(), (80 + 4 * 1024, 0));
        assert_eq!(rle.tell_lr_for_frame(42).unwrap(), (80 + 4 * 1024, 2));
        assert!(matches!(
            rle.tell_lr_for_frame(43),
            Err(WellLogError::IndexOutOfRange { index: 43, len: 43, .. })
        ));
    }

    #[test]
    fn type01_x_axis() {
        let rle = type01();
        assert_eq!(rle.x_axis_first(), Some(1000.0));
        assert_eq!(rle.x_axis_last(), Some(1020.0));
        assert_eq!(rle.frame_spacing().unwrap(), Some(0.5));
        assert_eq!(rle.x_axis_last_frame().unwrap(), Some(1021.0));
        assert_eq!(rle.items()[0].x_axis(3), Some(1015.0));
    }

    #[test]
    fn spacing_needs_two_records() {
        let mut rle = RleType01::new(b".1IN");
        rle.add(0, 1, 100.0);
        assert_eq!(rle.frame_spacing().unwrap(), Some(0.0));
        assert_eq!(rle.x_axis_last_frame().unwrap(), Some(100.0));

        let mut rle = RleType01::new(b".1IN");
        rle.add(0, 5, 100.0);
        assert!(matches!(rle.frame_spacing(), Err(WellLogError::NullSpacing(_))));
        assert!(rle.x_axis_last_frame().is_err());
    }
}
