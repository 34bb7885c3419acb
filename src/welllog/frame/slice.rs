//! Frame selection: [`Slice`] has the semantics of a `start:stop:step` slice
//! over `0..length`, [`Sample`] picks at most N roughly evenly spaced frames.

use std::fmt;

use crate::welllog::types::error::{Result, WellLogError};

/// A `start:stop:step` slice. Negative `start`/`stop` count from the end and
/// out of range bounds are clamped, exactly as a slice of a sequence would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slice {
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
}

impl Slice {
    /// # Errors
    /// `InvalidFormat` if `step` is zero.
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Result<Self> {
        if step == Some(0) {
            return Err(WellLogError::InvalidFormat("slice step can not be zero".into()));
        }
        Ok(Self { start, stop, step })
    }

    /// Every frame, `::`.
    pub fn all() -> Self {
        Self::default()
    }

    /// Resolve against a sequence length into concrete `(start, stop, step)`.
    pub fn resolve(&self, length: usize) -> (i64, i64, i64) {
        let length = length as i64;
        let step = self.step.unwrap_or(1);
        let (lower, upper) = if step < 0 {
            (-1, length - 1)
        } else {
            (0, length)
        };
        let clamp = |value: Option<i64>, default: i64| match value {
            None => default,
            Some(mut v) => {
                if v < 0 {
                    v += length;
                }
                v.clamp(lower, upper)
            }
        };
        let start = clamp(self.start, if step < 0 { upper } else { lower });
        let stop = clamp(self.stop, if step < 0 { lower } else { upper });
        (start, stop, step)
    }

    pub fn first(&self, length: usize) -> Option<usize> {
        self.gen_indices(length).next()
    }

    pub fn last(&self, length: usize) -> Option<usize> {
        let (start, _, step) = self.resolve(length);
        let count = self.count(length) as i64;
        (count > 0).then(|| (start + (count - 1) * step) as usize)
    }

    pub fn step(&self, length: usize) -> i64 {
        self.resolve(length).2
    }

    pub fn count(&self, length: usize) -> usize {
        let (start, stop, step) = self.resolve(length);
        let n = if step > 0 {
            (stop - start + step - 1) / step
        } else {
            (start - stop - step - 1) / -step
        };
        n.max(0) as usize
    }

    pub fn gen_indices(&self, length: usize) -> impl Iterator<Item = usize> {
        let (start, _, step) = self.resolve(length);
        let count = self.count(length) as i64;
        (0..count).map(move |i| (start + i * step) as usize)
    }

    pub fn indices(&self, length: usize) -> Vec<usize> {
        self.gen_indices(length).collect()
    }

    pub fn long_str(&self, length: usize) -> String {
        let (start, stop, step) = self.resolve(length);
        format!("<Slice on length={} start={} stop={} step={}>", length, start, stop, step)
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |v: Option<i64>| v.map_or("None".to_string(), |v| v.to_string());
        write!(
            f,
            "<Slice.slice({}, {}, {})>",
            part(self.start),
            part(self.stop),
            part(self.step)
        )
    }
}

/// At most `size` indices spread over the sequence, starting at zero.
///
/// Not necessarily regular: 7 out of 12 gives `[0, 1, 3, 5, 6, 8, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    size: usize,
}

impl Sample {
    /// # Errors
    /// `InvalidFormat` if `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        if size < 1 {
            return Err(WellLogError::InvalidFormat(format!(
                "a sample must be >= 1 not {}",
                size
            )));
        }
        Ok(Self { size })
    }

    pub fn first(&self, length: usize) -> Option<usize> {
        (length > 0).then_some(0)
    }

    pub fn last(&self, length: usize) -> Option<usize> {
        self.indices(length).last().copied()
    }

    pub fn step(&self, length: usize) -> i64 {
        if self.size >= length {
            1
        } else {
            (length / self.size) as i64
        }
    }

    pub fn count(&self, length: usize) -> usize {
        length.min(self.size)
    }

    pub fn gen_indices(&self, length: usize) -> impl Iterator<Item = usize> {
        let size = self.size;
        let (int_incr, rem_incr) = if size >= length {
            (1, 0)
        } else {
            (length / size, length % size)
        };
        let mut index = 0usize;
        let mut remainder = 0usize;
        std::iter::from_fn(move || {
            if index >= length {
                return None;
            }
            let current = index;
            remainder += rem_incr;
            index += int_incr + remainder / size;
            remainder %= size;
            Some(current)
        })
    }

    pub fn indices(&self, length: usize) -> Vec<usize> {
        self.gen_indices(length).collect()
    }

    pub fn long_str(&self, length: usize) -> String {
        format!("<Sample {} out of {}>", self.size.min(length), length)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Sample fraction: {}>", self.size)
    }
}

/// Either way of selecting frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSlice {
    Slice(Slice),
    Sample(Sample),
}

impl Default for FrameSlice {
    fn default() -> Self {
        FrameSlice::Slice(Slice::all())
    }
}

impl FrameSlice {
    pub fn first(&self, length: usize) -> Option<usize> {
        match self {
            FrameSlice::Slice(s) => s.first(length),
            FrameSlice::Sample(s) => s.first(length),
        }
    }

    pub fn last(&self, length: usize) -> Option<usize> {
        match self {
            FrameSlice::Slice(s) => s.last(length),
            FrameSlice::Sample(s) => s.last(length),
        }
    }

    pub fn step(&self, length: usize) -> i64 {
        match self {
            FrameSlice::Slice(s) => s.step(length),
            FrameSlice::Sample(s) => s.step(length),
        }
    }

    pub fn count(&self, length: usize) -> usize {
        match self {
            FrameSlice::Slice(s) => s.count(length),
            FrameSlice::Sample(s) => s.count(length),
        }
    }

    /// Selected indices in selection order.
    pub fn indices(&self, length: usize) -> Vec<usize> {
        match self {
            FrameSlice::Slice(s) => s.indices(length),
            FrameSlice::Sample(s) => s.indices(length),
        }
    }

    pub fn long_str(&self, length: usize) -> String {
        match self {
            FrameSlice::Slice(s) => s.long_str(length),
            FrameSlice::Sample(s) => s.long_str(length),
        }
    }
}

impl fmt::Display for FrameSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSlice::Slice(s) => fmt::Display::fmt(s, f),
            FrameSlice::Sample(s) => fmt::Display::fmt(s, f),
        }
    }
}

impl From<Slice> for FrameSlice {
    fn from(s: Slice) -> Self {
        FrameSlice::Slice(s)
    }
}

impl From<Sample> for FrameSlice {
    fn from(s: Sample) -> Self {
        FrameSlice::Sample(s)
    }
}

/// Parse `"start,stop,step"` (parts may be empty or `None`) into a [`Slice`],
/// anything without a comma as a [`Sample`] size.
///
/// # Errors
/// `InvalidFormat` for a wrong number of parts or non-integer parts.
pub fn create_slice_or_sample(text: &str) -> Result<FrameSlice> {
    let bad = |t: &str| WellLogError::InvalidFormat(format!("can not parse \"{}\" as a slice", t));
    if text.contains(',') {
        let parts = text
            .split(',')
            .map(|p| match p.trim() {
                "" | "None" => Ok(None),
                other => other.parse::<i64>().map(Some).map_err(|_| bad(text)),
            })
            .collect::<Result<Vec<_>>>()?;
        if parts.len() != 3 {
            return Err(WellLogError::InvalidFormat(format!(
                "wrong number of parts for a slice in \"{}\"",
                text
            )));
        }
        Ok(Slice::new(parts[0], parts[1], parts[2])?.into())
    } else {
        let size = text.trim().parse::<usize>().map_err(|_| bad(text))?;
        Ok(Sample::new(size)?.into())
    }
}
