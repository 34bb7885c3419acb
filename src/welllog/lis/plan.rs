//! Byte offsets of every channel of every frame in a type 0/1 record, and
//! the read/skip plan that pulls a selection of frames and channels out of
//! one record without touching anything else.
//!
//! All offsets are relative to the end of the two byte record header.
//!
//! ```text
//! | indirect X | frame 0: ch0 ch1 ... chN | frame 1: ch0 ch1 ... chN | ...
//!   (optional)   |<-- skip_to_ch_start -->|<- skip_to_frame_end ->|
//! ```

use std::fmt;

use super::dfsr::Dfsr;
use crate::welllog::codec::lis as rc;
use crate::welllog::types::error::{Result, WellLogError};

/// One step of the plan for reading frames out of a record.
///
/// Frame numbers are frame numbers within the record. For `Skip` and
/// `Extrapolate` they name the frame being moved to. Channel ranges are
/// inclusive DSB indices; a `Read` with `ch_from == None` is prefixed by the
/// indirect X value and covers channels `0..=ch_to` after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Position the reader at the record starting at this file offset.
    SeekLr(u64),
    Read {
        size: usize,
        frame: Option<usize>,
        ch_from: Option<usize>,
        ch_to: Option<usize>,
    },
    Skip {
        size: usize,
        frame: usize,
        ch_from: Option<usize>,
        ch_to: Option<usize>,
    },
    /// Project the indirect X axis forward by `frames` frames.
    Extrapolate { frames: usize, frame: usize },
}

/// A run of contiguous channels that are all read or all skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    read: bool,
    size: usize,
    ch_from: Option<usize>,
    ch_to: Option<usize>,
}

impl Run {
    fn skip(size: usize, ch_from: Option<usize>, ch_to: Option<usize>) -> Self {
        Self {
            read: false,
            size,
            ch_from,
            ch_to,
        }
    }

    fn at(&self, frame: usize) -> Event {
        if self.read {
            Event::Read {
                size: self.size,
                frame: Some(frame),
                ch_from: self.ch_from,
                ch_to: self.ch_to,
            }
        } else {
            Event::Skip {
                size: self.size,
                frame,
                ch_from: self.ch_from,
                ch_to: self.ch_to,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSetPlan {
    indirect_size: usize,
    channel_sizes: Vec<usize>,
    frame_size: usize,
    skip_to_ch_start: Vec<usize>,
    skip_to_frame_end: Vec<usize>,
}

impl FrameSetPlan {
    /// # Errors
    /// `UnsupportedRepCode` if the record is indirect and its depth
    /// representation code is unknown.
    pub fn new(dfsr: &Dfsr) -> Result<Self> {
        let indirect_size = if dfsr.ebs.is_indirect_x() {
            rc::lis_size(dfsr.ebs.depth_rep_code())?
        } else {
            0
        };
        let channel_sizes: Vec<usize> = dfsr.dsbs.iter().map(|d| d.byte_size()).collect();
        let frame_size: usize = channel_sizes.iter().sum();
        let mut skip_to_ch_start = Vec::with_capacity(channel_sizes.len());
        let mut skip_to_frame_end = Vec::with_capacity(channel_sizes.len());
        let mut from_start = 0;
        for size in &channel_sizes {
            skip_to_ch_start.push(from_start);
            from_start += size;
            skip_to_frame_end.push(frame_size - from_start);
        }
        Ok(Self {
            indirect_size,
            channel_sizes,
            frame_size,
            skip_to_ch_start,
            skip_to_frame_end,
        })
    }

    /// Bytes of the indirect X value, zero for a direct X axis.
    pub fn indirect_size(&self) -> usize {
        self.indirect_size
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn num_channels(&self) -> usize {
        self.channel_sizes.len()
    }

    pub fn channel_size(&self, ch: usize) -> Result<usize> {
        self.channel_sizes
            .get(ch)
            .copied()
            .ok_or_else(|| WellLogError::index("channel", ch as i64, self.num_channels()))
    }

    /// Frames in a record whose logical data, header excluded, is `rec_len`
    /// bytes.
    ///
    /// # Errors
    /// `FrameSizeMismatch` if the frames do not fit exactly, `Geometry` if
    /// there is no room for the indirect X value.
    pub fn num_frames(&self, rec_len: usize) -> Result<usize> {
        if self.frame_size == 0 {
            return Err(WellLogError::Geometry("frame size is zero".into()));
        }
        let len = rec_len.checked_sub(self.indirect_size).ok_or_else(|| {
            WellLogError::Geometry(format!(
                "record length {} shorter than the indirect X value of {} bytes",
                rec_len, self.indirect_size
            ))
        })?;
        if len % self.frame_size != 0 {
            return Err(WellLogError::FrameSizeMismatch {
                declared: len,
                computed: len - len % self.frame_size,
            });
        }
        Ok(len / self.frame_size)
    }

    /// Offset of the start of channel `ch` in frame `frame`.
    pub fn ch_offset(&self, frame: usize, ch: usize) -> Result<usize> {
        let start = self
            .skip_to_ch_start
            .get(ch)
            .ok_or_else(|| WellLogError::index("channel", ch as i64, self.num_channels()))?;
        Ok(self.indirect_size + start + frame * self.frame_size)
    }

    /// Bytes from the end of channel `ch` to the end of its frame.
    pub fn skip_to_end_of_frame(&self, ch: usize) -> Result<usize> {
        self.skip_to_frame_end
            .get(ch)
            .copied()
            .ok_or_else(|| WellLogError::index("channel", ch as i64, self.num_channels()))
    }

    /// Sorted, unique, range checked channel indices.
    fn check_ch_idx(&self, channels: &[usize]) -> Result<Vec<usize>> {
        let mut sorted = channels.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&last) = sorted.last() {
            if last >= self.num_channels() {
                return Err(WellLogError::index("channel", last as i64, self.num_channels()));
            }
        }
        Ok(sorted)
    }

    /// The skip before the first wanted channel, the runs within a frame
    /// (always starting and ending with a read) and the skip after the last
    /// wanted channel.
    fn frame_runs(&self, channels: &[usize]) -> (Option<Run>, Vec<Run>, Option<Run>) {
        let first = channels[0];
        let last = channels[channels.len() - 1];
        let pre = (first > 0).then(|| Run::skip(self.skip_to_ch_start[first], Some(0), Some(first - 1)));
        let mut runs = Vec::new();
        let mut ch_start = first;
        let mut ch_stop = first;
        let mut size = self.channel_sizes[first];
        for &ch in &channels[1..] {
            if ch == ch_stop + 1 {
                size += self.channel_sizes[ch];
                ch_stop = ch;
                continue;
            }
            runs.push(Run {
                read: true,
                size,
                ch_from: Some(ch_start),
                ch_to: Some(ch_stop),
            });
            runs.push(Run::skip(
                self.skip_to_ch_start[ch] - self.skip_to_ch_start[ch_stop + 1],
                Some(ch_stop + 1),
                Some(ch - 1),
            ));
            ch_start = ch;
            ch_stop = ch;
            size = self.channel_sizes[ch];
        }
        runs.push(Run {
            read: true,
            size,
            ch_from: Some(ch_start),
            ch_to: Some(ch_stop),
        });
        let to_end = self.skip_to_frame_end[last];
        let post = (to_end > 0).then(|| Run::skip(to_end, Some(last + 1), Some(self.num_channels() - 1)));
        (pre, runs, post)
    }

    /// The skip between the last wanted channel of one frame and the first
    /// of the next selected frame.
    fn inter_frame(&self, pre: Option<Run>, post: Option<Run>, step: usize) -> Option<Run> {
        let size = (step - 1) * self.frame_size
            + post.map_or(0, |p| p.size)
            + pre.map_or(0, |p| p.size);
        match (post, pre) {
            (Some(post), Some(pre)) => Some(Run::skip(size, post.ch_from, pre.ch_to)),
            (Some(post), None) => Some(Run::skip(size, post.ch_from, post.ch_to)),
            (None, Some(pre)) => Some(Run::skip(size, pre.ch_from, pre.ch_to)),
            (None, None) => (size > 0).then(|| Run::skip(size, None, None)),
        }
    }

    /// Events that read frames `start..stop` by `step` of `channels` from a
    /// record positioned just after its header. No `SeekLr` events are
    /// generated.
    ///
    /// # Errors
    /// `InvalidFormat` for a step of zero, `IndexOutOfRange` for a channel
    /// that does not exist.
    pub fn gen_events(&self, start: usize, stop: usize, step: usize, channels: &[usize]) -> Result<Vec<Event>> {
        if step < 1 {
            return Err(WellLogError::InvalidFormat("frame step must be at least 1".into()));
        }
        let channels = self.check_ch_idx(channels)?;
        let mut events = Vec::new();
        if channels.is_empty() || stop <= start {
            return Ok(events);
        }
        let (pre, runs, post) = self.frame_runs(&channels);
        let inter = self.inter_frame(pre, post, step);
        let indirect = self.indirect_size > 0;
        let indirect_read = Event::Read {
            size: self.indirect_size,
            frame: None,
            ch_from: None,
            ch_to: None,
        };
        let mut indirect_pending = indirect;
        if indirect_pending && pre.is_some() {
            events.push(indirect_read);
            indirect_pending = false;
            if start > 0 {
                events.push(Event::Extrapolate { frames: start, frame: start });
            }
        }
        if let Some(pre) = pre {
            events.push(Event::Skip {
                size: start * self.frame_size + pre.size,
                frame: start,
                ch_from: pre.ch_from,
                ch_to: pre.ch_to,
            });
        } else if start > 0 {
            if indirect_pending {
                events.push(indirect_read);
                indirect_pending = false;
            }
            events.push(Event::Skip {
                size: start * self.frame_size,
                frame: start,
                ch_from: None,
                ch_to: None,
            });
            if indirect {
                events.push(Event::Extrapolate { frames: start, frame: start });
            }
        }
        let mut frame = start;
        loop {
            for run in &runs {
                if indirect_pending {
                    // Only reached for frame 0 starting with channel 0.
                    events.push(Event::Read {
                        size: self.indirect_size + run.size,
                        frame: Some(frame),
                        ch_from: None,
                        ch_to: run.ch_to,
                    });
                    indirect_pending = false;
                } else {
                    events.push(run.at(frame));
                }
            }
            frame += step;
            if frame >= stop {
                if let Some(post) = post {
                    events.push(post.at(frame - step));
                }
                break;
            }
            if let Some(inter) = inter {
                events.push(inter.at(frame));
            }
            if indirect {
                events.push(Event::Extrapolate { frames: step, frame });
            }
        }
        Ok(events)
    }
}

impl fmt::Display for FrameSetPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FrameSetPlan: indirect={} frame length={} channels={}",
            self.indirect_size,
            self.frame_size,
            self.num_channels()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::welllog::lis::dfsr::{
        DatumSpecBlock, EntryBlock, EntryBlockSet, EB_TYPE_DEPTH_REP_CODE, EB_TYPE_RECORD_MODE,
    };
    use crate::welllog::types::models::Value;

    /// Channels of 4, 8, 2, 16 and 2 bytes, a 32 byte frame.
    fn dfsr(indirect: bool) -> Dfsr {
        let mut ebs = EntryBlockSet::new();
        if indirect {
            ebs.set(EntryBlock::new(EB_TYPE_RECORD_MODE, rc::RC_66, Some(Value::Int(1))).unwrap())
                .unwrap();
            ebs.set(EntryBlock::new(EB_TYPE_DEPTH_REP_CODE, rc::RC_66, Some(Value::Int(73))).unwrap())
                .unwrap();
        }
        let dsbs = vec![
            DatumSpecBlock::new(b"DEPT", b"FEET", rc::RC_68, 1, 1).unwrap(),
            DatumSpecBlock::new(b"GR  ", b"GAPI", rc::RC_68, 2, 1).unwrap(),
            DatumSpecBlock::new(b"FLAG", b"    ", rc::RC_79, 1, 1).unwrap(),
            DatumSpecBlock::new(b"WAVE", b"    ", rc::RC_68, 4, 1).unwrap(),
            DatumSpecBlock::new(b"STAT", b"    ", rc::RC_79, 1, 1).unwrap(),
        ];
        Dfsr::new(ebs, dsbs)
    }

    fn read(size: usize, frame: usize, from: usize, to: usize) -> Event {
        Event::Read {
            size,
            frame: Some(frame),
            ch_from: Some(from),
            ch_to: Some(to),
        }
    }

    fn skip(size: usize, frame: usize, from: Option<usize>, to: Option<usize>) -> Event {
        Event::Skip {
            size,
            frame,
            ch_from: from,
            ch_to: to,
        }
    }

    fn extrapolate(frames: usize, frame: usize) -> Event {
        Event::Extrapolate { frames, frame }
    }

    const INDIRECT_READ: Event = Event::Read {
        size: 4,
        frame: None,
        ch_from: None,
        ch_to: None,
    };

    #[test]
    fn offsets_and_frame_counts() {
        let plan = FrameSetPlan::new(&dfsr(false)).unwrap();
        assert_eq!(plan.frame_size(), 32);
        assert_eq!(plan.num_frames(32 * 7).unwrap(), 7);
        assert!(matches!(
            plan.num_frames(33),
            Err(WellLogError::FrameSizeMismatch { declared: 33, computed: 32 })
        ));
        assert_eq!(plan.ch_offset(0, 2).unwrap(), 12);
        assert_eq!(plan.ch_offset(3, 4).unwrap(), 3 * 32 + 30);
        assert_eq!(plan.skip_to_end_of_frame(1).unwrap(), 20);
        assert!(plan.ch_offset(0, 5).is_err());

        let plan = FrameSetPlan::new(&dfsr(true)).unwrap();
        assert_eq!(plan.indirect_size(), 4);
        assert_eq!(plan.num_frames(4 + 32 * 3).unwrap(), 3);
        assert_eq!(plan.ch_offset(1, 1).unwrap(), 4 + 32 + 4);
        assert!(plan.num_frames(2).is_err());
    }

    #[test]
    fn single_channel_every_frame() {
        let plan = FrameSetPlan::new(&dfsr(false)).unwrap();
        let events = plan.gen_events(0, 4, 1, &[0]).unwrap();
        assert_eq!(
            events,
            vec![
                read(4, 0, 0, 0),
                skip(28, 1, Some(1), Some(4)),
                read(4, 1, 0, 0),
                skip(28, 2, Some(1), Some(4)),
                read(4, 2, 0, 0),
                skip(28, 3, Some(1), Some(4)),
                read(4, 3, 0, 0),
                skip(28, 3, Some(1), Some(4)),
            ]
        );
        let events = plan.gen_events(0, 4, 1, &[4, 0, 2, 1, 3]).unwrap();
        assert_eq!(events, (0..4).map(|f| read(32, f, 0, 4)).collect::<Vec<_>>());
    }

    #[test]
    fn strided_frames() {
        let plan = FrameSetPlan::new(&dfsr(false)).unwrap();
        assert_eq!(
            plan.gen_events(3, 7, 2, &[2]).unwrap(),
            vec![
                skip(108, 3, Some(0), Some(1)),
                read(2, 3, 2, 2),
                skip(62, 5, Some(3), Some(1)),
                read(2, 5, 2, 2),
                skip(18, 5, Some(3), Some(4)),
            ]
        );
        assert_eq!(
            plan.gen_events(3, 7, 2, &[0]).unwrap(),
            vec![
                skip(96, 3, None, None),
                read(4, 3, 0, 0),
                skip(60, 5, Some(1), Some(4)),
                read(4, 5, 0, 0),
                skip(28, 5, Some(1), Some(4)),
            ]
        );
    }

    #[test]
    fn indirect_x_merged_into_first_read() {
        let plan = FrameSetPlan::new(&dfsr(true)).unwrap();
        assert_eq!(
            plan.gen_events(0, 3, 1, &[0, 1, 2, 3, 4]).unwrap(),
            vec![
                Event::Read {
                    size: 36,
                    frame: Some(0),
                    ch_from: None,
                    ch_to: Some(4),
                },
                extrapolate(1, 1),
                read(32, 1, 0, 4),
                extrapolate(1, 2),
                read(32, 2, 0, 4),
            ]
        );
    }

    #[test]
    fn indirect_x_with_leading_skip() {
        let plan = FrameSetPlan::new(&dfsr(true)).unwrap();
        assert_eq!(
            plan.gen_events(2, 9, 3, &[1, 3]).unwrap(),
            vec![
                INDIRECT_READ,
                extrapolate(2, 2),
                skip(68, 2, Some(0), Some(0)),
                read(8, 2, 1, 1),
                skip(2, 2, Some(2), Some(2)),
                read(16, 2, 3, 3),
                skip(70, 5, Some(4), Some(0)),
                extrapolate(3, 5),
                read(8, 5, 1, 1),
                skip(2, 5, Some(2), Some(2)),
                read(16, 5, 3, 3),
                skip(70, 8, Some(4), Some(0)),
                extrapolate(3, 8),
                read(8, 8, 1, 1),
                skip(2, 8, Some(2), Some(2)),
                read(16, 8, 3, 3),
                skip(2, 8, Some(4), Some(4)),
            ]
        );
        assert_eq!(
            plan.gen_events(2, 9, 3, &[0, 4]).unwrap(),
            vec![
                INDIRECT_READ,
                skip(64, 2, None, None),
                extrapolate(2, 2),
                read(4, 2, 0, 0),
                skip(26, 2, Some(1), Some(3)),
                read(2, 2, 4, 4),
                skip(64, 5, None, None),
                extrapolate(3, 5),
                read(4, 5, 0, 0),
                skip(26, 5, Some(1), Some(3)),
                read(2, 5, 4, 4),
                skip(64, 8, None, None),
                extrapolate(3, 8),
                read(4, 8, 0, 0),
                skip(26, 8, Some(1), Some(3)),
                read(2, 8, 4, 4),
            ]
        );
    }

    #[test]
    fn degenerate_requests() {
        let plan = FrameSetPlan::new(&dfsr(false)).unwrap();
        assert!(plan.gen_events(0, 4, 1, &[]).unwrap().is_empty());
        assert!(plan.gen_events(4, 4, 1, &[0]).unwrap().is_empty());
        assert!(plan.gen_events(0, 4, 0, &[0]).is_err());
        assert!(matches!(
            plan.gen_events(0, 4, 1, &[5]),
            Err(WellLogError::IndexOutOfRange { index: 5, .. })
        ));
    }
}
