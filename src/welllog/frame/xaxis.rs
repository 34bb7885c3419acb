//! X axis (depth or time) bookkeeping for a frame array: one reference per
//! IFLR, plus a lazily computed summary of the values and their spacing.
//!
//! Spacing classification, relative to the median first difference `m`:
//!
//! ```text
//! back   dx < -0.5 m
//! dupe   -0.5 m <= dx < 0.5 m
//! norm   0.5 m <= dx < 1.5 m
//! skip   dx >= 1.5 m
//! ```
//!
//! The inequalities flip when the median is negative (a decreasing axis).

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::summary::{mean, median, min_max, std_dev};
use crate::welllog::rp66v1::framing::LogicalRecordPosition;

/// Counts of first differences in each spacing class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpacingCounts {
    pub norm: usize,
    pub dupe: usize,
    pub skip: usize,
    pub back: usize,
}

impl SpacingCounts {
    pub fn total(&self) -> usize {
        self.norm + self.dupe + self.skip + self.back
    }
}

/// Equal width histogram, `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub counts: Vec<usize>,
    pub edges: Vec<f64>,
}

impl Histogram {
    /// `bins` equal bins over the data range. A degenerate range is widened by
    /// 0.5 either side. The last bin includes its upper edge.
    pub fn new(values: &[f64], bins: usize) -> Self {
        let (mut lo, mut hi) = min_max(values);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for v in values {
            let bin = (((v - lo) / (hi - lo)) * bins as f64) as usize;
            counts[bin.min(bins - 1)] += 1;
        }
        Self { counts, edges }
    }

    /// Text bar chart scaled to `bar_width` characters.
    pub fn to_text(&self, bar_width: usize) -> String {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        let scale = bar_width as f64 / peak as f64;
        let mut lines = vec![format!("{:>13} [{:>6}]: Relative Frequency", "Value", "N")];
        for (count, edge) in self.counts.iter().zip(&self.edges) {
            lines.push(format!(
                "{:>13.6} [{:>6}]: {}",
                edge,
                count,
                "*".repeat((0.5 + scale * *count as f64) as usize)
            ));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpacingSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub counts: SpacingCounts,
    pub histogram: Histogram,
}

/// Classify first differences against their median.
pub fn compute_spacing_counts(diff: &[f64]) -> (f64, SpacingCounts) {
    let median = median(diff);
    let half = median / 2.0;
    let mut counts = SpacingCounts::default();
    for &d in diff {
        let class = if median < 0.0 {
            if d < 3.0 * half {
                &mut counts.skip
            } else if d < half {
                &mut counts.norm
            } else if d < -half {
                &mut counts.dupe
            } else {
                &mut counts.back
            }
        } else if d >= 3.0 * half {
            &mut counts.skip
        } else if d >= half {
            &mut counts.norm
        } else if d >= -half {
            &mut counts.dupe
        } else {
            &mut counts.back
        };
        *class += 1;
    }
    (median, counts)
}

/// Summary of the first differences of `values`, `None` with fewer than two.
pub fn compute_spacing(values: &[f64]) -> Option<SpacingSummary> {
    if values.len() < 2 {
        return None;
    }
    let diff: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let (median, counts) = compute_spacing_counts(&diff);
    let (min, max) = min_max(&diff);
    let bins = if min != max { 10 } else { 1 };
    Some(SpacingSummary {
        min,
        max,
        mean: mean(&diff),
        median,
        std: std_dev(&diff),
        counts,
        histogram: Histogram::new(&diff, bins),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct XAxisSummary {
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub spacing: Option<SpacingSummary>,
}

/// Where an IFLR is in the file, its frame number and its X value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IflrReference {
    pub position: LogicalRecordPosition,
    pub frame_number: u32,
    pub x_axis: f64,
}

/// The X axis of one frame array, accumulated IFLR by IFLR.
#[derive(Debug, Default)]
pub struct XAxis {
    pub ident: Vec<u8>,
    pub long_name: Vec<u8>,
    pub units: Vec<u8>,
    data: Vec<IflrReference>,
    summary: OnceLock<Option<XAxisSummary>>,
}

impl XAxis {
    pub fn new(ident: Vec<u8>, long_name: Vec<u8>, units: Vec<u8>) -> Self {
        Self {
            ident,
            long_name,
            units,
            ..Default::default()
        }
    }

    pub fn append(&mut self, position: LogicalRecordPosition, frame_number: u32, x_axis: f64) {
        self.summary.take();
        self.data.push(IflrReference {
            position,
            frame_number,
            x_axis,
        });
    }

    pub fn get(&self, index: usize) -> Option<&IflrReference> {
        self.data.get(index)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IflrReference> {
        self.data.iter()
    }

    /// Computed on first use and cached until the next append. `None` if
    /// there are no IFLRs.
    pub fn summary(&self) -> Option<&XAxisSummary> {
        self.summary
            .get_or_init(|| {
                if self.data.is_empty() {
                    return None;
                }
                let values: Vec<f64> = self.data.iter().map(|r| r.x_axis).collect();
                let (min, max) = min_max(&values);
                Some(XAxisSummary {
                    min,
                    max,
                    count: values.len(),
                    spacing: compute_spacing(&values),
                })
            })
            .as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_spacing() {
        let values: Vec<f64> = (0..11).map(|i| i as f64 * 0.5).collect();
        let s = compute_spacing(&values).unwrap();
        assert_eq!(s.median, 0.5);
        assert_eq!(s.counts.norm, 10);
        assert_eq!(s.counts.total(), 10);
        assert_eq!(s.histogram.counts, vec![10]);
        assert_eq!(s.histogram.edges, vec![0.0, 1.0]);
    }

    #[test]
    fn irregular_spacing_classes() {
        let s = compute_spacing(&[0.0, 1.0, 2.0, 2.0, 5.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.median, 1.0);
        assert_eq!(
            s.counts,
            SpacingCounts {
                norm: 3,
                dupe: 1,
                skip: 1,
                back: 1
            }
        );
        assert_eq!(s.histogram.counts.len(), 10);
        assert_eq!(s.histogram.counts.iter().sum::<usize>(), 6);
    }

    #[test]
    fn decreasing_axis() {
        let (median, counts) = compute_spacing_counts(&[-1.0, -1.0, 0.0, -3.0, 1.0]);
        assert_eq!(median, -1.0);
        assert_eq!(
            counts,
            SpacingCounts {
                norm: 2,
                dupe: 1,
                skip: 1,
                back: 1
            }
        );
    }

    #[test]
    fn single_value_has_no_spacing() {
        assert!(compute_spacing(&[1.0]).is_none());
    }
}
