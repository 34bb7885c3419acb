//! Read-only statistics over a populated channel.

/// Summary of one channel's values with absent values removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySummary {
    /// Total number of values, absent included.
    pub len: usize,
    /// Number of values that are not absent.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub median: f64,
    /// Adjacent pairs that are equal.
    pub count_eq: usize,
    pub count_dec: usize,
    pub count_inc: usize,
    /// Mean absolute difference of log2 of adjacent values. NaN if any value
    /// is not positive.
    pub activity: f64,
    /// `(last - first) / (count - 1)`.
    pub drift: f64,
}

impl ArraySummary {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Median, the mean of the two central values for an even length.
pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub(crate) fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

/// Summarise `values`, ignoring any equal to `absent`.
///
/// Returns `None` when fewer than two values remain.
pub fn summarise(values: &[f64], absent: Option<f64>) -> Option<ArraySummary> {
    let present: Vec<f64> = match absent {
        Some(a) => values.iter().copied().filter(|v| *v != a).collect(),
        None => values.to_vec(),
    };
    if present.len() < 2 {
        return None;
    }
    let (mut count_eq, mut count_dec, mut count_inc) = (0, 0, 0);
    let mut activity = 0.0;
    for pair in present.windows(2) {
        let diff = pair[1] - pair[0];
        if diff == 0.0 {
            count_eq += 1;
        } else if diff < 0.0 {
            count_dec += 1;
        } else if diff > 0.0 {
            count_inc += 1;
        }
        activity += (pair[1].log2() - pair[0].log2()).abs();
    }
    let count = present.len();
    let (min, max) = min_max(&present);
    Some(ArraySummary {
        len: values.len(),
        count,
        min,
        max,
        mean: mean(&present),
        std: std_dev(&present),
        median: median(&present),
        count_eq,
        count_dec,
        count_inc,
        activity: activity / (count - 1) as f64,
        drift: (present[count - 1] - present[0]) / (count - 1) as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_are_excluded() {
        let s = summarise(&[-999.25, 1.0, 2.0, 4.0, 4.0, -999.25], Some(-999.25)).unwrap();
        assert_eq!(s.len, 6);
        assert_eq!(s.count, 4);
        assert_eq!((s.min, s.max), (1.0, 4.0));
        assert_eq!(s.mean, 2.75);
        assert_eq!(s.median, 3.0);
        assert_eq!((s.count_eq, s.count_dec, s.count_inc), (1, 0, 2));
        assert_eq!(s.activity, 2.0 / 3.0);
        assert_eq!(s.drift, 1.0);
        assert_eq!(s.span(), 3.0);
    }

    #[test]
    fn too_few_values() {
        assert!(summarise(&[1.0], None).is_none());
        assert!(summarise(&[1.0, -999.0], Some(-999.0)).is_none());
    }
}
