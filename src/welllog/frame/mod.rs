//! Dialect independent frame handling: selection, dense storage, X axis
//! bookkeeping and summaries.

pub mod array;
pub mod slice;
pub mod summary;
pub mod xaxis;

pub use array::{FrameArray, FrameArraySet, FrameChannel};
pub use slice::{create_slice_or_sample, FrameSlice, Sample, Slice};
pub use summary::ArraySummary;
pub use xaxis::XAxis;
