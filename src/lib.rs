//! # welllog-reader
//!
//! Indexing and frame decoding for the two binary well log dialects:
//! RP66V1 (DLIS) and LIS79.
//!
//! Both dialects are indexed in a single pass that records where every
//! logical record is without keeping record bodies. Frame data is decoded
//! later, for a chosen selection of frames and channels, into dense arrays.
//!
//! - [`rp66v1::LogicalIndex`] groups an RP66V1 file into Logical Files and
//!   populates their frame arrays.
//! - [`lis::FileIndex`] groups a LIS file into log passes that read frame
//!   sets.
//! - [`Dialect::of_path`] tells the two apart.
pub mod welllog;

// Re-export the main types for convenience
pub use welllog::{
    frame::{create_slice_or_sample, ArraySummary, FrameArray, FrameSlice, Sample, Slice, XAxis},
    lis,
    rp66v1,
    types::models::{NoProgress, ObName, ProgressSink, Value},
    Dialect, Result, WellLogError,
};
