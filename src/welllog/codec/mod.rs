//! Representation code codecs for both dialects.
//!
//! RP66V1 codes are read from a [`LogicalData`](crate::welllog::cursor::LogicalData)
//! because several of them are variable length. LIS codes are all fixed width
//! apart from text and are decoded from byte slices.

pub mod lis;
pub mod rp66v1;

/// Absent value for floating point codes.
pub const ABSENT_FLOAT: f64 = -999.25;

/// Absent value for integer codes.
pub const ABSENT_INT: i64 = -999;

