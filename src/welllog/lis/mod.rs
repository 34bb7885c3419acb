//! LIS79 reading.
//!
//! ```text
//! file   [TIF] PR | [TIF] PR | ...
//! PR     header (length, attributes) | logical data | [record no.] [file no.] [checksum]
//! LR     logical data of one or more PRs: type, attributes, body
//! ```
//!
//! [`FileIndex`] scans the Logical Records once. Each DFSR starts a
//! [`LogPass`] that collects the positions of the data records after it and
//! reads any selection of their frames into a [`FrameSet`].

pub mod dfsr;
pub mod frame_set;
pub mod index;
pub mod log_pass;
pub mod logi_rec;
pub mod phys_rec;
pub mod plan;
pub mod rle;
pub mod table;
pub mod tif;
pub mod units;

pub use dfsr::{DatumSpecBlock, Dfsr, EntryBlock, EntryBlockSet};
pub use frame_set::FrameSet;
pub use index::{FileIndex, IndexEntry, ReadOptions, RecordPosition};
pub use log_pass::LogPass;
pub use phys_rec::{PhysicalRecordReader, PhysicalRecordTail, PhysicalRecordWriter};
pub use plan::{Event, FrameSetPlan};
pub use table::{DuplicateRowPolicy, Table};
