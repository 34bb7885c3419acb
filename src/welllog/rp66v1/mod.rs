//! RP66V1 (DLIS) reading.
//!
//! ```text
//! file   SUL | VR | VR | ...
//! VR     header (length, 0xFF01) | LRS | LRS | ...
//! LRS    LRSH (length, attributes, type) | body | [pad] [checksum] [trailing length]
//! LR     one or more LRS bodies joined: an EFLR (set, template, objects)
//!        or an IFLR (OBNAME, frame number, free data)
//! ```
//!
//! [`LogicalRecordIndex`] holds the position of every logical record,
//! [`LogicalIndex`] groups the decoded records into Logical Files and can
//! populate their frame arrays.

pub mod component;
pub mod eflr;
pub mod framing;
pub mod iflr;
pub mod index;
pub mod log_pass;
pub mod logical_file;
pub mod sul;
pub mod types;

pub use eflr::{Attribute, ExplicitlyFormattedLogicalRecord, Object};
pub use framing::{FileLogicalData, FileRead, LogicalRecordPosition, LrPosDesc};
pub use iflr::IndirectlyFormattedLogicalRecord;
pub use index::{IndexOptions, LogicalRecordIndex};
pub use logical_file::{LogicalFile, LogicalIndex};
pub use sul::StorageUnitLabel;
