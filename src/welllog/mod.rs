//! Well log file reading for the RP66V1 (DLIS) and LIS79 dialects.

pub mod codec;
pub mod cursor;
pub mod frame;
pub mod lis;
pub mod rp66v1;
pub mod types;
pub mod utils;

use log::debug;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

pub use types::error::{Result, WellLogError};

/// The binary dialect of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Rp66v1,
    Lis,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Rp66v1 => "RP66V1",
            Dialect::Lis => "LIS79",
        })
    }
}

impl Dialect {
    /// Detect the dialect of the file at `path`, `None` if it is neither.
    pub fn of_path(path: impl AsRef<Path>) -> Result<Option<Self>> {
        Self::detect(BufReader::new(File::open(path)?))
    }

    /// A valid Storage Unit Label means RP66V1. Otherwise the first Logical
    /// Record must frame correctly and have a known LIS type. The reader is
    /// rewound afterwards.
    pub fn detect<R: Read + Seek>(mut reader: R) -> Result<Option<Self>> {
        let mut sul = Vec::with_capacity(rp66v1::sul::SUL_SIZE);
        (&mut reader)
            .take(rp66v1::sul::SUL_SIZE as u64)
            .read_to_end(&mut sul)?;
        if rp66v1::StorageUnitLabel::parse(&sul).is_ok() {
            reader.seek(SeekFrom::Start(0))?;
            return Ok(Some(Dialect::Rp66v1));
        }
        reader.seek(SeekFrom::Start(0))?;
        let found = match lis::PhysicalRecordReader::new(&mut reader, false)
            .and_then(|mut pr| pr.read_logical_record_header())
        {
            Ok(Some((lr_type, _))) if lis::logi_rec::is_known(lr_type) => Some(Dialect::Lis),
            Ok(_) => None,
            Err(err) => {
                debug!("Not LIS: {}", err);
                None
            }
        };
        reader.seek(SeekFrom::Start(0))?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn detects_both_dialects() {
        let sul = rp66v1::StorageUnitLabel::create(1, 8192, b"test").as_bytes();
        assert_eq!(Dialect::detect(Cursor::new(sul)).unwrap(), Some(Dialect::Rp66v1));

        let mut writer =
            lis::PhysicalRecordWriter::new(Vec::new(), true, 1024, lis::PhysicalRecordTail::default()).unwrap();
        writer.write_logical_record(&[232, 0, b'x']).unwrap();
        let bytes = writer.close().unwrap();
        assert_eq!(Dialect::detect(Cursor::new(bytes)).unwrap(), Some(Dialect::Lis));

        assert_eq!(Dialect::detect(Cursor::new(vec![0u8; 4])).unwrap(), None);
    }
}
