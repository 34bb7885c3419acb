//! Indirectly Formatted Logical Records: an OBNAME naming the data
//! descriptor, a UVARI frame number then free data.

use log::warn;
use std::fmt;

use crate::welllog::codec::rp66v1::{read_obname, read_uvari};
use crate::welllog::cursor::LogicalData;
use crate::welllog::types::error::Result;
use crate::welllog::types::models::ObName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectlyFormattedLogicalRecord {
    pub lr_type: u8,
    pub object_name: ObName,
    pub frame_number: u32,
    /// Bytes taken by the name and frame number.
    pub preamble_length: usize,
    /// Free data bytes following the preamble.
    pub remain: usize,
}

impl IndirectlyFormattedLogicalRecord {
    /// Read the preamble from the start of `ld`, leaving it positioned at the
    /// free data.
    pub fn new(lr_type: u8, ld: &mut LogicalData) -> Result<Self> {
        ld.rewind();
        let object_name = read_obname(ld)?;
        let frame_number = read_uvari(ld)?;
        let iflr = Self {
            lr_type,
            object_name,
            frame_number,
            preamble_length: ld.index(),
            remain: ld.remain(),
        };
        // Frame numbers count from 1 but zero with no data is common.
        if iflr.frame_number == 0 && iflr.remain != 0 {
            warn!("Frame number needs to be >= 1, not 0, with {} bytes remaining", iflr.remain);
        }
        Ok(iflr)
    }
}

impl fmt::Display for IndirectlyFormattedLogicalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<IndirectlyFormattedLogicalRecord {} frame: {} free data: {}>",
            self.object_name, self.frame_number, self.remain
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::welllog::codec::rp66v1::{write_obname, write_uvari};

    #[test]
    fn preamble() {
        let mut bytes = write_obname(&ObName::new(2, 0, "50")).unwrap();
        bytes.extend(write_uvari(300).unwrap());
        bytes.extend([0u8; 28]);
        let mut ld = LogicalData::new(bytes);
        let iflr = IndirectlyFormattedLogicalRecord::new(0, &mut ld).unwrap();
        assert_eq!(iflr.object_name, ObName::new(2, 0, "50"));
        assert_eq!(iflr.frame_number, 300);
        assert_eq!(iflr.preamble_length, 1 + 1 + 3 + 2);
        assert_eq!(iflr.remain, 28);
        assert_eq!(ld.index(), iflr.preamble_length);
    }
}
