//! The 80 byte Storage Unit Label at the start of every RP66V1 file.
//!
//! ```text
//! 0        4         9          15          20                          80
//! +--------+---------+----------+-----------+---------------------------+
//! | seq no | version | RECORD   | max len   | storage set identifier    |
//! | "0001" | "V1.00" | "RECORD" | "08192"   | (60 bytes, space padded)  |
//! +--------+---------+----------+-----------+---------------------------+
//! ```

use regex::bytes::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::utils::display_text;

pub const SUL_SIZE: usize = 80;

/// A file that starts with TIF markers has this at offset 0.
const TIF_FILE_PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0x5c, 0, 0, 0];

fn re_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0 ]*([1-9][0-9]*)$").expect("valid regex"))
}

fn re_version() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^V1\.\d\d$").expect("valid regex"))
}

fn re_structure() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^RECORD$").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUnitLabel {
    pub sequence_number: u32,
    pub dlis_version: Vec<u8>,
    pub structure: Vec<u8>,
    pub maximum_record_length: u32,
    pub storage_set_identifier: Vec<u8>,
}

fn parse_number(field: &[u8], what: &str) -> Result<u32> {
    re_number()
        .captures(field)
        .and_then(|c| c.get(1))
        .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| {
            WellLogError::InvalidFormat(format!(
                "Storage Unit Label {} field {:?} is not a positive number",
                what,
                display_text(field)
            ))
        })
}

impl StorageUnitLabel {
    /// Parse the label from the first 80 bytes of a file.
    ///
    /// # Errors
    /// `InvalidFormat` on a wrong length, a TIF encoded file or any field that
    /// does not match its pattern.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SUL_SIZE {
            return Err(WellLogError::InvalidFormat(format!(
                "Storage Unit Label needs {} bytes, got {}",
                SUL_SIZE,
                bytes.len()
            )));
        }
        if bytes.starts_with(&TIF_FILE_PREFIX) {
            return Err(WellLogError::InvalidFormat(
                "file appears to have TIF markers, remove them to read it".into(),
            ));
        }
        let sequence_number = parse_number(&bytes[0..4], "sequence number")?;
        if !re_version().is_match(&bytes[4..9]) {
            return Err(WellLogError::InvalidFormat(format!(
                "Storage Unit Label version {:?} is not V1.nn",
                display_text(&bytes[4..9])
            )));
        }
        if !re_structure().is_match(&bytes[9..15]) {
            return Err(WellLogError::InvalidFormat(format!(
                "Storage Unit Label structure {:?} is not RECORD",
                display_text(&bytes[9..15])
            )));
        }
        let maximum_record_length = parse_number(&bytes[15..20], "maximum record length")?;
        Ok(Self {
            sequence_number,
            dlis_version: bytes[4..9].to_vec(),
            structure: bytes[9..15].to_vec(),
            maximum_record_length,
            storage_set_identifier: bytes[20..].to_vec(),
        })
    }

    /// A label with the usual version and structure, the identifier padded
    /// or truncated to 60 bytes.
    pub fn create(sequence_number: u32, maximum_record_length: u32, storage_set_identifier: &[u8]) -> Self {
        let mut ssi = storage_set_identifier.to_vec();
        ssi.resize(SUL_SIZE - 20, b' ');
        Self {
            sequence_number,
            dlis_version: b"V1.00".to_vec(),
            structure: b"RECORD".to_vec(),
            maximum_record_length,
            storage_set_identifier: ssi,
        }
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SUL_SIZE);
        out.extend(format!("{:04}", self.sequence_number).bytes());
        out.extend(&self.dlis_version);
        out.extend(&self.structure);
        out.extend(format!("{:05}", self.maximum_record_length).bytes());
        out.extend(&self.storage_set_identifier);
        out.resize(SUL_SIZE, b' ');
        out
    }
}

impl fmt::Display for StorageUnitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "StorageUnitLabel:")?;
        writeln!(f, "  Storage Unit Sequence Number: {}", self.sequence_number)?;
        writeln!(f, "                  DLIS Version: {}", display_text(&self.dlis_version))?;
        writeln!(f, "        Storage Unit Structure: {}", display_text(&self.structure))?;
        writeln!(f, "         Maximum Record Length: {}", self.maximum_record_length)?;
        write!(
            f,
            "        Storage Set Identifier: {}",
            display_text(&self.storage_set_identifier).trim_end()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_write_back() {
        let sul = StorageUnitLabel::create(1, 8192, b"Default Storage Set");
        let bytes = sul.as_bytes();
        assert_eq!(&bytes[..20], b"0001V1.00RECORD08192");
        let parsed = StorageUnitLabel::parse(&bytes).unwrap();
        assert_eq!(parsed, sul);
        assert_eq!(parsed.maximum_record_length, 8192);
    }

    #[test]
    fn bad_fields() {
        let mut bytes = StorageUnitLabel::create(1, 8192, b"").as_bytes();
        bytes[4] = b'X';
        assert!(StorageUnitLabel::parse(&bytes).is_err());
        let mut bytes = StorageUnitLabel::create(1, 8192, b"").as_bytes();
        bytes[0..4].copy_from_slice(b"0000");
        assert!(StorageUnitLabel::parse(&bytes).is_err());
        assert!(StorageUnitLabel::parse(&bytes[..79]).is_err());
    }
}
