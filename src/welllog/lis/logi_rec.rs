//! LIS Logical Record types and the fixed layout delimiter records.
//!
//! Every Logical Record starts with a two byte header, (type, attributes).
//! File, tape and reel head/tail records have fixed ASCII layouts:
//!
//! ```text
//! file head/tail  name 10 | 2 | sub-level 6 | version 8 | date 8 | 1 | max PR length 5 | 2 | type 2 | 2 | continuation 10
//! reel/tape       service 6 | 6 | date 8 | 2 | origin 4 | 2 | name 8 | 2 | continuation # 2 | 2 | continuation 8 | 2 | comments 74
//! ```

use std::fmt;

use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::utils::trimmed_text;

pub const LR_HEADER_LENGTH: usize = 2;

pub const LR_TYPE_NORMAL_DATA: u8 = 0;
pub const LR_TYPE_ALTERNATE_DATA: u8 = 1;
pub const LR_TYPE_JOB_ID: u8 = 32;
pub const LR_TYPE_WELL_DATA: u8 = 34;
pub const LR_TYPE_TOOL_INFO: u8 = 39;
pub const LR_TYPE_ENCRYPTED_TABLE: u8 = 42;
pub const LR_TYPE_TABLE_DUMP: u8 = 47;
pub const LR_TYPE_DATA_FORMAT: u8 = 64;
pub const LR_TYPE_DATA_DESCRIPTOR: u8 = 65;
pub const LR_TYPE_TU10_BOOT: u8 = 95;
pub const LR_TYPE_BOOTSTRAP_LOADER: u8 = 96;
pub const LR_TYPE_CP_KERNEL: u8 = 97;
pub const LR_TYPE_PROGRAM_FILE_HEAD: u8 = 100;
pub const LR_TYPE_PROGRAM_OVER_HEAD: u8 = 101;
pub const LR_TYPE_PROGRAM_OVER_LOAD: u8 = 102;
pub const LR_TYPE_FILE_HEAD: u8 = 128;
pub const LR_TYPE_FILE_TAIL: u8 = 129;
pub const LR_TYPE_TAPE_HEAD: u8 = 130;
pub const LR_TYPE_TAPE_TAIL: u8 = 131;
pub const LR_TYPE_REEL_HEAD: u8 = 132;
pub const LR_TYPE_REEL_TAIL: u8 = 133;
pub const LR_TYPE_EOF: u8 = 137;
pub const LR_TYPE_BOT: u8 = 138;
pub const LR_TYPE_EOT: u8 = 139;
pub const LR_TYPE_EOM: u8 = 141;
pub const LR_TYPE_OPERATOR_INPUT: u8 = 224;
pub const LR_TYPE_OPERATOR_RESPONSE: u8 = 225;
pub const LR_TYPE_SYSTEM_OUTPUT: u8 = 227;
pub const LR_TYPE_FLIC_COMMENT: u8 = 232;
pub const LR_TYPE_BLANK_RECORD: u8 = 234;
pub const LR_TYPE_PICTURE: u8 = 85;
pub const LR_TYPE_IMAGE: u8 = 86;

pub const LR_DESCRIPTION_UNKNOWN: &str = "Unknown Logical Record type.";

/// `None` for undefined types.
pub fn description(lr_type: u8) -> Option<&'static str> {
    Some(match lr_type {
        0 => "Normal data record containing log data",
        1 => "Alternate data.",
        32 => "Job identification",
        34 => "Well site data",
        39 => "Tool string info",
        42 => "Encrypted table dump",
        47 => "Table dump",
        64 => "Data format specification record",
        65 => "Data descriptor (not defined in the LIS79 Description Reference Manual)",
        95 => "TU10 software boot",
        96 => "Bootstrap loader",
        97 => "CP-kernel loader boot",
        100 => "Program file header",
        101 => "Program overlay header",
        102 => "Program overlay load",
        128 => "File header",
        129 => "File trailer",
        130 => "Tape header",
        131 => "Tape trailer",
        132 => "Reel header",
        133 => "Reel trailer",
        137 => "Logical EOF (end of file)",
        138 => "Logical BOT (beginning of tape)",
        139 => "Logical EOT (end of tape)",
        141 => "Logical EOM (end of medium)",
        224 => "Operator command inputs",
        225 => "Operator response inputs",
        227 => "System outputs to operator",
        232 => "FLIC comment",
        234 => "Blank record/CSU comment",
        85 => "Picture",
        86 => "Image",
        _ => return None,
    })
}

pub fn is_known(lr_type: u8) -> bool {
    description(lr_type).is_some()
}

pub fn is_log_data(lr_type: u8) -> bool {
    matches!(lr_type, LR_TYPE_NORMAL_DATA | LR_TYPE_ALTERNATE_DATA)
}

pub fn is_table(lr_type: u8) -> bool {
    matches!(lr_type, LR_TYPE_JOB_ID | LR_TYPE_WELL_DATA | LR_TYPE_TOOL_INFO)
}

/// File, tape and reel heads and tails.
pub fn is_delimiter(lr_type: u8) -> bool {
    (LR_TYPE_FILE_HEAD..=LR_TYPE_REEL_TAIL).contains(&lr_type)
}

/// Logical EOF, BOT, EOT and EOM.
pub fn is_marker(lr_type: u8) -> bool {
    matches!(lr_type, LR_TYPE_EOF | LR_TYPE_BOT | LR_TYPE_EOT | LR_TYPE_EOM)
}

/// Records with no known internal format, kept as raw bytes.
pub fn is_unknown_internal_format(lr_type: u8) -> bool {
    matches!(
        lr_type,
        LR_TYPE_ENCRYPTED_TABLE
            | LR_TYPE_TABLE_DUMP
            | LR_TYPE_TU10_BOOT
            | LR_TYPE_BOOTSTRAP_LOADER
            | LR_TYPE_CP_KERNEL
            | LR_TYPE_PROGRAM_FILE_HEAD
            | LR_TYPE_PROGRAM_OVER_HEAD
            | LR_TYPE_PROGRAM_OVER_LOAD
            | LR_TYPE_OPERATOR_INPUT
            | LR_TYPE_OPERATOR_RESPONSE
            | LR_TYPE_SYSTEM_OUTPUT
            | LR_TYPE_FLIC_COMMENT
            | LR_TYPE_BLANK_RECORD
            | LR_TYPE_PICTURE
            | LR_TYPE_IMAGE
    )
}

/// (offset, length) of each field, the gaps are padding.
const FILE_HEAD_TAIL_LAYOUT: [(usize, usize); 7] = [(0, 10), (12, 6), (18, 8), (26, 8), (35, 5), (42, 2), (46, 10)];
const FILE_HEAD_TAIL_LENGTH: usize = 56;
const REEL_TAPE_LAYOUT: [(usize, usize); 7] = [(0, 6), (12, 8), (22, 4), (28, 8), (38, 2), (42, 8), (52, 74)];
const REEL_TAPE_LENGTH: usize = 126;

fn unpack<const N: usize>(
    lr_type: u8,
    body: &[u8],
    layout: [(usize, usize); N],
    length: usize,
) -> Result<[Vec<u8>; N]> {
    if body.len() < length {
        return Err(WellLogError::InvalidFormat(format!(
            "logical record type {} needs {} bytes, has {}",
            lr_type,
            length,
            body.len()
        )));
    }
    Ok(layout.map(|(offset, len)| body[offset..offset + len].to_vec()))
}

fn pack<const N: usize>(fields: [&[u8]; N], layout: [(usize, usize); N], length: usize) -> Vec<u8> {
    let mut out = vec![b' '; length];
    for (field, (offset, len)) in fields.iter().zip(layout) {
        let n = field.len().min(len);
        out[offset..offset + n].copy_from_slice(&field[..n]);
    }
    out
}

/// Parse a `YY/MM/DD` date. Years 00-26 are 2000-2026, 27-99 are 1927-1999.
pub fn ymd(date: &[u8]) -> Option<(i32, u32, u32)> {
    let text = std::str::from_utf8(date).ok()?;
    let mut parts = text.trim().split('/');
    let y: i32 = parts.next()?.trim().parse().ok()?;
    let m: u32 = parts.next()?.trim().parse().ok()?;
    let d: u32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let y = if y < 27 { y + 100 } else { y };
    Some((y + 1900, m, d))
}

/// File head (128) or tail (129).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeadTail {
    pub lr_type: u8,
    pub file_name: Vec<u8>,
    pub service_sub_level: Vec<u8>,
    pub version: Vec<u8>,
    pub date: Vec<u8>,
    pub max_pr_length: Vec<u8>,
    pub file_type: Vec<u8>,
    /// Previous file name for a head, next file name for a tail.
    pub continuation_name: Vec<u8>,
}

impl FileHeadTail {
    /// Parse the body following the two byte header.
    pub fn parse(lr_type: u8, body: &[u8]) -> Result<Self> {
        if lr_type != LR_TYPE_FILE_HEAD && lr_type != LR_TYPE_FILE_TAIL {
            return Err(WellLogError::InvalidFormat(format!(
                "illegal LR type of {} for a file head/tail",
                lr_type
            )));
        }
        let [file_name, service_sub_level, version, date, max_pr_length, file_type, continuation_name] =
            unpack(lr_type, body, FILE_HEAD_TAIL_LAYOUT, FILE_HEAD_TAIL_LENGTH)?;
        Ok(Self {
            lr_type,
            file_name,
            service_sub_level,
            version,
            date,
            max_pr_length,
            file_type,
            continuation_name,
        })
    }

    pub fn ymd(&self) -> Option<(i32, u32, u32)> {
        ymd(&self.date)
    }

    /// The whole Logical Record, header included.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.lr_type, 0];
        out.extend(pack(
            [
                self.file_name.as_slice(),
                self.service_sub_level.as_slice(),
                self.version.as_slice(),
                self.date.as_slice(),
                self.max_pr_length.as_slice(),
                self.file_type.as_slice(),
                self.continuation_name.as_slice(),
            ],
            FILE_HEAD_TAIL_LAYOUT,
            FILE_HEAD_TAIL_LENGTH,
        ));
        out
    }
}

impl fmt::Display for FileHeadTail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Name: \"{}\"",
            description(self.lr_type).unwrap_or(LR_DESCRIPTION_UNKNOWN),
            trimmed_text(&self.file_name)
        )
    }
}

/// Tape head/tail (130/131) or reel head/tail (132/133).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelTapeHeadTail {
    pub lr_type: u8,
    pub service_name: Vec<u8>,
    pub date: Vec<u8>,
    pub origin: Vec<u8>,
    pub name: Vec<u8>,
    pub continuation_number: Vec<u8>,
    pub continuation_name: Vec<u8>,
    pub comments: Vec<u8>,
}

impl ReelTapeHeadTail {
    pub fn parse(lr_type: u8, body: &[u8]) -> Result<Self> {
        if !(LR_TYPE_TAPE_HEAD..=LR_TYPE_REEL_TAIL).contains(&lr_type) {
            return Err(WellLogError::InvalidFormat(format!(
                "illegal LR type of {} for a reel/tape head/tail",
                lr_type
            )));
        }
        let [service_name, date, origin, name, continuation_number, continuation_name, comments] =
            unpack(lr_type, body, REEL_TAPE_LAYOUT, REEL_TAPE_LENGTH)?;
        Ok(Self {
            lr_type,
            service_name,
            date,
            origin,
            name,
            continuation_number,
            continuation_name,
            comments,
        })
    }

    pub fn ymd(&self) -> Option<(i32, u32, u32)> {
        ymd(&self.date)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.lr_type, 0];
        out.extend(pack(
            [
                self.service_name.as_slice(),
                self.date.as_slice(),
                self.origin.as_slice(),
                self.name.as_slice(),
                self.continuation_number.as_slice(),
                self.continuation_name.as_slice(),
                self.comments.as_slice(),
            ],
            REEL_TAPE_LAYOUT,
            REEL_TAPE_LENGTH,
        ));
        out
    }
}

impl fmt::Display for ReelTapeHeadTail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Name: \"{}\"",
            description(self.lr_type).unwrap_or(LR_DESCRIPTION_UNKNOWN),
            trimmed_text(&self.name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(description(64), Some("Data format specification record"));
        assert_eq!(description(3), None);
        assert!(is_delimiter(LR_TYPE_FILE_TAIL));
        assert!(!is_delimiter(LR_TYPE_EOF));
        assert!(is_marker(LR_TYPE_EOF));
        assert!(is_table(LR_TYPE_TOOL_INFO));
        assert!(is_unknown_internal_format(LR_TYPE_PICTURE));
        assert!(!is_unknown_internal_format(LR_TYPE_DATA_FORMAT));
    }

    #[test]
    fn file_head() {
        let mut body = b"RUN1  .001  ".to_vec();
        body.extend(b"      ");
        body.extend(b"V1.0    ");
        body.extend(b"99/04/29");
        body.extend(b" 1024 ");
        body.extend(b"  LO  ");
        body.extend(b"PREV.001  ");
        assert_eq!(body.len(), 56);
        let head = FileHeadTail::parse(LR_TYPE_FILE_HEAD, &body).unwrap();
        assert_eq!(head.file_name, b"RUN1  .001");
        assert_eq!(head.date, b"99/04/29");
        assert_eq!(head.max_pr_length, b"1024 ");
        assert_eq!(head.file_type, b"LO");
        assert_eq!(head.continuation_name, b"PREV.001  ");
        assert_eq!(head.ymd(), Some((1999, 4, 29)));
        assert_eq!(head.to_bytes()[2..], body[..]);
        assert_eq!(head.to_string(), "File header Name: \"RUN1  .001\"");
        assert!(FileHeadTail::parse(LR_TYPE_TAPE_HEAD, &body).is_err());
        assert!(FileHeadTail::parse(LR_TYPE_FILE_HEAD, &body[..50]).is_err());
    }

    #[test]
    fn reel_head_round_trip() {
        let reel = ReelTapeHeadTail {
            lr_type: LR_TYPE_REEL_HEAD,
            service_name: b"SERVCE".to_vec(),
            date: b"10/01/02".to_vec(),
            origin: b"ORIG".to_vec(),
            name: b"REELNAME".to_vec(),
            continuation_number: b"01".to_vec(),
            continuation_name: b"PREVREEL".to_vec(),
            comments: vec![b'C'; 74],
        };
        let bytes = reel.to_bytes();
        assert_eq!(bytes.len(), 128);
        assert_eq!(ReelTapeHeadTail::parse(bytes[0], &bytes[2..]).unwrap(), reel);
        assert_eq!(reel.ymd(), Some((2010, 1, 2)));
    }

    #[test]
    fn dates() {
        assert_eq!(ymd(b"27/12/31"), Some((1927, 12, 31)));
        assert_eq!(ymd(b"\0\0\0\0\0\0\0\0"), None);
    }
}
