//! Public logical record type codes for EFLRs and IFLRs.

pub const EFLR_FILE_HEADER: u8 = 0;
pub const EFLR_ORIGIN: u8 = 1;
pub const EFLR_CHANNEL: u8 = 3;
pub const EFLR_FRAME: u8 = 4;

pub const IFLR_FDATA: u8 = 0;
pub const IFLR_NOFORMAT: u8 = 1;
pub const IFLR_EOD: u8 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EflrType {
    pub code: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub set_types: &'static [&'static [u8]],
}

pub const EFLR_PUBLIC_TYPES: [EflrType; 12] = [
    EflrType {
        code: 0,
        name: "FHLR",
        description: "File Header",
        set_types: &[b"FILE-HEADER"],
    },
    EflrType {
        code: 1,
        name: "OLR",
        description: "Origin",
        set_types: &[b"ORIGIN", b"WELL-REFERENCE"],
    },
    EflrType {
        code: 2,
        name: "AXIS",
        description: "Coordinate Axis",
        set_types: &[b"AXIS"],
    },
    EflrType {
        code: 3,
        name: "CHANNL",
        description: "Channel-related information",
        set_types: &[b"CHANNEL"],
    },
    EflrType {
        code: 4,
        name: "FRAME",
        description: "Frame Data",
        set_types: &[b"FRAME", b"PATH"],
    },
    EflrType {
        code: 5,
        name: "STATIC",
        description: "Static Data",
        set_types: &[
            b"CALIBRATION",
            b"CALIBRATION-COEFFICIENT",
            b"CALIBRATION-MEASUREMENT",
            b"COMPUTATION",
            b"EQUIPMENT",
            b"GROUP",
            b"PARAMETER",
            b"PROCESS",
            b"SPICE",
            b"TOOL",
            b"ZONE",
        ],
    },
    EflrType {
        code: 6,
        name: "SCRIPT",
        description: "Textual Data",
        set_types: &[b"COMMENT", b"MESSAGE"],
    },
    EflrType {
        code: 7,
        name: "UPDATE",
        description: "Update Data",
        set_types: &[b"UPDATE"],
    },
    EflrType {
        code: 8,
        name: "UDI",
        description: "Unformatted Data Identifier",
        set_types: &[b"NO-FORMAT"],
    },
    EflrType {
        code: 9,
        name: "LNAME",
        description: "Long Name",
        set_types: &[b"LONG-NAME"],
    },
    EflrType {
        code: 10,
        name: "SPEC",
        description: "Specification",
        set_types: &[
            b"ATTRIBUTE",
            b"CODE",
            b"EFLR",
            b"IFLR",
            b"OBJECT-TYPE",
            b"REPRESENTATION-CODE",
            b"SPECIFICATION",
            b"UNIT-SYMBOL",
        ],
    },
    EflrType {
        code: 11,
        name: "DICT",
        description: "Dictionary",
        set_types: &[b"BASE-DICTIONARY", b"IDENTIFIER", b"LEXICON", b"OPTION"],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IflrType {
    pub code: u8,
    pub name: &'static str,
    pub description: &'static str,
    /// Set type of the EFLR object the IFLR refers to.
    pub data_descriptor: &'static [u8],
}

pub const IFLR_PUBLIC_TYPES: [IflrType; 3] = [
    IflrType {
        code: IFLR_FDATA,
        name: "FDATA",
        description: "Frame Data",
        data_descriptor: b"FRAME",
    },
    IflrType {
        code: IFLR_NOFORMAT,
        name: "NOFORMAT",
        description: "Unformatted Data",
        data_descriptor: b"NO-FORMAT",
    },
    IflrType {
        code: IFLR_EOD,
        name: "EOD",
        description: "End of Data",
        data_descriptor: b"",
    },
];

pub fn is_public(code: u8) -> bool {
    code < 128
}

pub fn is_private(code: u8) -> bool {
    !is_public(code)
}

/// `None` for private and reserved codes.
pub fn eflr_type(code: u8) -> Option<&'static EflrType> {
    EFLR_PUBLIC_TYPES.get(code as usize)
}

pub fn iflr_type(code: u8) -> Option<&'static IflrType> {
    IFLR_PUBLIC_TYPES.iter().find(|t| t.code == code)
}

/// The EFLR code a public set type belongs to.
pub fn eflr_code_for_set_type(set_type: &[u8]) -> Option<u8> {
    EFLR_PUBLIC_TYPES
        .iter()
        .find(|t| t.set_types.contains(&set_type))
        .map(|t| t.code)
}

/// Short description of any logical record type, used in summaries.
pub fn describe(is_eflr: bool, code: u8) -> String {
    let known = if is_eflr {
        eflr_type(code).map(|t| (t.name, t.description))
    } else {
        iflr_type(code).map(|t| (t.name, t.description))
    };
    match known {
        Some((name, description)) => format!("{} ({})", name, description),
        None if is_private(code) => format!("private {}", code),
        None => format!("undefined, reserved {}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups() {
        assert_eq!(eflr_code_for_set_type(b"TOOL"), Some(5));
        assert_eq!(eflr_code_for_set_type(b"WELL-REFERENCE"), Some(1));
        assert_eq!(eflr_code_for_set_type(b"NOPE"), None);
        assert_eq!(eflr_type(4).unwrap().name, "FRAME");
        assert!(eflr_type(12).is_none());
        assert_eq!(iflr_type(127).unwrap().name, "EOD");
        assert_eq!(describe(false, 0), "FDATA (Frame Data)");
        assert_eq!(describe(true, 200), "private 200");
        assert_eq!(describe(false, 50), "undefined, reserved 50");
    }
}
