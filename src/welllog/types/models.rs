//! Core value types shared by both dialects.
//!
//! This module defines:
//! - The decoded form of every representation code ([`Value`])
//! - RP66V1 object naming ([`ObName`], [`ObjRef`], [`AttRef`])
//! - The injected progress capability ([`ProgressSink`])

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::welllog::utils::display_text;

/// An RP66V1 object name: `(origin, copy, identifier)`.
///
/// Ordering is by origin, then copy, then identifier bytes which gives a stable
/// sort for table projections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObName {
    pub origin: u32,
    pub copy: u8,
    pub ident: Vec<u8>,
}

impl ObName {
    pub fn new(origin: u32, copy: u8, ident: impl Into<Vec<u8>>) -> Self {
        Self {
            origin,
            copy,
            ident: ident.into(),
        }
    }
}

impl fmt::Display for ObName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OBNAME: O: {} C: {} I: {}", self.origin, self.copy, display_text(&self.ident))
    }
}

/// Object reference, representation code OBJREF.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjRef {
    pub type_ident: Vec<u8>,
    pub name: ObName,
}

/// Attribute reference, representation code ATTREF.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttRef {
    pub type_ident: Vec<u8>,
    pub name: ObName,
    pub label: Vec<u8>,
}

/// Representation code DTIME.
///
/// `tz` is 0 local standard, 1 local daylight saving, 2 GMT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTime {
    pub year: u16,
    pub tz: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

impl DateTime {
    pub fn tz_abbreviation(&self) -> &'static str {
        match self.tz {
            0 => "STD",
            1 => "DST",
            2 => "GMT",
            _ => "",
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03} {}",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.millisecond,
            self.tz_abbreviation()
        )
    }
}

/// A single decoded value from either dialect.
///
/// The variant set is closed: every representation code decodes into exactly
/// one of these shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Any integer code (signed or unsigned, 8 to 32 bits, UVARI, ORIGIN, STATUS).
    Int(i64),
    /// Any single real: IEEE, IBM, VAX and the LIS fixed and floating codes.
    Float(f64),
    /// A real with one or two bounds (FSING1, FSING2, FDOUB1, FDOUB2).
    Validated { value: f64, bounds: Vec<f64> },
    Complex { re: f64, im: f64 },
    /// IDENT, ASCII, UNITS and LIS code 65. Kept as raw bytes.
    Text(Vec<u8>),
    DateTime(DateTime),
    ObName(ObName),
    ObjRef(ObjRef),
    AttRef(AttRef),
    /// LIS dipmeter codes 130 and 234: one byte per sub-channel sample.
    Dipmeter(Vec<u8>),
}

impl Value {
    /// Numeric view of the value, if it has one.
    ///
    /// Validated values report their central value and complex values their
    /// real part.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Validated { value, .. } => Some(*value),
            Value::Complex { re, .. } => Some(*re),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[u8]> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_obname(&self) -> Option<&ObName> {
        match self {
            Value::ObName(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Validated { value, bounds } => {
                write!(f, "{}", value)?;
                for b in bounds {
                    write!(f, " +/- {}", b)?;
                }
                Ok(())
            }
            Value::Complex { re, im } => write!(f, "{}{:+}i", re, im),
            Value::Text(v) => f.write_str(&display_text(v)),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::ObName(v) => write!(f, "{}", v),
            Value::ObjRef(v) => write!(f, "{} {}", display_text(&v.type_ident), v.name),
            Value::AttRef(v) => write!(
                f,
                "{} {} {}",
                display_text(&v.type_ident),
                v.name,
                display_text(&v.label)
            ),
            Value::Dipmeter(v) => f.write_str(&hex::encode(v)),
        }
    }
}

/// Capability for reporting scan progress.
///
/// Long scans call [`ProgressSink::record`] with the current byte position and
/// the total; the core never touches any process-wide state itself.
pub trait ProgressSink {
    fn record(&mut self, position: u64, total: u64);
}

/// A sink that discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn record(&mut self, _position: u64, _total: u64) {}
}
