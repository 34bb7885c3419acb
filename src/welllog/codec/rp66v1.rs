//! RP66V1 representation codes 1 to 27.
//!
//! Values are read from a [`LogicalData`] since UVARI, IDENT, ASCII and the
//! compound name codes are variable length. [`decode`] is the byte slice
//! entry point and [`encode`] the inverse.
//!
//! # Numeric formats
//!
//! ```text
//! FSHORT  2 bytes  12 bit mantissa, 4 bit exponent (same as LIS code 49)
//! FSINGL  4 bytes  IEEE single
//! ISINGL  4 bytes  IBM System/360: sign, excess-64 hex exponent, 24 bit fraction
//! VSINGL  4 bytes  VAX F: byte swapped pairs, excess-128 exponent, hidden bit
//! FDOUBL  8 bytes  IEEE double
//! ```

use byteorder::{BigEndian, ByteOrder};

use super::lis::{from49, to49};
use crate::welllog::cursor::LogicalData;
use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::{AttRef, DateTime, ObName, ObjRef, Value};
use crate::welllog::utils::{frexp, ldexp};

use super::{ABSENT_FLOAT, ABSENT_INT};

pub const FSHORT: u8 = 1;
pub const FSINGL: u8 = 2;
pub const FSING1: u8 = 3;
pub const FSING2: u8 = 4;
pub const ISINGL: u8 = 5;
pub const VSINGL: u8 = 6;
pub const FDOUBL: u8 = 7;
pub const FDOUB1: u8 = 8;
pub const FDOUB2: u8 = 9;
pub const CSINGL: u8 = 10;
pub const CDOUBL: u8 = 11;
pub const SSHORT: u8 = 12;
pub const SNORM: u8 = 13;
pub const SLONG: u8 = 14;
pub const USHORT: u8 = 15;
pub const UNORM: u8 = 16;
pub const ULONG: u8 = 17;
pub const UVARI: u8 = 18;
pub const IDENT: u8 = 19;
pub const ASCII: u8 = 20;
pub const DTIME: u8 = 21;
pub const ORIGIN: u8 = 22;
pub const OBNAME: u8 = 23;
pub const OBJREF: u8 = 24;
pub const ATTREF: u8 = 25;
pub const STATUS: u8 = 26;
pub const UNITS: u8 = 27;

const NAMES: [&str; 27] = [
    "FSHORT", "FSINGL", "FSING1", "FSING2", "ISINGL", "VSINGL", "FDOUBL", "FDOUB1", "FDOUB2",
    "CSINGL", "CDOUBL", "SSHORT", "SNORM", "SLONG", "USHORT", "UNORM", "ULONG", "UVARI", "IDENT",
    "ASCII", "DTIME", "ORIGIN", "OBNAME", "OBJREF", "ATTREF", "STATUS", "UNITS",
];

/// Largest value UVARI can carry.
pub const UVARI_MAX: u32 = (1 << 30) - 1;

/// Absent value selection for frame data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericCategory {
    None,
    Integer,
    Float,
}

pub fn name(code: u8) -> Option<&'static str> {
    match code {
        1..=27 => Some(NAMES[code as usize - 1]),
        _ => None,
    }
}

/// Byte width of a fixed length code, `None` for variable length codes.
///
/// # Errors
/// `UnsupportedRepCode` outside 1..=27.
pub fn size_of(code: u8) -> Result<Option<usize>> {
    Ok(match code {
        FSHORT => Some(2),
        FSINGL => Some(4),
        FSING1 => Some(8),
        FSING2 => Some(12),
        ISINGL | VSINGL => Some(4),
        FDOUBL => Some(8),
        FDOUB1 => Some(16),
        FDOUB2 => Some(24),
        CSINGL => Some(8),
        CDOUBL => Some(16),
        SSHORT => Some(1),
        SNORM => Some(2),
        SLONG => Some(4),
        USHORT => Some(1),
        UNORM => Some(2),
        ULONG => Some(4),
        DTIME => Some(8),
        STATUS => Some(1),
        UVARI | IDENT | ASCII | ORIGIN | OBNAME | OBJREF | ATTREF | UNITS => None,
        other => return Err(WellLogError::UnsupportedRepCode(other)),
    })
}

pub fn category(code: u8) -> NumericCategory {
    match code {
        FSHORT | FSINGL | ISINGL | VSINGL | FDOUBL => NumericCategory::Float,
        SSHORT..=UVARI => NumericCategory::Integer,
        _ => NumericCategory::None,
    }
}

/// The absent value a frame channel of this code uses, if any.
pub fn absent_value(code: u8) -> Option<f64> {
    match category(code) {
        NumericCategory::Float => Some(ABSENT_FLOAT),
        NumericCategory::Integer => Some(ABSENT_INT as f64),
        NumericCategory::None => None,
    }
}

// ---------- Scalar bit conversions ----------

/// IBM System/360 single precision.
pub fn from_isingl(word: u32) -> f64 {
    let fraction = (word & 0x00FF_FFFF) as f64 / 16_777_216.0;
    let exponent = ((word >> 24) & 0x7F) as i32 - 64;
    let value = ldexp(fraction, 4 * exponent);
    if word & 0x8000_0000 != 0 {
        -value
    } else {
        value
    }
}

pub fn to_isingl(value: f64) -> Result<u32> {
    if !value.is_finite() {
        return Err(out_of_range(ISINGL, value));
    }
    if value == 0.0 {
        return Ok(0);
    }
    let sign = if value < 0.0 { 0x8000_0000 } else { 0 };
    let mut fraction = value.abs();
    let mut exponent: i32 = 64;
    while fraction >= 1.0 {
        fraction /= 16.0;
        exponent += 1;
    }
    while fraction < 1.0 / 16.0 {
        fraction *= 16.0;
        exponent -= 1;
    }
    let mut mantissa = (fraction * 16_777_216.0).round() as u32;
    if mantissa >= 1 << 24 {
        mantissa >>= 4;
        exponent += 1;
    }
    if !(0..=127).contains(&exponent) {
        return Err(out_of_range(ISINGL, value));
    }
    Ok(sign | ((exponent as u32) << 24) | mantissa)
}

/// VAX F floating point from its four bytes in file order.
pub fn from_vsingl(bytes: [u8; 4]) -> f64 {
    let sign = bytes[1] & 0x80 != 0;
    let exponent = (((bytes[1] & 0x7F) as i32) << 1) | (bytes[0] >> 7) as i32;
    if exponent == 0 && !sign {
        return 0.0;
    }
    let fraction =
        (((bytes[0] & 0x7F) as u32) << 16) | ((bytes[3] as u32) << 8) | bytes[2] as u32;
    let value = ldexp(0.5 + fraction as f64 / 16_777_216.0, exponent - 128);
    if sign {
        -value
    } else {
        value
    }
}

pub fn to_vsingl(value: f64) -> Result<[u8; 4]> {
    if !value.is_finite() {
        return Err(out_of_range(VSINGL, value));
    }
    if value == 0.0 {
        return Ok([0; 4]);
    }
    let (fraction, exponent) = frexp(value.abs());
    let mut mantissa = ((fraction - 0.5) * 16_777_216.0).round() as u32;
    let mut exponent = exponent + 128;
    if mantissa >= 1 << 23 {
        mantissa = 0;
        exponent += 1;
    }
    if !(1..=255).contains(&exponent) {
        return Err(out_of_range(VSINGL, value));
    }
    let sign: u8 = if value < 0.0 { 0x80 } else { 0 };
    let exponent = exponent as u32;
    Ok([
        (((mantissa >> 16) & 0x7F) as u8) | (((exponent & 1) << 7) as u8),
        sign | (exponent >> 1) as u8,
        (mantissa & 0xFF) as u8,
        ((mantissa >> 8) & 0xFF) as u8,
    ])
}

// ---------- Readers over logical data ----------

pub fn read_uvari(ld: &mut LogicalData) -> Result<u32> {
    let first = ld.read()?;
    if first & 0x80 == 0 {
        return Ok(first as u32);
    }
    if first & 0x40 == 0 {
        let second = ld.read()?;
        return Ok((((first & 0x7F) as u32) << 8) | second as u32);
    }
    let rest = ld.chunk(3)?;
    Ok((((first & 0x3F) as u32) << 24)
        | ((rest[0] as u32) << 16)
        | ((rest[1] as u32) << 8)
        | rest[2] as u32)
}

/// One length byte followed by that many bytes. Used by IDENT and UNITS.
pub fn read_ident(ld: &mut LogicalData) -> Result<Vec<u8>> {
    let length = ld.read()? as usize;
    Ok(ld.chunk(length)?.to_vec())
}

pub fn read_ascii(ld: &mut LogicalData) -> Result<Vec<u8>> {
    let length = read_uvari(ld)? as usize;
    Ok(ld.chunk(length)?.to_vec())
}

pub fn read_obname(ld: &mut LogicalData) -> Result<ObName> {
    let origin = read_uvari(ld)?;
    let copy = ld.read()?;
    let ident = read_ident(ld)?;
    Ok(ObName {
        origin,
        copy,
        ident,
    })
}

fn dtime_from(b: &[u8]) -> DateTime {
    DateTime {
        year: b[0] as u16 + 1900,
        tz: (b[1] >> 4) & 0x0F,
        month: b[1] & 0x0F,
        day: b[2],
        hour: b[3],
        minute: b[4],
        second: b[5],
        millisecond: BigEndian::read_u16(&b[6..8]),
    }
}

fn read_fixed(code: u8, ld: &mut LogicalData, size: usize) -> Result<&[u8]> {
    let found = ld.remain();
    ld.chunk(size).map_err(|_| WellLogError::TruncatedValue {
        code,
        expected: size,
        found,
    })
}

/// Read one value of `code`.
///
/// # Errors
/// `UnsupportedRepCode` for codes outside 1..=27, `TruncatedValue` if the
/// logical data runs out mid value.
pub fn read(code: u8, ld: &mut LogicalData) -> Result<Value> {
    if let Some(size) = size_of(code)? {
        let b = read_fixed(code, ld, size)?;
        return Ok(decode_fixed(code, b));
    }
    let found = ld.remain();
    let truncated = |e: WellLogError| match e {
        WellLogError::Eof { wanted, .. } => WellLogError::TruncatedValue {
            code,
            expected: wanted,
            found,
        },
        other => other,
    };
    let value = match code {
        UVARI | ORIGIN => Value::Int(read_uvari(ld).map_err(truncated)? as i64),
        IDENT | UNITS => Value::Text(read_ident(ld).map_err(truncated)?),
        ASCII => Value::Text(read_ascii(ld).map_err(truncated)?),
        OBNAME => Value::ObName(read_obname(ld).map_err(truncated)?),
        OBJREF => {
            let type_ident = read_ident(ld).map_err(truncated)?;
            let name = read_obname(ld).map_err(truncated)?;
            Value::ObjRef(ObjRef { type_ident, name })
        }
        ATTREF => {
            let type_ident = read_ident(ld).map_err(truncated)?;
            let name = read_obname(ld).map_err(truncated)?;
            let label = read_ident(ld).map_err(truncated)?;
            Value::AttRef(AttRef {
                type_ident,
                name,
                label,
            })
        }
        other => return Err(WellLogError::UnsupportedRepCode(other)),
    };
    Ok(value)
}

/// Read one value as a number, for frame data.
pub fn read_f64(code: u8, ld: &mut LogicalData) -> Result<f64> {
    read(code, ld)?
        .as_f64()
        .ok_or(WellLogError::UnsupportedRepCode(code))
}

/// Step over one value without building it.
pub fn skip(code: u8, ld: &mut LogicalData) -> Result<()> {
    match size_of(code)? {
        Some(size) => read_fixed(code, ld, size).map(|_| ()),
        None => read(code, ld).map(|_| ()),
    }
}

fn decode_fixed(code: u8, b: &[u8]) -> Value {
    let f32_at = |i: usize| BigEndian::read_f32(&b[i..i + 4]) as f64;
    let f64_at = |i: usize| BigEndian::read_f64(&b[i..i + 8]);
    match code {
        FSHORT => Value::Float(from49(BigEndian::read_u16(b))),
        FSINGL => Value::Float(f32_at(0)),
        FSING1 => Value::Validated {
            value: f32_at(0),
            bounds: vec![f32_at(4)],
        },
        FSING2 => Value::Validated {
            value: f32_at(0),
            bounds: vec![f32_at(4), f32_at(8)],
        },
        ISINGL => Value::Float(from_isingl(BigEndian::read_u32(b))),
        VSINGL => Value::Float(from_vsingl([b[0], b[1], b[2], b[3]])),
        FDOUBL => Value::Float(f64_at(0)),
        FDOUB1 => Value::Validated {
            value: f64_at(0),
            bounds: vec![f64_at(8)],
        },
        FDOUB2 => Value::Validated {
            value: f64_at(0),
            bounds: vec![f64_at(8), f64_at(16)],
        },
        CSINGL => Value::Complex {
            re: f32_at(0),
            im: f32_at(4),
        },
        CDOUBL => Value::Complex {
            re: f64_at(0),
            im: f64_at(8),
        },
        SSHORT => Value::Int(b[0] as i8 as i64),
        SNORM => Value::Int(BigEndian::read_i16(b) as i64),
        SLONG => Value::Int(BigEndian::read_i32(b) as i64),
        USHORT | STATUS => Value::Int(b[0] as i64),
        UNORM => Value::Int(BigEndian::read_u16(b) as i64),
        ULONG => Value::Int(BigEndian::read_u32(b) as i64),
        // DTIME, the only remaining fixed code.
        _ => Value::DateTime(dtime_from(b)),
    }
}

/// Decode a single value from the start of `bytes`.
pub fn decode(code: u8, bytes: &[u8]) -> Result<Value> {
    let mut ld = LogicalData::new(bytes.to_vec());
    read(code, &mut ld)
}

// ---------- Writers ----------

pub fn write_uvari(value: u32) -> Result<Vec<u8>> {
    match value {
        0..=0x7F => Ok(vec![value as u8]),
        0x80..=0x3FFF => Ok(vec![0x80 | (value >> 8) as u8, value as u8]),
        0x4000..=UVARI_MAX => {
            let mut out = vec![0u8; 4];
            BigEndian::write_u32(&mut out, value | 0xC000_0000);
            Ok(out)
        }
        _ => Err(out_of_range(UVARI, value)),
    }
}

pub fn write_ident(bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.len() > u8::MAX as usize {
        return Err(out_of_range(IDENT, format!("{} byte identifier", bytes.len())));
    }
    let mut out = Vec::with_capacity(bytes.len() + 1);
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    Ok(out)
}

pub fn write_ascii(bytes: &[u8]) -> Result<Vec<u8>> {
    let length = u32::try_from(bytes.len())
        .map_err(|_| out_of_range(ASCII, format!("{} byte string", bytes.len())))?;
    let mut out = write_uvari(length)?;
    out.extend_from_slice(bytes);
    Ok(out)
}

pub fn write_obname(name: &ObName) -> Result<Vec<u8>> {
    let mut out = write_uvari(name.origin)?;
    out.push(name.copy);
    out.extend(write_ident(&name.ident)?);
    Ok(out)
}

fn write_f32(code: u8, value: f64, out: &mut Vec<u8>) -> Result<()> {
    if value.is_finite() && value.abs() > f32::MAX as f64 {
        return Err(out_of_range(code, value));
    }
    let mut buf = [0u8; 4];
    BigEndian::write_f32(&mut buf, value as f32);
    out.extend_from_slice(&buf);
    Ok(())
}

fn write_f64(value: f64, out: &mut Vec<u8>) {
    let mut buf = [0u8; 8];
    BigEndian::write_f64(&mut buf, value);
    out.extend_from_slice(&buf);
}

fn integral(code: u8, value: &Value, min: i64, max: i64) -> Result<i64> {
    let v = match value {
        Value::Int(v) => *v,
        Value::Float(f) if f.fract() == 0.0 && f.is_finite() => *f as i64,
        other => return Err(out_of_range(code, format!("{:?}", other))),
    };
    if v < min || v > max {
        return Err(out_of_range(code, v));
    }
    Ok(v)
}

fn float(code: u8, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| out_of_range(code, format!("{:?}", value)))
}

fn validated(code: u8, value: &Value, bound_count: usize) -> Result<(f64, Vec<f64>)> {
    match value {
        Value::Validated { value, bounds } if bounds.len() == bound_count => {
            Ok((*value, bounds.clone()))
        }
        other => Err(out_of_range(code, format!("{:?}", other))),
    }
}

fn complex(code: u8, value: &Value) -> Result<(f64, f64)> {
    match value {
        Value::Complex { re, im } => Ok((*re, *im)),
        other => Err(out_of_range(code, format!("{:?}", other))),
    }
}

fn text(code: u8, value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Text(t) => Ok(t.clone()),
        other => Err(out_of_range(code, format!("{:?}", other))),
    }
}

fn obname(code: u8, value: &Value) -> Result<ObName> {
    match value {
        Value::ObName(n) => Ok(n.clone()),
        other => Err(out_of_range(code, format!("{:?}", other))),
    }
}

/// Encode `value` as `code`.
///
/// # Errors
/// `ValueOutOfRange` if the value has the wrong shape for the code or does not
/// fit it, `UnsupportedRepCode` outside 1..=27.
pub fn encode(value: &Value, code: u8) -> Result<Vec<u8>> {
    size_of(code)?;
    let mut out = Vec::new();
    match code {
        FSHORT => {
            let mut buf = [0u8; 2];
            BigEndian::write_u16(&mut buf, to49(float(code, value)?)?);
            out.extend_from_slice(&buf);
        }
        FSINGL => write_f32(code, float(code, value)?, &mut out)?,
        FSING1 | FSING2 => {
            let (v, bounds) = validated(code, value, if code == FSING1 { 1 } else { 2 })?;
            write_f32(code, v, &mut out)?;
            for b in bounds {
                write_f32(code, b, &mut out)?;
            }
        }
        ISINGL => {
            let mut buf = [0u8; 4];
            BigEndian::write_u32(&mut buf, to_isingl(float(code, value)?)?);
            out.extend_from_slice(&buf);
        }
        VSINGL => out.extend_from_slice(&to_vsingl(float(code, value)?)?),
        FDOUBL => write_f64(float(code, value)?, &mut out),
        FDOUB1 | FDOUB2 => {
            let (v, bounds) = validated(code, value, if code == FDOUB1 { 1 } else { 2 })?;
            write_f64(v, &mut out);
            for b in bounds {
                write_f64(b, &mut out);
            }
        }
        CSINGL => {
            let (re, im) = complex(code, value)?;
            write_f32(code, re, &mut out)?;
            write_f32(code, im, &mut out)?;
        }
        CDOUBL => {
            let (re, im) = complex(code, value)?;
            write_f64(re, &mut out);
            write_f64(im, &mut out);
        }
        SSHORT => out.push(integral(code, value, i8::MIN as i64, i8::MAX as i64)? as i8 as u8),
        SNORM => {
            let v = integral(code, value, i16::MIN as i64, i16::MAX as i64)?;
            out.extend_from_slice(&(v as i16).to_be_bytes());
        }
        SLONG => {
            let v = integral(code, value, i32::MIN as i64, i32::MAX as i64)?;
            out.extend_from_slice(&(v as i32).to_be_bytes());
        }
        USHORT => out.push(integral(code, value, 0, u8::MAX as i64)? as u8),
        UNORM => {
            let v = integral(code, value, 0, u16::MAX as i64)?;
            out.extend_from_slice(&(v as u16).to_be_bytes());
        }
        ULONG => {
            let v = integral(code, value, 0, u32::MAX as i64)?;
            out.extend_from_slice(&(v as u32).to_be_bytes());
        }
        UVARI | ORIGIN => out = write_uvari(integral(code, value, 0, UVARI_MAX as i64)? as u32)?,
        IDENT | UNITS => out = write_ident(&text(code, value)?)?,
        ASCII => out = write_ascii(&text(code, value)?)?,
        DTIME => match value {
            Value::DateTime(dt) if (1900..=2155).contains(&dt.year) && dt.tz < 16 && dt.month < 16 => {
                out.push((dt.year - 1900) as u8);
                out.push((dt.tz << 4) | dt.month);
                out.extend_from_slice(&[dt.day, dt.hour, dt.minute, dt.second]);
                out.extend_from_slice(&dt.millisecond.to_be_bytes());
            }
            other => return Err(out_of_range(code, format!("{:?}", other))),
        },
        OBNAME => out = write_obname(&obname(code, value)?)?,
        OBJREF => match value {
            Value::ObjRef(r) => {
                out = write_ident(&r.type_ident)?;
                out.extend(write_obname(&r.name)?);
            }
            other => return Err(out_of_range(code, format!("{:?}", other))),
        },
        ATTREF => match value {
            Value::AttRef(r) => {
                out = write_ident(&r.type_ident)?;
                out.extend(write_obname(&r.name)?);
                out.extend(write_ident(&r.label)?);
            }
            other => return Err(out_of_range(code, format!("{:?}", other))),
        },
        _ => out.push(integral(code, value, 0, 1)? as u8),
    }
    Ok(out)
}

fn out_of_range(code: u8, value: impl ToString) -> WellLogError {
    WellLogError::ValueOutOfRange {
        code,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ibm_and_vax_reference_values() {
        assert_eq!(from_isingl(0x4299_0000), 153.0);
        assert_eq!(from_isingl(0xC299_0000), -153.0);
        assert_eq!(to_isingl(153.0).unwrap(), 0x4299_0000);
        assert_eq!(from_vsingl([0x19, 0x44, 0x00, 0x00]), 153.0);
        assert_eq!(from_vsingl([0x80, 0x40, 0x00, 0x00]), 1.0);
        assert_eq!(to_vsingl(153.0).unwrap(), [0x19, 0x44, 0x00, 0x00]);
        assert_eq!(to_vsingl(-1.0).unwrap(), [0x80, 0xC0, 0x00, 0x00]);
    }

    #[test]
    fn fixed_codes_round_trip() {
        let validated = |value: f64, bounds: &[f64]| Value::Validated {
            value,
            bounds: bounds.to_vec(),
        };
        let cases = vec![
            (FSHORT, vec![Value::Float(153.0), Value::Float(-153.0), Value::Float(0.5), Value::Float(12.25)]),
            (FSINGL, vec![Value::Float(153.0), Value::Float(-2.75), Value::Float(0.15625)]),
            (FSING1, vec![validated(12.25, &[0.5])]),
            (FSING2, vec![validated(-2.75, &[0.25, 1.5])]),
            (ISINGL, vec![Value::Float(153.0), Value::Float(-153.0), Value::Float(0.5), Value::Float(-2.75)]),
            (VSINGL, vec![Value::Float(153.0), Value::Float(-1.0), Value::Float(0.5), Value::Float(12.25)]),
            (FDOUBL, vec![Value::Float(0.1), Value::Float(-999.25), Value::Float(2954.199999999941)]),
            (FDOUB1, vec![validated(0.1, &[0.01])]),
            (FDOUB2, vec![validated(-0.3, &[0.01, 0.02])]),
            (CSINGL, vec![Value::Complex { re: 1.5, im: -2.25 }]),
            (CDOUBL, vec![Value::Complex { re: 0.1, im: -0.2 }]),
            (SSHORT, vec![Value::Int(-128), Value::Int(0), Value::Int(127)]),
            (SNORM, vec![Value::Int(i16::MIN as i64), Value::Int(-999), Value::Int(i16::MAX as i64)]),
            (SLONG, vec![Value::Int(i32::MIN as i64), Value::Int(i32::MAX as i64)]),
            (USHORT, vec![Value::Int(0), Value::Int(255)]),
            (UNORM, vec![Value::Int(0), Value::Int(u16::MAX as i64)]),
            (ULONG, vec![Value::Int(0), Value::Int(u32::MAX as i64)]),
        ];
        for (code, values) in cases {
            for value in values {
                let bytes = encode(&value, code).unwrap();
                assert_eq!(Some(bytes.len()), size_of(code).unwrap(), "{}", name(code).unwrap());
                assert_eq!(decode(code, &bytes).unwrap(), value, "{}", name(code).unwrap());
            }
        }
    }

    #[test]
    fn out_of_range_integers() {
        for (code, value) in [(SSHORT, 128), (SNORM, -32769), (USHORT, -1), (UNORM, 65536), (ULONG, -1)] {
            assert!(matches!(
                encode(&Value::Int(value), code),
                Err(WellLogError::ValueOutOfRange { .. })
            ));
        }
        assert!(encode(&Value::Float(0.5), SLONG).is_err());
    }

    #[test]
    fn uvari_widths() {
        assert_eq!(write_uvari(0x7F).unwrap(), vec![0x7F]);
        assert_eq!(write_uvari(0x80).unwrap(), vec![0x80, 0x80]);
        assert_eq!(write_uvari(0x4000).unwrap(), vec![0xC0, 0x00, 0x40, 0x00]);
        assert!(write_uvari(1 << 30).is_err());
        let mut ld = LogicalData::new(vec![0xC0, 0x00, 0x40, 0x00, 0x81, 0x00]);
        assert_eq!(read_uvari(&mut ld).unwrap(), 0x4000);
        assert_eq!(read_uvari(&mut ld).unwrap(), 0x100);
        assert!(!ld.has_remaining());
    }

    #[test]
    fn truncated_and_unknown() {
        assert!(matches!(
            decode(FDOUBL, &[0; 4]),
            Err(WellLogError::TruncatedValue {
                code: FDOUBL,
                expected: 8,
                found: 4
            })
        ));
        assert!(matches!(
            decode(IDENT, &[5, b'A']),
            Err(WellLogError::TruncatedValue { code: IDENT, .. })
        ));
        assert!(matches!(decode(28, &[0]), Err(WellLogError::UnsupportedRepCode(28))));
        assert!(matches!(
            encode(&Value::Int(256), USHORT),
            Err(WellLogError::ValueOutOfRange { .. })
        ));
    }
}
