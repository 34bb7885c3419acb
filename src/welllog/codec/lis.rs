//! LIS79 representation codes.
//!
//! | Code | Bytes | Meaning                                   |
//! |------|-------|-------------------------------------------|
//! | 49   | 2     | 16 bit floating point, 12 bit mantissa    |
//! | 50   | 4     | 32 bit low resolution floating point      |
//! | 56   | 1     | signed byte                               |
//! | 65   | var   | string                                    |
//! | 66   | 1     | unsigned byte                             |
//! | 68   | 4     | 32 bit floating point                     |
//! | 70   | 4     | 32 bit fixed point                        |
//! | 73   | 4     | 32 bit signed integer                     |
//! | 77   | 1     | byte mask                                 |
//! | 79   | 2     | 16 bit signed integer                     |
//! | 130  | 80    | dipmeter edit tape, 5 fast sub-channels   |
//! | 234  | 90    | CSU dipmeter, 5 fast + 10 slow sub-channels |

use byteorder::{BigEndian, ByteOrder};
use log::trace;

use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::types::models::Value;
use crate::welllog::utils::{frexp, ldexp};

pub const RC_49: u8 = 49;
pub const RC_50: u8 = 50;
pub const RC_56: u8 = 56;
pub const RC_TYPE_TEXT: u8 = 65;
pub const RC_66: u8 = 66;
pub const RC_68: u8 = 68;
pub const RC_70: u8 = 70;
pub const RC_73: u8 = 73;
pub const RC_77: u8 = 77;
pub const RC_79: u8 = 79;
pub const DIPMETER_EDIT_TAPE_REP_CODE: u8 = 130;
pub const DIPMETER_CSU_FIELD_TAPE_REP_CODE: u8 = 234;

pub const DIPMETER_NUM_FAST_CHANNELS: usize = 5;
pub const DIPMETER_NUM_SLOW_CHANNELS: usize = 10;
pub const DIPMETER_FAST_CHANNEL_SUPER_SAMPLES: usize = 16;
pub const DIPMETER_SIZE_FAST_CHANNELS: usize =
    DIPMETER_NUM_FAST_CHANNELS * DIPMETER_FAST_CHANNEL_SUPER_SAMPLES;
pub const DIPMETER_LIS_SIZE_130: usize = DIPMETER_SIZE_FAST_CHANNELS;
pub const DIPMETER_LIS_SIZE_234: usize = DIPMETER_SIZE_FAST_CHANNELS + DIPMETER_NUM_SLOW_CHANNELS;

/// Synthetic mnemonics of the dipmeter sub-channels, fast channels first.
pub const DIPMETER_SUB_CHANNEL_NAMES: [&[u8; 4]; 15] = [
    b"FC0 ", b"FC1 ", b"FC2 ", b"FC3 ", b"FC4 ", b"STAT", b"REF ", b"REFC", b"EMEX", b"PADP",
    b"TEMP", b"FEP1", b"FEP2", b"RAC1", b"RAC2",
];

/// Code 68 word for zero.
pub const RC_68_CODE_ZERO: u32 = 0x4000_0000;
/// Code 68 word for the most negative value.
pub const RC_68_CODE_MIN: u32 = 0xFFC0_0000;
/// Code 68 word for the most positive value.
pub const RC_68_CODE_MAX: u32 = 0x7FFF_FFFF;

pub fn is_dipmeter(code: u8) -> bool {
    code == DIPMETER_EDIT_TAPE_REP_CODE || code == DIPMETER_CSU_FIELD_TAPE_REP_CODE
}

pub fn is_int(code: u8) -> bool {
    matches!(code, RC_56 | RC_66 | RC_73 | RC_77 | RC_79)
}

/// Size in bytes of one instance of `code`; zero means variable length (65).
pub fn lis_size(code: u8) -> Result<usize> {
    Ok(match code {
        RC_49 => 2,
        RC_50 => 4,
        RC_56 => 1,
        RC_TYPE_TEXT => 0,
        RC_66 => 1,
        RC_68 => 4,
        RC_70 => 4,
        RC_73 => 4,
        RC_77 => 1,
        RC_79 => 2,
        DIPMETER_EDIT_TAPE_REP_CODE => DIPMETER_LIS_SIZE_130,
        DIPMETER_CSU_FIELD_TAPE_REP_CODE => DIPMETER_LIS_SIZE_234,
        other => return Err(WellLogError::UnsupportedRepCode(other)),
    })
}

/// Bytes per stored value. Differs from [`lis_size`] for dipmeter codes
/// where every sub-channel sample is one byte.
pub fn word_length(code: u8) -> Result<usize> {
    if is_dipmeter(code) {
        return Ok(1);
    }
    lis_size(code)
}

/// Code 49. +153 is `0x4C88`, -153 is `0xB388`.
pub fn from49(word: u16) -> f64 {
    let m = (word & 0xFFF0) as i16 as f64;
    ldexp(m / 32768.0, (word & 0xF) as i32)
}

/// Code 49 from a double, choosing the smallest exponent that keeps the
/// 12 bit mantissa in range.
pub fn to49(value: f64) -> Result<u16> {
    if !value.is_finite() {
        return Err(out_of_range(RC_49, value));
    }
    for exponent in 0..16 {
        let m = (value * ldexp(1.0, 11 - exponent)).round();
        if (-2048.0..=2047.0).contains(&m) {
            let m = m as i16 as u16;
            return Ok(((m & 0xFFF) << 4) | exponent as u16);
        }
    }
    Err(out_of_range(RC_49, value))
}

/// Code 50: high word is a signed exponent, low word a signed mantissa
/// scaled by 2^-15. +153 is `0x00084C80`, -153 is `0x0008B380`.
pub fn from50(word: u32) -> f64 {
    let exponent = (word >> 16) as u16 as i16 as i32;
    let mantissa = (word & 0xFFFF) as u16 as i16 as f64;
    ldexp(mantissa, exponent - 15)
}

pub fn to50(value: f64) -> Result<u32> {
    if !value.is_finite() {
        return Err(out_of_range(RC_50, value));
    }
    if value == 0.0 {
        return Ok(0);
    }
    let (fraction, mut exponent) = frexp(value);
    let mut mantissa = (fraction * 32768.0).round();
    if mantissa.abs() >= 32768.0 {
        mantissa /= 2.0;
        exponent += 1;
    }
    if exponent > i16::MAX as i32 || exponent < i16::MIN as i32 {
        return Err(out_of_range(RC_50, value));
    }
    let high = exponent as i16 as u16 as u32;
    let low = mantissa as i16 as u16 as u32;
    Ok((high << 16) | low)
}

/// Code 68, the common 32 bit LIS float. -153 is `0xBBB38000`.
pub fn from68(word: u32) -> f64 {
    let is_negative = word & 0x8000_0000 != 0;
    let fraction = (word & 0x007F_FFFF) as i64;
    let mantissa = if is_negative {
        fraction - (1 << 23)
    } else {
        fraction
    };
    let raw_exponent = ((word & 0x7F80_0000) >> 23) as i32;
    // Mantissa is an integer here so the excess-128 exponent is shifted by 23.
    let exponent = if is_negative {
        104 - raw_exponent
    } else {
        raw_exponent - 151
    };
    ldexp(mantissa as f64, exponent)
}

/// Code 68 from a double. Overflow clamps to the extreme codes and underflow
/// to zero.
pub fn to68(value: f64) -> u32 {
    let (mut mantissa, mut exponent) = frexp(value);
    if exponent <= -(128 + 23) {
        trace!("to68({}) clamping to zero", value);
        return RC_68_CODE_ZERO;
    }
    if exponent > 127 {
        return if value < 0.0 {
            RC_68_CODE_MIN
        } else {
            RC_68_CODE_MAX
        };
    }
    if exponent < -128 {
        mantissa /= ldexp(1.0, -128 - exponent);
        exponent = -128;
    }
    let (sign, stored) = if value < 0.0 {
        (1u32, 127 - exponent)
    } else {
        (0u32, exponent - 128)
    };
    let mut word = (sign << 8) | (stored as u32 & 0xFF);
    word <<= 23;
    word | (((mantissa * ldexp(1.0, 23)) as i64) & 0x007F_FFFF) as u32
}

/// Code 70: signed 16.16 fixed point.
pub fn from70(word: u32) -> f64 {
    word as i32 as f64 / 65536.0
}

pub fn to70(value: f64) -> Result<u32> {
    let scaled = (value * 65536.0).round();
    if !scaled.is_finite() || scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
        return Err(out_of_range(RC_70, value));
    }
    Ok(scaled as i32 as u32)
}

fn check_len(code: u8, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() < expected {
        return Err(WellLogError::TruncatedValue {
            code,
            expected,
            found: bytes.len(),
        });
    }
    Ok(())
}

fn out_of_range(code: u8, value: impl ToString) -> WellLogError {
    WellLogError::ValueOutOfRange {
        code,
        value: value.to_string(),
    }
}

/// Decode a single value. Code 65 takes all of `bytes`.
///
/// # Errors
/// `UnsupportedRepCode` for unknown codes, `TruncatedValue` if `bytes` is
/// shorter than the code's size.
pub fn decode(code: u8, bytes: &[u8]) -> Result<Value> {
    if code == RC_TYPE_TEXT {
        return Ok(Value::Text(bytes.to_vec()));
    }
    let size = lis_size(code)?;
    check_len(code, bytes, size)?;
    Ok(match code {
        RC_49 => Value::Float(from49(BigEndian::read_u16(bytes))),
        RC_50 => Value::Float(from50(BigEndian::read_u32(bytes))),
        RC_56 => Value::Int(bytes[0] as i8 as i64),
        RC_66 | RC_77 => Value::Int(bytes[0] as i64),
        RC_68 => Value::Float(from68(BigEndian::read_u32(bytes))),
        RC_70 => Value::Float(from70(BigEndian::read_u32(bytes))),
        RC_73 => Value::Int(BigEndian::read_i32(bytes) as i64),
        RC_79 => Value::Int(BigEndian::read_i16(bytes) as i64),
        _ => Value::Dipmeter(bytes[..size].to_vec()),
    })
}

/// Decode one frame word as a double.
///
/// For dipmeter codes a word is a single sub-channel byte.
pub fn read_f64(code: u8, bytes: &[u8]) -> Result<f64> {
    if is_dipmeter(code) {
        check_len(code, bytes, 1)?;
        return Ok(bytes[0] as f64);
    }
    decode(code, bytes)?
        .as_f64()
        .ok_or(WellLogError::UnsupportedRepCode(code))
}

/// Encode a value. Integer codes accept integral floats.
///
/// # Errors
/// `ValueOutOfRange` if the value does not fit the code.
pub fn encode(value: &Value, code: u8) -> Result<Vec<u8>> {
    match (code, value) {
        (RC_TYPE_TEXT, Value::Text(text)) => Ok(text.clone()),
        (c, Value::Dipmeter(bytes)) if is_dipmeter(c) => {
            let size = lis_size(c)?;
            if bytes.len() != size {
                return Err(out_of_range(c, format!("{} dipmeter bytes", bytes.len())));
            }
            Ok(bytes.clone())
        }
        (c, v) => {
            let number = v
                .as_f64()
                .ok_or_else(|| out_of_range(c, format!("{:?}", v)))?;
            encode_f64(number, c)
        }
    }
}

/// Encode a number into a numeric code.
pub fn encode_f64(value: f64, code: u8) -> Result<Vec<u8>> {
    let mut out = vec![0u8; lis_size(code)?];
    match code {
        RC_49 => BigEndian::write_u16(&mut out, to49(value)?),
        RC_50 => BigEndian::write_u32(&mut out, to50(value)?),
        RC_68 => BigEndian::write_u32(&mut out, to68(value)),
        RC_70 => BigEndian::write_u32(&mut out, to70(value)?),
        RC_56 => out[0] = integral(code, value, i8::MIN as i64, i8::MAX as i64)? as i8 as u8,
        RC_66 | RC_77 => out[0] = integral(code, value, 0, u8::MAX as i64)? as u8,
        RC_73 => BigEndian::write_i32(
            &mut out,
            integral(code, value, i32::MIN as i64, i32::MAX as i64)? as i32,
        ),
        RC_79 => BigEndian::write_i16(
            &mut out,
            integral(code, value, i16::MIN as i64, i16::MAX as i64)? as i16,
        ),
        other => return Err(out_of_range(other, value)),
    }
    Ok(out)
}

fn integral(code: u8, value: f64, min: i64, max: i64) -> Result<i64> {
    if value.fract() != 0.0 || value < min as f64 || value > max as f64 {
        return Err(out_of_range(code, value));
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_words() {
        assert_eq!(to49(153.0).unwrap(), 0x4C88);
        assert_eq!(to49(-153.0).unwrap(), 0xB388);
        assert_eq!(from49(0x4C88), 153.0);
        assert_eq!(to50(153.0).unwrap(), 0x0008_4C80);
        assert_eq!(to50(-153.0).unwrap(), 0x0008_B380);
        assert_eq!(from50(0x0008_4C80), 153.0);
        assert_eq!(to68(153.0), 0x444C_8000);
        assert_eq!(to68(-153.0), 0xBBB3_8000);
        assert_eq!(from68(0xBBB3_8000), -153.0);
        assert_eq!(to68(0.0), RC_68_CODE_ZERO);
        assert_eq!(from68(RC_68_CODE_ZERO), 0.0);
    }

    #[test]
    fn numeric_codes_round_trip() {
        let cases: Vec<(u8, Vec<f64>)> = vec![
            (RC_49, vec![153.0, -153.0, 0.0, 1.0, -1.0, 0.5, -2.75, 12.25]),
            (RC_50, vec![153.0, -153.0, 0.0, 1.0, -1.0, 1000.25, -2.75, -999.25]),
            (RC_56, vec![-128.0, 0.0, 127.0]),
            (RC_66, vec![0.0, 255.0]),
            (RC_68, vec![153.0, -153.0, 0.0, 1.0, -1.0, 0.5, 1000.25, -999.25]),
            (RC_70, vec![0.0, 1000.25, -2.75, -999.25]),
            (RC_73, vec![i32::MIN as f64, -1.0, i32::MAX as f64]),
            (RC_77, vec![0.0, 0x81 as f64]),
            (RC_79, vec![i16::MIN as f64, -999.0, i16::MAX as f64]),
        ];
        for (code, values) in cases {
            for value in values {
                let bytes = encode_f64(value, code).unwrap();
                assert_eq!(bytes.len(), lis_size(code).unwrap());
                assert_eq!(read_f64(code, &bytes).unwrap(), value, "code {}", code);
                let decoded = decode(code, &bytes).unwrap();
                assert_eq!(encode(&decoded, code).unwrap(), bytes, "code {}", code);
            }
        }
    }

    #[test]
    fn unrepresentable_values() {
        assert!(matches!(to49(1.0e9), Err(WellLogError::ValueOutOfRange { code: RC_49, .. })));
        assert!(encode_f64(256.0, RC_66).is_err());
        assert!(encode_f64(1.5, RC_79).is_err());
        assert!(to70(1.0e12).is_err());
        assert_eq!(to68(f64::MAX), RC_68_CODE_MAX);
        assert_eq!(to68(-f64::MAX), RC_68_CODE_MIN);
    }

    #[test]
    fn dipmeter_and_text() {
        assert_eq!(lis_size(DIPMETER_EDIT_TAPE_REP_CODE).unwrap(), 80);
        assert_eq!(lis_size(DIPMETER_CSU_FIELD_TAPE_REP_CODE).unwrap(), 90);
        assert_eq!(word_length(DIPMETER_CSU_FIELD_TAPE_REP_CODE).unwrap(), 1);
        let bytes: Vec<u8> = (0..90).collect();
        assert_eq!(
            decode(DIPMETER_CSU_FIELD_TAPE_REP_CODE, &bytes).unwrap(),
            Value::Dipmeter(bytes.clone())
        );
        assert_eq!(read_f64(DIPMETER_EDIT_TAPE_REP_CODE, &[7]).unwrap(), 7.0);
        assert!(encode(&Value::Dipmeter(vec![0; 10]), DIPMETER_EDIT_TAPE_REP_CODE).is_err());
        assert_eq!(decode(RC_TYPE_TEXT, b"FEET").unwrap(), Value::Text(b"FEET".to_vec()));
        assert!(matches!(decode(RC_68, &[0x44, 0x4C]), Err(WellLogError::TruncatedValue { .. })));
        assert!(matches!(lis_size(99), Err(WellLogError::UnsupportedRepCode(99))));
    }
}
