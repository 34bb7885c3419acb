//! Length units found in DFSR entry blocks and DSB unit fields.
//!
//! Units are four byte, space padded mnemonics. Only length units are
//! converted; frame spacing and indirect X axis values are always lengths in
//! practice.

use crate::welllog::types::error::{Result, WellLogError};
use crate::welllog::utils::trimmed_text;

const TENTH_INCHES_PER_METRE: f64 = 1000.0 / 2.54;

pub const OPTICAL_FEET: &[u8; 4] = b"FEET";
pub const OPTICAL_METRES: &[u8; 4] = b"M   ";
pub const OPTICAL_TIME: &[u8; 4] = b"S   ";

fn strip(unit: &[u8]) -> &[u8] {
    let end = unit
        .iter()
        .rposition(|b| *b != b' ' && *b != 0)
        .map_or(0, |p| p + 1);
    &unit[..end]
}

/// Size of one `unit` in tenths of an inch.
fn tenth_inches(unit: &[u8]) -> Option<f64> {
    Some(match strip(unit) {
        b".1IN" => 1.0,
        b"IN" | b"INS" | b"INCH" => 10.0,
        b"FEET" | b"FT" | b"F" => 120.0,
        b"M" => TENTH_INCHES_PER_METRE,
        b"DM" => TENTH_INCHES_PER_METRE / 10.0,
        b"CM" => TENTH_INCHES_PER_METRE / 100.0,
        b"MM" => TENTH_INCHES_PER_METRE / 1000.0,
        b".5MM" => TENTH_INCHES_PER_METRE / 2000.0,
        _ => return None,
    })
}

pub fn is_length(unit: &[u8]) -> bool {
    tenth_inches(unit).is_some()
}

/// True if both units name the same thing, ignoring padding.
pub fn same(a: &[u8], b: &[u8]) -> bool {
    strip(a) == strip(b)
}

/// Convert `value` from one length unit to another.
///
/// # Errors
/// `Units` if either unit is not a known length unit.
pub fn convert(value: f64, from: &[u8], to: &[u8]) -> Result<f64> {
    if same(from, to) {
        return Ok(value);
    }
    let unknown = |u: &[u8]| WellLogError::Units(format!("can not convert {} to {}: unknown unit \"{}\"", value, trimmed_text(to), trimmed_text(u)));
    let f = tenth_inches(from).ok_or_else(|| unknown(from))?;
    let t = tenth_inches(to).ok_or_else(|| unknown(to))?;
    Ok(value * f / t)
}

/// The unit a person would read `unit` in: feet for the imperial lengths,
/// metres for the metric ones, otherwise `unit` itself.
pub fn optical_units(unit: &[u8]) -> Vec<u8> {
    match strip(unit) {
        b"DM" | b"CM" | b"MM" | b".5MM" => OPTICAL_METRES.to_vec(),
        b"IN" | b"INS" | b"INCH" | b".1IN" => OPTICAL_FEET.to_vec(),
        _ => unit.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(convert(60.0, b".1IN", b"FEET").unwrap(), 0.5);
        assert_eq!(convert(0.5, b"FT  ", b".1IN").unwrap(), 60.0);
        assert_eq!(convert(12.0, b"IN  ", b"FEET").unwrap(), 1.0);
        assert!((convert(1.0, b"M   ", b"FEET").unwrap() - 3.280839895).abs() < 1e-8);
        assert!((convert(100.0, b"CM  ", b"M   ").unwrap() - 1.0).abs() < 1e-12);
        assert!((convert(2.0, b".5MM", b"MM  ").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(convert(7.0, b"XYZ ", b"XYZ").unwrap(), 7.0);
        assert!(matches!(convert(1.0, b"S   ", b"M   "), Err(WellLogError::Units(_))));
    }

    #[test]
    fn optical() {
        assert_eq!(optical_units(b".1IN"), b"FEET");
        assert_eq!(optical_units(b".5MM"), b"M   ");
        assert_eq!(optical_units(b"FEET"), b"FEET");
        assert_eq!(optical_units(b"S   "), b"S   ");
        assert!(is_length(b"FT  "));
        assert!(!is_length(b"S   "));
    }
}
