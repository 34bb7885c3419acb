//! Small numeric and text helpers

use encoding_rs::WINDOWS_1252;

/// Split `value` into a mantissa in `[0.5, 1)` and a power of two.
///
/// Zero, infinities and NaN return `(value, 0)`.
pub fn frexp(value: f64) -> (f64, i32) {
    if value == 0.0 || !value.is_finite() {
        return (value, 0);
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    if exponent == 0 {
        // Subnormal: scale into the normal range first.
        let (m, e) = frexp(value * f64::powi(2.0, 64));
        return (m, e - 64);
    }
    let mantissa_bits = (bits & !(0x7ffu64 << 52)) | (1022u64 << 52);
    (f64::from_bits(mantissa_bits), exponent - 1022)
}

/// `mantissa * 2^exponent`.
pub fn ldexp(mantissa: f64, exponent: i32) -> f64 {
    // powi saturates to 0 or inf for extreme exponents; split to keep precision.
    if exponent > 1000 {
        mantissa * f64::powi(2.0, 1000) * f64::powi(2.0, exponent - 1000)
    } else if exponent < -1000 {
        mantissa * f64::powi(2.0, -1000) * f64::powi(2.0, exponent + 1000)
    } else {
        mantissa * f64::powi(2.0, exponent)
    }
}

/// Decode raw record text for display.
///
/// Well log text fields are single byte ASCII in practice with the odd Latin-1
/// character, Windows-1252 is a superset of both.
pub fn display_text(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Like [`display_text`] but with trailing spaces and NULs removed, as LIS pads
/// fixed width fields.
pub fn trimmed_text(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|b| *b != b' ' && *b != 0)
        .map_or(0, |p| p + 1);
    display_text(&bytes[..end])
}
