//! Numeric parsing for coerced columns.
//!
//! Accepts plain decimal and scientific notation with an optional sign,
//! surrounded by whitespace. Thousands separators are not understood.

/// Parse a finite float. `None` for blanks, garbage, NaN and infinities.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a whole number, truncating fractional input toward zero.
///
/// `None` when the text is not numeric or the value does not fit in `i64`.
pub fn parse_integer(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(exact) = trimmed.parse::<i64>() {
        return Some(exact);
    }
    float_to_integer(parse_number(trimmed)?)
}

/// Truncate a float toward zero; `None` when not finite or out of range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn float_to_integer(value: f64) -> Option<i64> {
    let truncated = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}
