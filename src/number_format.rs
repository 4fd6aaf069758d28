//! Fixed-width decimal rendering for header values and comments.

use crate::error::{EditError, Result};

/// Render `number` with a `.` separator and no grouping.
///
/// The integer part is left-padded with zeros to `min_integer_digits`. The
/// fraction is cut (never rounded) to at most `max_fraction_digits` and
/// trailing zeros are dropped, together with the point when nothing is left.
///
/// ```
/// use fits_header_edit::number_format::format;
/// assert_eq!(format(100.0 / 3.0, 4, 5).unwrap(), "0033.33333");
/// assert_eq!(format(2.45236, 2, 3).unwrap(), "02.452");
/// assert_eq!(format(0.000002, 5, 3).unwrap(), "00000");
/// ```
pub fn format(number: f64, min_integer_digits: usize, max_fraction_digits: usize) -> Result<String> {
    if !number.is_finite() {
        return Err(EditError::InvalidArgument(format!(
            "cannot format non-finite number {number}"
        )));
    }

    // Display gives the shortest round-trip digits and never an exponent.
    let digits = number.abs().to_string();
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
    let fraction = fraction[..fraction.len().min(max_fraction_digits)].trim_end_matches('0');

    let integer = if min_integer_digits == 0 && integer == "0" && !fraction.is_empty() {
        ""
    } else {
        integer
    };

    let is_zero = integer.bytes().all(|b| b == b'0') && fraction.is_empty();
    let mut out = String::with_capacity(min_integer_digits + fraction.len() + 2);
    if number < 0.0 && !is_zero {
        out.push('-');
    }
    for _ in integer.len()..min_integer_digits {
        out.push('0');
    }
    out.push_str(integer);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    Ok(out)
}

/// Number of digits after the decimal point in a textual number.
pub fn fraction_digits(text: &str) -> usize {
    text.split_once('.')
        .map(|(_, f)| f.chars().take_while(char::is_ascii_digit).count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        assert_eq!(format(100.0 / 3.0, 4, 5).unwrap(), "0033.33333");
        assert_eq!(format(2.45236, 2, 3).unwrap(), "02.452");
        assert_eq!(format(0.000002, 5, 3).unwrap(), "00000");
    }

    #[test]
    fn test_truncates_instead_of_rounding() {
        assert_eq!(format(1.99999, 1, 2).unwrap(), "1.99");
        assert_eq!(format(59.9999999, 2, 3).unwrap(), "59.999");
    }

    #[test]
    fn test_trims_trailing_zeros() {
        assert_eq!(format(12.5, 2, 6).unwrap(), "12.5");
        assert_eq!(format(7.0, 2, 3).unwrap(), "07");
        assert_eq!(format(7.0, 0, 3).unwrap(), "7");
    }

    #[test]
    fn test_wide_integer_part_is_kept() {
        assert_eq!(format(2451545.25, 2, 4).unwrap(), "2451545.25");
        assert_eq!(format(123.0, 1, 0).unwrap(), "123");
    }

    #[test]
    fn test_negative_numbers() {
        assert_eq!(format(-3.25, 2, 1).unwrap(), "-03.2");
        assert_eq!(format(-0.0001, 2, 2).unwrap(), "00");
        assert_eq!(format(-0.5, 0, 1).unwrap(), "-.5");
    }

    #[test]
    fn test_idempotent() {
        let a = format(51.98912, 2, 3).unwrap();
        let b = format(51.98912, 2, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            format(f64::NAN, 2, 2),
            Err(EditError::InvalidArgument(_))
        ));
        assert!(format(f64::INFINITY, 2, 2).is_err());
    }

    #[test]
    fn test_fraction_digits() {
        assert_eq!(fraction_digits("12:30:45.125"), 3);
        assert_eq!(fraction_digits("2024-01-01T00:00:00"), 0);
        assert_eq!(fraction_digits("1.5"), 1);
    }
}
