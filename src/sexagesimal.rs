//! Sexagesimal (base-60) normalization for right ascension and declination.
//!
//! Inputs arrive as raw triples that may carry fractional or out-of-range
//! components, e.g. `455.365h 322.87m 245.789s`. Normalizing yields a whole
//! major unit, whole minutes in `[0, 60)` and fractional seconds in `[0, 60)`.

use crate::error::{EditError, Result};
use crate::number_format;

/// Raw hours/minutes/seconds, possibly fractional or out of range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeObject {
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
}

/// Raw degrees/arcminutes/arcseconds, possibly fractional or out of range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreesObject {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}

/// A canonical sexagesimal triple.
///
/// `major` is signed. `negative` is tracked separately so that values such
/// as `-00:30:00` keep their sign when `major` is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sexagesimal {
    pub major: i64,
    pub minor: u32,
    pub sub: f64,
    negative: bool,
}

impl TimeObject {
    pub fn new(hours: f64, minutes: f64, seconds: f64) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn normalize(&self) -> Result<Sexagesimal> {
        normalize_hours(self.hours, self.minutes, self.seconds)
    }
}

impl DegreesObject {
    pub fn new(degrees: f64, minutes: f64, seconds: f64) -> Self {
        Self {
            degrees,
            minutes,
            seconds,
        }
    }

    pub fn normalize(&self) -> Result<Sexagesimal> {
        normalize_degrees(self.degrees, self.minutes, self.seconds)
    }
}

impl Sexagesimal {
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Decimal value in major units (hours or degrees), sign included.
    pub fn value(&self) -> f64 {
        let magnitude =
            self.major.unsigned_abs() as f64 + self.minor as f64 / 60.0 + self.sub / 3600.0;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Render as `[-]MM<sep>mm<sep>ss[.fff]` with two-digit fields.
    pub fn render(&self, separator: char, fraction_digits: usize) -> Result<String> {
        let sign = if self.negative { "-" } else { "" };
        Ok(format!(
            "{sign}{}{separator}{}{separator}{}",
            number_format::format(self.major.unsigned_abs() as f64, 2, 0)?,
            number_format::format(self.minor as f64, 2, 0)?,
            number_format::format(self.sub, 2, fraction_digits)?,
        ))
    }
}

fn ensure_finite(label: &str, values: [f64; 3]) -> Result<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(EditError::InvalidArgument(format!(
            "{label} components must be finite numbers, got {values:?}"
        )));
    }
    Ok(())
}

/// Truncate and carry a raw triple. The returned major is whole but may be
/// negative; minor and sub are in `[0, 60)`.
fn carry(major: f64, minor: f64, sub: f64) -> (f64, f64, f64) {
    let whole_major = major.trunc();
    // The signed remainder makes this a subtraction for negative majors.
    let minor = minor + (major - whole_major) * 60.0;
    let whole_minor = minor.trunc();
    let mut sub = sub + (minor - whole_minor) * 60.0;
    let mut minor = whole_minor;

    let sub_carry = (sub / 60.0).floor();
    sub -= sub_carry * 60.0;
    minor += sub_carry;
    if sub >= 60.0 {
        sub -= 60.0;
        minor += 1.0;
    }

    let minor_carry = (minor / 60.0).floor();
    minor -= minor_carry * 60.0;
    (whole_major + minor_carry, minor, sub)
}

/// Normalize hours, wrapping the result into `[0, 24)`.
pub fn normalize_hours(hours: f64, minutes: f64, seconds: f64) -> Result<Sexagesimal> {
    ensure_finite("time", [hours, minutes, seconds])?;
    let (major, minor, sub) = carry(hours, minutes, seconds);
    Ok(Sexagesimal {
        major: major.rem_euclid(24.0) as i64,
        minor: minor as u32,
        sub,
        negative: false,
    })
}

/// Normalize degrees. The magnitude is carried and the sign of `degrees`
/// is re-applied, so `-163.94° 2.5' 0.647"` becomes `-163° 58' 54.647"`.
pub fn normalize_degrees(degrees: f64, minutes: f64, seconds: f64) -> Result<Sexagesimal> {
    ensure_finite("angle", [degrees, minutes, seconds])?;
    let mut negative = degrees.is_sign_negative();
    let (mut major, mut minor, mut sub) = carry(degrees.abs(), minutes, seconds);

    if major < 0.0 {
        // Negative minutes or seconds pulled the magnitude through zero.
        let total = major + minor / 60.0 + sub / 3600.0;
        (major, minor, sub) = carry(-total, 0.0, 0.0);
        negative = !negative;
    }

    let magnitude = major as i64;
    Ok(Sexagesimal {
        major: if negative { -magnitude } else { magnitude },
        minor: minor as u32,
        sub,
        negative,
    })
}

/// Split a sexagesimal text value such as `12:34:56.7` or `-05 23 10`
/// into its raw components. Missing trailing components are zero.
pub fn parse_components(text: &str) -> Result<(f64, f64, f64)> {
    let parts: Vec<&str> = text
        .split(|c: char| c == ':' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() || parts.len() > 3 {
        return Err(EditError::Parse(format!(
            "expected 1 to 3 sexagesimal fields, got '{text}'"
        )));
    }

    let mut values = [0.0_f64; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|_| EditError::Parse(format!("'{part}' in '{text}' is not a number")))?;
    }
    Ok((values[0], values[1], values[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hours_carry_and_wrap() {
        let t = normalize_hours(455.365, 322.87, 245.789).unwrap();
        assert_eq!(t.major, 4);
        assert_eq!(t.minor, 48);
        assert!((t.sub - 51.989).abs() < 1e-4, "sub was {}", t.sub);
    }

    #[test]
    fn test_negative_hours() {
        let t = normalize_hours(-455.365, 322.87, 245.789).unwrap();
        assert_eq!(t.major, 6);
        assert_eq!(t.minor, 5);
        assert!((t.sub - 3.989).abs() < 1e-4, "sub was {}", t.sub);
    }

    #[test]
    fn test_negative_hours_borrow_from_minutes() {
        let t = normalize_hours(-1.5, 0.0, 0.0).unwrap();
        assert_eq!((t.major, t.minor), (22, 30));
        assert!(t.sub.abs() < 1e-9);
    }

    #[test]
    fn test_declination_style_degrees() {
        let d = normalize_degrees(-163.94, 2.5, 0.647).unwrap();
        assert_eq!(d.major, -163);
        assert_eq!(d.minor, 58);
        assert!((d.sub - 54.647).abs() < 1e-6);
        assert!((d.value() - -163.98184638).abs() < 1e-8);

        let d = normalize_degrees(86.2, 23.56, 147.89).unwrap();
        assert_eq!((d.major, d.minor), (86, 38));
        assert!((d.sub - 1.49).abs() < 1e-6);
    }

    #[test]
    fn test_negative_zero_degrees_keeps_sign() {
        let d = normalize_degrees(-0.0, 30.0, 0.0).unwrap();
        assert_eq!(d.major, 0);
        assert!(d.is_negative());
        assert!((d.value() + 0.5).abs() < 1e-12);
        assert_eq!(d.render(':', 1).unwrap(), "-00:30:00");
    }

    #[test]
    fn test_minutes_pull_magnitude_through_zero() {
        let d = normalize_degrees(1.0, -90.0, 0.0).unwrap();
        assert!(d.is_negative());
        assert_eq!((d.major, d.minor), (0, 30));
    }

    #[test]
    fn test_nan_is_invalid_argument() {
        assert!(matches!(
            normalize_hours(f64::NAN, 0.0, 0.0),
            Err(EditError::InvalidArgument(_))
        ));
        assert!(matches!(
            normalize_degrees(1.0, f64::NAN, 0.0),
            Err(EditError::InvalidArgument(_))
        ));
        assert!(matches!(
            normalize_degrees(1.0, 0.0, f64::INFINITY),
            Err(EditError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_render_is_stable() {
        let t = normalize_hours(455.365, 322.87, 245.789).unwrap();
        assert_eq!(t.render(':', 3).unwrap(), t.render(':', 3).unwrap());

        let t = normalize_hours(12.5, 0.0, 30.25).unwrap();
        assert_eq!(t.render(':', 3).unwrap(), "12:30:30.25");
        assert_eq!(t.render(' ', 0).unwrap(), "12 30 30");
    }

    #[test]
    fn test_parse_components() {
        assert_eq!(parse_components("12:34:56.5").unwrap(), (12.0, 34.0, 56.5));
        assert_eq!(parse_components("-05 23 10").unwrap(), (-5.0, 23.0, 10.0));
        assert_eq!(parse_components("83.5").unwrap(), (83.5, 0.0, 0.0));
        let (d, _, _) = parse_components("-00:30:00").unwrap();
        assert!(d.is_sign_negative());
        assert!(parse_components("").is_err());
        assert!(parse_components("1:2:3:4").is_err());
        assert!(parse_components("aa:bb").is_err());
    }

    proptest! {
        #[test]
        fn prop_degrees_in_range_and_preserved(
            d in -720.0f64..720.0,
            m in -300.0f64..300.0,
            s in -3000.0f64..3000.0,
        ) {
            let n = normalize_degrees(d, m, s).unwrap();
            prop_assert!(n.minor < 60);
            prop_assert!(n.sub >= 0.0 && n.sub < 60.0);
            let sign = if d.is_sign_negative() { -1.0 } else { 1.0 };
            let expected = sign * (d.abs() + m / 60.0 + s / 3600.0);
            prop_assert!((n.value() - expected).abs() < 1e-6);
        }

        #[test]
        fn prop_hours_in_range_and_preserved_mod_24(
            h in -1000.0f64..1000.0,
            m in -300.0f64..300.0,
            s in -3000.0f64..3000.0,
        ) {
            let n = normalize_hours(h, m, s).unwrap();
            prop_assert!((0..24).contains(&n.major));
            prop_assert!(n.minor < 60);
            prop_assert!(n.sub >= 0.0 && n.sub < 60.0);
            let diff = (n.value() - (h + m / 60.0 + s / 3600.0)).rem_euclid(24.0);
            prop_assert!(diff.min(24.0 - diff) < 1e-6);
        }
    }
}
