//! Julian Date, declination and heliocentric time formulas.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{EditError, Result};
use crate::sexagesimal::{DegreesObject, TimeObject};

/// Light travel time for one astronomical unit, in days.
const AU_LIGHT_DAYS: f64 = 0.005_775_518_3;

/// Julian Date of J2000.0.
pub const J2000: f64 = 2_451_545.0;

/// Julian Date of a Gregorian calendar instant.
///
/// The time of day is folded into a fractional day before the closed-form
/// calendar polynomial is evaluated. No rounding is applied to the result.
#[allow(clippy::too_many_arguments)]
pub fn julian_date(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nanosecond: u32,
) -> Result<f64> {
    if NaiveDate::from_ymd_opt(year, month, day).is_none()
        || hour > 23
        || minute > 59
        || second > 60
        || nanosecond >= 1_000_000_000
    {
        return Err(EditError::InvalidArgument(format!(
            "not a calendar instant: {year}-{month}-{day} {hour}:{minute}:{second}.{nanosecond:09}"
        )));
    }

    let (y, m) = if month <= 2 {
        (year as f64 - 1.0, month as f64 + 12.0)
    } else {
        (year as f64, month as f64)
    };
    let century = (y / 100.0).floor();
    let gregorian = 2.0 - century + (century / 4.0).floor();

    let seconds = (hour * 3600 + minute * 60 + second) as f64 + nanosecond as f64 * 1e-9;
    let day = day as f64 + seconds / 86_400.0;

    Ok((365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day + gregorian - 1524.5)
}

/// Julian Date of a `chrono` timestamp, taken as UTC.
pub fn julian_date_of(instant: &NaiveDateTime) -> Result<f64> {
    julian_date(
        instant.year(),
        instant.month(),
        instant.day(),
        instant.hour(),
        instant.minute(),
        instant.second(),
        instant.nanosecond(),
    )
}

/// Signed declination in decimal degrees: `sign(d) * (|d| + m/60 + s/3600)`.
pub fn declination(degrees: f64, minutes: f64, seconds: f64) -> Result<f64> {
    if degrees.is_nan() || minutes.is_nan() || seconds.is_nan() {
        return Err(EditError::InvalidArgument(format!(
            "declination components must be numbers, got {degrees} {minutes} {seconds}"
        )));
    }
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    Ok(if degrees.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    })
}

pub fn declination_of(dec: &DegreesObject) -> Result<f64> {
    declination(dec.degrees, dec.minutes, dec.seconds)
}

/// Right ascension in degrees, wrapped into `[0, 360)`.
pub fn right_ascension_degrees(ra: &TimeObject) -> Result<f64> {
    Ok(ra.normalize()?.value() * 15.0)
}

/// Converts a geocentric Julian Date into a Heliocentric Julian Date for a
/// target at the given equatorial coordinates (degrees).
pub trait HeliocentricCorrection: Send + Sync {
    fn heliocentric_julian_date(&self, jd: f64, ra_degrees: f64, dec_degrees: f64) -> f64;
}

/// Light-time correction along the low-precision solar position of the
/// Astronomical Almanac. Accurate to a few seconds between 1950 and 2050.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlmanacSolarCorrection;

impl AlmanacSolarCorrection {
    /// Geocentric equatorial rectangular coordinates of the Sun, in AU.
    pub fn sun_position(jd: f64) -> [f64; 3] {
        let n = jd - J2000;
        let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
        let anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
        let longitude = (mean_longitude
            + 1.915 * anomaly.sin()
            + 0.020 * (2.0 * anomaly).sin())
        .to_radians();
        let distance = 1.000_14 - 0.016_71 * anomaly.cos() - 0.000_14 * (2.0 * anomaly).cos();
        let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

        [
            distance * longitude.cos(),
            distance * obliquity.cos() * longitude.sin(),
            distance * obliquity.sin() * longitude.sin(),
        ]
    }
}

impl HeliocentricCorrection for AlmanacSolarCorrection {
    fn heliocentric_julian_date(&self, jd: f64, ra_degrees: f64, dec_degrees: f64) -> f64 {
        let [x, y, z] = Self::sun_position(jd);
        let (ra, dec) = (ra_degrees.to_radians(), dec_degrees.to_radians());
        let projection = x * dec.cos() * ra.cos() + y * dec.cos() * ra.sin() + z * dec.sin();
        jd - AU_LIGHT_DAYS * projection
    }
}
