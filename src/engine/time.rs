//! Shifting date and time-of-day values.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{EditError, Result};
use crate::header::HeaderValue;
use crate::number_format::{self, fraction_digits};
use crate::operations::TimeShift;
use crate::sexagesimal::normalize_hours;
use crate::store::RecordContainer;
use crate::validate::{validate_record, validate_target_keyword};

use super::Mutation;

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const SECONDS_PER_DAY: i128 = 86_400;

pub(super) fn plan_shift<C: RecordContainer>(
    container: &C,
    keyword: &str,
    shift: &TimeShift,
) -> Result<Vec<Mutation>> {
    validate_target_keyword(keyword)?;
    let index = container
        .position(keyword)
        .ok_or_else(|| EditError::KeywordNotFound(keyword.to_string()))?;
    let existing = &container.records()[index];
    let text = existing.value().and_then(HeaderValue::as_text).ok_or_else(|| {
        EditError::Parse(format!("{keyword} does not hold a date or time value"))
    })?;

    let shifted = existing.with_value(HeaderValue::Text(shift_text(text, shift)?), None);
    validate_record(&shifted)?;
    Ok(vec![Mutation::Replace(index, shifted)])
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS[.f]`.
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|_| EditError::Parse(format!("'{text}' is not an ISO date or datetime")))
}

/// Apply `shift` to a date, datetime or time-of-day string.
///
/// The fraction keeps the digit count of the input, or nine digits when the
/// shift itself has a sub-second part.
pub fn shift_text(text: &str, shift: &TimeShift) -> Result<String> {
    let text = text.trim();
    let duration = shift
        .to_duration()
        .ok_or_else(|| EditError::IllegalInputData(format!("time shift {shift:?} is out of range")))?;
    let digits = if shift.has_subsecond_part() {
        9
    } else {
        fraction_digits(text)
    };

    if let Ok(instant) = parse_datetime(text) {
        let shifted = instant.checked_add_signed(duration).ok_or_else(|| {
            EditError::ValidationFailure(format!("'{text}' shifted by {shift:?} is out of range"))
        })?;
        let date_only = !text.contains('T') && shifted.time() == NaiveTime::MIN;
        return render_datetime(&shifted, date_only, digits);
    }

    let (seconds, nanos) = parse_time_of_day(text)?;
    let total = (duration.num_seconds() as i128)
        .checked_add(seconds)
        .and_then(|s| s.checked_mul(NANOS_PER_SECOND))
        .and_then(|n| n.checked_add(nanos + duration.subsec_nanos() as i128))
        .ok_or_else(|| EditError::Parse(format!("'{text}' shifted by {shift:?} is out of range")))?;
    let within_day = total.div_euclid(NANOS_PER_SECOND).rem_euclid(SECONDS_PER_DAY);
    let time = normalize_hours(0.0, 0.0, within_day as f64)?;
    Ok(format!(
        "{}{}",
        time.render(':', 0)?,
        fraction(total.rem_euclid(NANOS_PER_SECOND) as u32, digits)
    ))
}

/// `HH:MM[:SS[.f]]` as whole seconds plus nanoseconds. Fields are unsigned
/// and must lie within a day; `60` seconds is allowed for a leap second.
fn parse_time_of_day(text: &str) -> Result<(i128, i128)> {
    let bad = || EditError::Parse(format!("'{text}' is not a date, datetime or time of day"));
    let field = |s: &str, limit: i128| -> Result<i128> {
        if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let value: i128 = s.parse().map_err(|_| bad())?;
        if value < limit {
            Ok(value)
        } else {
            Err(bad())
        }
    };

    let fields: Vec<&str> = text.split(':').collect();
    if !(2..=3).contains(&fields.len()) {
        return Err(bad());
    }

    let hours = field(fields[0], 24)?;
    let minutes = field(fields[1], 60)?;
    let (whole, frac) = match fields.get(2).copied() {
        Some(s) => s.split_once('.').unwrap_or((s, "")),
        None => ("0", ""),
    };
    let seconds = field(whole, 61)?;
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    let nanos = format!("{:0<9}", &frac[..frac.len().min(9)]);
    let nanos: i128 = nanos.parse().map_err(|_| bad())?;

    Ok(((hours * 60 + minutes) * 60 + seconds, nanos))
}

fn render_datetime(instant: &NaiveDateTime, date_only: bool, digits: usize) -> Result<String> {
    let date = format!(
        "{}-{}-{}",
        number_format::format(instant.year() as f64, 4, 0)?,
        number_format::format(instant.month() as f64, 2, 0)?,
        number_format::format(instant.day() as f64, 2, 0)?,
    );
    if date_only {
        return Ok(date);
    }
    Ok(format!(
        "{date}T{}:{}:{}{}",
        number_format::format(instant.hour() as f64, 2, 0)?,
        number_format::format(instant.minute() as f64, 2, 0)?,
        number_format::format(instant.second() as f64, 2, 0)?,
        fraction(instant.nanosecond().min(999_999_999), digits),
    ))
}

/// `.ddd` cut to `digits` with trailing zeros dropped, or nothing.
fn fraction(nanos: u32, digits: usize) -> String {
    let all = format!("{nanos:09}");
    let cut = all[..digits.min(9)].trim_end_matches('0');
    if cut.is_empty() {
        String::new()
    } else {
        format!(".{cut}")
    }
}
