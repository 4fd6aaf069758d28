//! Derived JD and HJD records.

use chrono::NaiveDateTime;

use crate::astro::{self, HeliocentricCorrection};
use crate::error::{EditError, Result};
use crate::header::HeaderValue;
use crate::operations::{DecSource, RaSource, TimeSource};
use crate::sexagesimal::{parse_components, DegreesObject, TimeObject};
use crate::store::RecordContainer;
use crate::validate::validate_target_keyword;

use super::time::parse_datetime;
use super::{upsert, Mutation};

pub const JD_COMMENT: &str = "Julian Date";
pub const HJD_COMMENT: &str = "Heliocentric Julian Date";

pub(super) struct HjdRequest<'a> {
    pub source: &'a TimeSource,
    pub ra: &'a RaSource,
    pub dec: &'a DecSource,
    pub keyword: &'a str,
    pub comment: Option<&'a str>,
    pub update_if_exists: bool,
}

pub(super) fn plan_jd<C: RecordContainer>(
    container: &C,
    source: &TimeSource,
    keyword: &str,
    comment: Option<&str>,
    update_if_exists: bool,
) -> Result<Vec<Mutation>> {
    validate_target_keyword(keyword)?;
    let jd = astro::julian_date_of(&resolve_time(container, source)?)?;
    upsert(
        container,
        keyword,
        HeaderValue::Real(jd),
        Some(comment.unwrap_or(JD_COMMENT).to_string()),
        update_if_exists,
    )
}

pub(super) fn plan_hjd<C: RecordContainer>(
    container: &C,
    correction: &dyn HeliocentricCorrection,
    request: HjdRequest<'_>,
) -> Result<Vec<Mutation>> {
    validate_target_keyword(request.keyword)?;
    let jd = astro::julian_date_of(&resolve_time(container, request.source)?)?;
    let ra = resolve_ra(container, request.ra)?;
    let dec = resolve_dec(container, request.dec)?;
    let hjd = correction.heliocentric_julian_date(jd, ra, dec);
    if !hjd.is_finite() {
        return Err(EditError::InvalidArgument(format!(
            "heliocentric correction gave {hjd} for JD {jd}"
        )));
    }
    upsert(
        container,
        request.keyword,
        HeaderValue::Real(hjd),
        Some(request.comment.unwrap_or(HJD_COMMENT).to_string()),
        request.update_if_exists,
    )
}

fn source_value<'c, C: RecordContainer>(container: &'c C, keyword: &str) -> Result<&'c HeaderValue> {
    container
        .record(keyword)
        .ok_or_else(|| EditError::KeywordNotFound(keyword.to_string()))?
        .value()
        .ok_or_else(|| EditError::Parse(format!("{keyword} has no value")))
}

fn resolve_time<C: RecordContainer>(container: &C, source: &TimeSource) -> Result<NaiveDateTime> {
    match source {
        TimeSource::Explicit(instant) => Ok(*instant),
        TimeSource::Keyword(keyword) => match source_value(container, keyword)? {
            HeaderValue::Text(text) => parse_datetime(text),
            other => Err(EditError::Parse(format!(
                "{keyword} = {other} is not an ISO datetime"
            ))),
        },
    }
}

/// Right ascension in degrees. Numeric keywords are already degrees, text
/// keywords are sexagesimal hours.
fn resolve_ra<C: RecordContainer>(container: &C, source: &RaSource) -> Result<f64> {
    let ra = match source {
        RaSource::Explicit(ra) => *ra,
        RaSource::Keyword(keyword) => match source_value(container, keyword)? {
            HeaderValue::Text(text) => {
                let (h, m, s) = parse_components(text)?;
                TimeObject::new(h, m, s)
            }
            value => return numeric_degrees(keyword, value),
        },
    };
    astro::right_ascension_degrees(&ra)
}

/// Declination in degrees, from numeric degrees or sexagesimal text.
fn resolve_dec<C: RecordContainer>(container: &C, source: &DecSource) -> Result<f64> {
    let dec = match source {
        DecSource::Explicit(dec) => *dec,
        DecSource::Keyword(keyword) => match source_value(container, keyword)? {
            HeaderValue::Text(text) => {
                let (d, m, s) = parse_components(text)?;
                DegreesObject::new(d, m, s)
            }
            value => return numeric_degrees(keyword, value),
        },
    };
    astro::declination_of(&dec)
}

fn numeric_degrees(keyword: &str, value: &HeaderValue) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EditError::Parse(format!("{keyword} = {value} is not a coordinate")))
}
