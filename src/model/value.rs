//! Coercion of loosely typed source values
//!
//! CSV cells arrive as strings and JSON fields as whatever the producer
//! wrote, so every typed read goes through these helpers. `Ok(None)` means
//! the value is null; `Err` carries a human readable reason.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::ops::RangeInclusive;

/// Datetime layouts accepted for InvoiceDate, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Read a value as text
///
/// Numbers render in their canonical form so `22423` and `"22423"` compare
/// equal as join keys.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Read a value as a whole number
///
/// Integral floats such as `17850.0` are accepted.
pub fn integer(value: &Value) -> Result<Option<i64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => n
                .as_f64()
                .and_then(integral)
                .map(Some)
                .ok_or_else(|| format!("{} is not a whole number", n)),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Some(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(integral)
                .map(Some)
                .ok_or_else(|| format!("'{}' is not a whole number", s))
        }
        other => Err(format!("{} is not a whole number", other)),
    }
}

/// Read a value as a float
pub fn float(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("{} is not a number", n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Some)
            .ok_or_else(|| format!("'{}' is not a number", s)),
        other => Err(format!("{} is not a number", other)),
    }
}

/// Years a timestamp may fall in
pub const YEAR_RANGE: RangeInclusive<i32> = 1..=9999;

/// Read a value as a point in time
///
/// Strings are matched against the accepted layouts; integers are epoch
/// milliseconds. Offsets are dropped, keeping the wall-clock time.
pub fn timestamp(value: &Value) -> Result<Option<NaiveDateTime>, String> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| format!("{} is not an epoch millisecond timestamp", n))?,
        Value::String(s) => parse_timestamp(s.trim())
            .ok_or_else(|| format!("'{}' is not a recognized date/time", s))?,
        other => return Err(format!("{} is not a date/time", other)),
    };
    if !YEAR_RANGE.contains(&parsed.year()) {
        return Err(format!("{} is outside years 1 to 9999", value));
    }
    Ok(Some(parsed))
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}
