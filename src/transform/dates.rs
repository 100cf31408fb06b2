//! DimDate construction

use super::clean::CleanTransaction;
use crate::model::DimDate;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;

/// Surrogate key for a calendar date: YYYYMMDD as an integer
///
/// Equivalent to formatting with `%Y%m%d` and parsing the digits, without
/// going through text. Cleaned transactions only carry years 1 to 9999, but
/// the key is wide enough for any date chrono can represent.
pub fn date_key(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// One row per distinct calendar date, in first-seen order
pub fn build_dim_date(transactions: &[CleanTransaction]) -> Vec<DimDate> {
    let mut seen = HashSet::new();
    transactions
        .iter()
        .map(|t| t.invoice_date.date())
        .filter(|date| seen.insert(*date))
        .map(dim_date_row)
        .collect()
}

fn dim_date_row(date: NaiveDate) -> DimDate {
    DimDate {
        date_key: date_key(date),
        full_date: date,
        year: date.year(),
        month: date.month(),
        day: date.day(),
        quarter: (date.month() - 1) / 3 + 1,
        weekday: weekday_name(date.weekday()).to_string(),
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
