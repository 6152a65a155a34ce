//! Calendar helpers shared by the reporting services.

use crate::errors::{Error, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// First and last day of the given month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::validation(format!("Invalid month {year}-{month:02}")))?;
    let end = shift_months(start, 1)?
        .pred_opt()
        .ok_or_else(|| Error::validation(format!("Invalid month {year}-{month:02}")))?;
    Ok((start, end))
}

/// Moves `date` by `months` calendar months, clamping the day to the target month's length.
pub fn shift_months(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.ok_or_else(|| Error::validation(format!("Date out of range: {date} + {months} months")))
}

/// Label like `"Jan 2025"`.
#[must_use]
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// `(year, month)` key for grouping by calendar month.
#[must_use]
pub fn year_month(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Whole months from `start` to `end`; a partial trailing month does not count.
#[must_use]
pub fn whole_months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let total = (i64::from(end.year()) * 12 + i64::from(end.month()))
        - (i64::from(start.year()) * 12 + i64::from(start.month()));
    if total > 0 && end.day() < start.day() {
        total - 1
    } else if total < 0 && end.day() > start.day() {
        total + 1
    } else {
        total
    }
}

/// Look-back window ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// The last seven days
    Week,
    /// The last calendar month
    #[default]
    Month,
    /// The last twelve months
    Year,
}

impl Timeframe {
    /// First day of the window that ends on `today`.
    pub fn start_from(self, today: NaiveDate) -> Result<NaiveDate> {
        match self {
            Self::Week => today
                .checked_sub_days(chrono::Days::new(7))
                .ok_or_else(|| Error::validation("Date out of range")),
            Self::Month => shift_months(today, -1),
            Self::Year => shift_months(today, -12),
        }
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(Error::validation(format!(
                "Unknown timeframe '{other}', expected week, month or year"
            ))),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        })
    }
}
