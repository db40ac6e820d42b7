use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate};

use crate::db::DATE_FORMAT;

pub fn parse_iso_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .with_context(|| format!("Invalid date: {s}. Use YYYY-MM-DD"))
}

/// Monday and Sunday of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let from_monday = u64::from(date.weekday().num_days_from_monday());
    let start = date
        .checked_sub_days(Days::new(from_monday))
        .with_context(|| format!("Week of {date} starts before the earliest supported date"))?;
    let end = start
        .checked_add_days(Days::new(6))
        .with_context(|| format!("Week of {date} ends after the latest supported date"))?;
    Ok((start, end))
}

/// Week bounds shifted by `weeks` whole weeks (negative for earlier weeks).
pub fn week_bounds_offset(date: NaiveDate, weeks: i64) -> Result<(NaiveDate, NaiveDate)> {
    let shifted = chrono::Duration::try_weeks(weeks)
        .and_then(|offset| date.checked_add_signed(offset))
        .with_context(|| format!("Week offset {weeks} from {date} is out of range"))?;
    week_bounds(shifted)
}
