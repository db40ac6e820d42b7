use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use serde::Serialize;

use precept_core::db::DATE_FORMAT;
use precept_core::models::MAX_RATING;
use precept_core::precepts::precept;

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, DATE_FORMAT).with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn iso(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Inclusive range ending at `to` (default today) and starting at `from`, or
/// `days - 1` days before the end when `from` is omitted.
pub(crate) fn parse_range(
    from: Option<String>,
    to: Option<String>,
    days: u32,
) -> Result<(NaiveDate, NaiveDate)> {
    let end = parse_date(to)?;
    let start = match from {
        Some(s) => parse_date(Some(s))?,
        None => end
            .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
            .with_context(|| format!("--days {days} reaches before the earliest supported date"))?,
    };
    Ok((start, end))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// "Truthful Speech" for 10, or the bare number if out of range.
pub(crate) fn precept_label(number: i64) -> String {
    precept(number).map_or_else(|| number.to_string(), |p| p.short_name.to_string())
}

pub(crate) fn rating_stars(rating: Option<i64>) -> String {
    match rating {
        Some(r) => {
            let max = usize::try_from(MAX_RATING).unwrap_or(5);
            let filled = usize::try_from(r).unwrap_or(0).min(max);
            format!("{}{}", "●".repeat(filled), "○".repeat(max - filled))
        }
        None => "-".to_string(),
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max <= 3 {
        s.chars().take(max).collect()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
