use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::params;

use super::{Database, format_date};
use crate::models::{DailyEntry, Entry, MeditationLog, PreceptRatingSummary, WeeklySummary};

/// Precepts listed in the top and growth areas of a weekly summary.
const RANKED_PRECEPTS: usize = 3;

impl Database {
    /// Attach responses and the meditation log to `entry`, storing a default
    /// log first if the entry has none.
    pub(crate) fn build_daily_entry(&self, entry: Entry) -> Result<DailyEntry> {
        let responses = self.get_responses_for_entry(entry.id)?;
        let meditation = match self.get_meditation(entry.id)? {
            Some(log) => log,
            None => self.create_default_meditation(entry.id)?,
        };
        Ok(DailyEntry {
            entry,
            responses,
            meditation,
        })
    }

    /// Composed entries, newest first, for every entry or an inclusive date
    /// range. Read-only: a missing meditation log is reported as
    /// [`MeditationLog::unrecorded`] without being stored.
    pub fn list_daily_entries(
        &self,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<DailyEntry>> {
        let entries = match range {
            Some((start, end)) => self.list_entries(start, end)?,
            None => self.list_all_entries()?,
        };

        entries
            .into_iter()
            .map(|entry| {
                let responses = self.get_responses_for_entry(entry.id)?;
                let meditation = self
                    .get_meditation(entry.id)?
                    .unwrap_or_else(|| MeditationLog::unrecorded(&entry));
                Ok(DailyEntry {
                    entry,
                    responses,
                    meditation,
                })
            })
            .collect()
    }

    /// Aggregate the entries dated `week_start..=week_end`. The bounds are
    /// taken as given; the caller decides which weekday starts a week.
    pub fn build_weekly_summary(
        &self,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Result<WeeklySummary> {
        let (start, end) = (format_date(week_start), format_date(week_end));
        let range = params![start, end];

        let days_with_entries: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE date BETWEEN ?1 AND ?2",
            range,
            |row| row.get(0),
        )?;

        let total_precepts: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM precept_responses pr
             JOIN entries e ON e.id = pr.entry_id
             WHERE e.date BETWEEN ?1 AND ?2
               AND (pr.response IS NOT NULL OR pr.rating IS NOT NULL)",
            range,
            |row| row.get(0),
        )?;

        let (total_meditation_minutes, days_with_meditation): (i64, i64) = self.conn.query_row(
            "SELECT COALESCE(SUM(m.minutes), 0), COALESCE(SUM(m.meditated), 0)
             FROM meditation_logs m
             JOIN entries e ON e.id = m.entry_id
             WHERE e.date BETWEEN ?1 AND ?2",
            range,
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let average_ratings = self.get_rating_summaries(week_start, week_end)?;
        let (top_precepts, growth_precepts) = rank_precepts(&average_ratings);
        let reflection = self.get_weekly_reflection(week_start)?;

        Ok(WeeklySummary {
            week_start: start,
            week_end: end,
            days_with_entries,
            total_precepts,
            total_meditation_minutes,
            days_with_meditation,
            average_ratings,
            top_precepts,
            growth_precepts,
            reflection,
        })
    }
}

/// Split rated precepts into the three highest and three lowest averages.
///
/// Both lists come from a stable sort of `summaries`, which arrive ordered by
/// precept number, so equal averages keep the lower precept number first.
/// A precept may appear in both lists when fewer than six are rated.
#[must_use]
pub fn rank_precepts(summaries: &[PreceptRatingSummary]) -> (Vec<i64>, Vec<i64>) {
    let mut by_average: Vec<&PreceptRatingSummary> = summaries.iter().collect();

    by_average.sort_by(|a, b| b.average.total_cmp(&a.average));
    let top = by_average
        .iter()
        .take(RANKED_PRECEPTS)
        .map(|s| s.precept_number)
        .collect();

    by_average.sort_by(|a, b| a.average.total_cmp(&b.average));
    let growth = by_average
        .iter()
        .take(RANKED_PRECEPTS)
        .map(|s| s.precept_number)
        .collect();

    (top, growth)
}
