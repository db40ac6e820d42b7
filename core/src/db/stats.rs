use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use rusqlite::params;

use super::{DATE_FORMAT, Database, format_date};
use crate::models::{HeatmapDay, MeditationPoint, PreceptAverage, PreceptRatingSummary, StreakInfo};

impl Database {
    pub fn get_streak(&self) -> Result<StreakInfo> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT date FROM entries ORDER BY date")?;
        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let dates = raw
            .iter()
            .map(|d| {
                NaiveDate::parse_from_str(d, DATE_FORMAT)
                    .with_context(|| format!("Invalid entry date in database: {d}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(compute_streak(&dates))
    }

    /// Meditation minutes per entry date over the trailing `days` window,
    /// oldest first. Days without an entry are omitted.
    pub fn get_meditation_trend(&self, days: u32) -> Result<Vec<MeditationPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.date, COALESCE(m.minutes, 0)
             FROM entries e
             LEFT JOIN meditation_logs m ON m.entry_id = e.id
             WHERE e.date >= date('now', ?1)
             ORDER BY e.date",
        )?;
        let points = stmt
            .query_map(params![window_modifier(days)], |row| {
                Ok(MeditationPoint {
                    date: row.get(0)?,
                    minutes: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(points)
    }

    /// Responses with text per entry date over the trailing `days` window,
    /// oldest first. Entry dates with no text responses report 0.
    pub fn get_completion_heatmap(&self, days: u32) -> Result<Vec<HeatmapDay>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.date, COUNT(pr.response)
             FROM entries e
             LEFT JOIN precept_responses pr ON pr.entry_id = e.id
             WHERE e.date >= date('now', ?1)
             GROUP BY e.date
             ORDER BY e.date",
        )?;
        let heatmap = stmt
            .query_map(params![window_modifier(days)], |row| {
                Ok(HeatmapDay {
                    date: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(heatmap)
    }

    pub fn get_average_ratings(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PreceptAverage>> {
        Ok(self
            .get_rating_summaries(start, end)?
            .into_iter()
            .map(|s| PreceptAverage {
                precept_number: s.precept_number,
                average: s.average,
            })
            .collect())
    }

    /// Mean and count of non-null ratings per precept for entries dated in
    /// `start..=end`, ordered by precept number.
    pub fn get_rating_summaries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PreceptRatingSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT pr.precept_number, AVG(pr.rating), COUNT(pr.rating)
             FROM precept_responses pr
             JOIN entries e ON e.id = pr.entry_id
             WHERE e.date BETWEEN ?1 AND ?2 AND pr.rating IS NOT NULL
             GROUP BY pr.precept_number
             ORDER BY pr.precept_number",
        )?;
        let summaries = stmt
            .query_map(params![format_date(start), format_date(end)], |row| {
                Ok(PreceptRatingSummary {
                    precept_number: row.get(0)?,
                    average: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }
}

fn window_modifier(days: u32) -> String {
    format!("-{days} days")
}

/// Current and longest runs of consecutive calendar days.
///
/// The current run is anchored at the latest date, not at today, so a run that
/// ended a week ago still reports its length.
#[must_use]
pub fn compute_streak(dates: &[NaiveDate]) -> StreakInfo {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let Some(&latest) = sorted.last() else {
        return StreakInfo {
            current: 0,
            longest: 0,
            last_entry_date: None,
        };
    };

    let present: HashSet<NaiveDate> = sorted.iter().copied().collect();
    let mut current = 1;
    let mut cursor = latest;
    while let Some(prev) = cursor.checked_sub_days(Days::new(1)) {
        if !present.contains(&prev) {
            break;
        }
        current += 1;
        cursor = prev;
    }

    let mut longest = 1;
    let mut run = 1;
    for pair in sorted.windows(2) {
        if pair[0].succ_opt() == Some(pair[1]) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
    }

    StreakInfo {
        current,
        longest,
        last_entry_date: Some(format_date(latest)),
    }
}
