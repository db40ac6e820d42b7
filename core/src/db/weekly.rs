use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::params;

use super::{Database, format_date};
use crate::models::WeeklyReflection;

impl Database {
    fn reflection_from_row(row: &rusqlite::Row) -> rusqlite::Result<WeeklyReflection> {
        Ok(WeeklyReflection {
            id: row.get(0)?,
            week_start: row.get(1)?,
            reflection: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    pub fn get_weekly_reflection(&self, week_start: NaiveDate) -> Result<Option<WeeklyReflection>> {
        self.query_optional(
            "SELECT id, week_start, reflection, created_at, updated_at
             FROM weekly_reflections WHERE week_start = ?1",
            params![format_date(week_start)],
            Self::reflection_from_row,
        )
    }

    pub fn upsert_weekly_reflection(
        &self,
        week_start: NaiveDate,
        reflection: Option<&str>,
    ) -> Result<WeeklyReflection> {
        self.conn.execute(
            "INSERT INTO weekly_reflections (week_start, reflection) VALUES (?1, ?2)
             ON CONFLICT(week_start) DO UPDATE SET
                reflection = excluded.reflection,
                updated_at = datetime('now')",
            params![format_date(week_start), reflection],
        )?;
        self.get_weekly_reflection(week_start)?
            .context("Weekly reflection not found after upsert")
    }
}
