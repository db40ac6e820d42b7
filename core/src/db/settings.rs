use anyhow::{Context, Result};
use rusqlite::params;

use super::Database;
use crate::models::Setting;

impl Database {
    fn setting_from_row(row: &rusqlite::Row) -> rusqlite::Result<Setting> {
        Ok(Setting {
            key: row.get(0)?,
            value: row.get(1)?,
            updated_at: row.get(2)?,
        })
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        self.query_optional(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<Setting> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')",
            params![key, value],
        )?;
        self.query_optional(
            "SELECT key, value, updated_at FROM settings WHERE key = ?1",
            params![key],
            Self::setting_from_row,
        )?
        .with_context(|| format!("Setting {key} not found after upsert"))
    }

    pub fn get_all_settings(&self) -> Result<Vec<Setting>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, updated_at FROM settings ORDER BY key")?;
        let settings = stmt
            .query_map([], Self::setting_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(settings)
    }
}
