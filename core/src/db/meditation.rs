use anyhow::{Context, Result};
use rusqlite::params;

use super::{Database, flag};
use crate::models::{MeditationLog, NewMeditation};

const MEDITATION_COLUMNS: &str = "id, entry_id, meditated, minutes, notes, created_at, updated_at";

impl Database {
    // Expects columns in MEDITATION_COLUMNS order.
    fn meditation_from_row(row: &rusqlite::Row) -> rusqlite::Result<MeditationLog> {
        Ok(MeditationLog {
            id: row.get(0)?,
            entry_id: row.get(1)?,
            meditated: flag(row, 2)?,
            minutes: row.get(3)?,
            notes: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    pub fn get_meditation(&self, entry_id: i64) -> Result<Option<MeditationLog>> {
        self.query_optional(
            &format!("SELECT {MEDITATION_COLUMNS} FROM meditation_logs WHERE entry_id = ?1"),
            params![entry_id],
            Self::meditation_from_row,
        )
    }

    /// Store the zero-value log (not meditated, 0 minutes) for an entry that
    /// has none yet.
    pub(super) fn create_default_meditation(&self, entry_id: i64) -> Result<MeditationLog> {
        self.conn.execute(
            "INSERT INTO meditation_logs (entry_id) VALUES (?1)
             ON CONFLICT(entry_id) DO NOTHING",
            params![entry_id],
        )?;
        self.get_meditation(entry_id)?
            .with_context(|| format!("Meditation log for entry {entry_id} not found"))
    }

    pub fn upsert_meditation(&self, new: &NewMeditation) -> Result<MeditationLog> {
        self.conn.execute(
            "INSERT INTO meditation_logs (entry_id, meditated, minutes, notes)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(entry_id) DO UPDATE SET
                meditated = excluded.meditated,
                minutes = excluded.minutes,
                notes = excluded.notes,
                updated_at = datetime('now')",
            params![
                new.entry_id,
                i64::from(new.meditated),
                new.minutes,
                new.notes
            ],
        )?;
        self.get_meditation(new.entry_id)?
            .context("Meditation log not found after upsert")
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn entry_id(db: &Database) -> i64 {
        db.get_or_create_entry(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
            .unwrap()
            .entry
            .id
    }

    fn log_count(db: &Database) -> i64 {
        db.conn
            .query_row("SELECT COUNT(*) FROM meditation_logs", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_get_or_create_materializes_default_log() {
        let db = Database::open_in_memory().unwrap();
        let daily = db
            .get_or_create_entry(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
            .unwrap();

        assert!(daily.meditation.id > 0);
        assert!(!daily.meditation.meditated);
        assert_eq!(daily.meditation.minutes, 0);
        assert!(daily.meditation.notes.is_none());
        assert_eq!(log_count(&db), 1);
    }

    #[test]
    fn test_upsert_meditation_round_trips_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = entry_id(&db);
        let log = db
            .upsert_meditation(&NewMeditation {
                entry_id: id,
                meditated: true,
                minutes: 25,
                notes: Some("counted breaths".to_string()),
            })
            .unwrap();

        assert_eq!(log.entry_id, id);
        assert!(log.meditated);
        assert_eq!(log.minutes, 25);
        assert_eq!(log.notes.as_deref(), Some("counted breaths"));
    }

    #[test]
    fn test_upsert_meditation_overwrites_default_row() {
        let db = Database::open_in_memory().unwrap();
        let id = entry_id(&db);
        let default = db.get_meditation(id).unwrap().unwrap();

        let updated = db
            .upsert_meditation(&NewMeditation {
                entry_id: id,
                meditated: true,
                minutes: 10,
                notes: None,
            })
            .unwrap();
        assert_eq!(updated.id, default.id);
        assert_eq!(log_count(&db), 1);

        let cleared = db
            .upsert_meditation(&NewMeditation {
                entry_id: id,
                meditated: false,
                minutes: 0,
                notes: None,
            })
            .unwrap();
        assert!(!cleared.meditated);
        assert_eq!(log_count(&db), 1);
    }

    #[test]
    fn test_upsert_meditation_rejects_negative_minutes() {
        let db = Database::open_in_memory().unwrap();
        let id = entry_id(&db);
        let result = db.upsert_meditation(&NewMeditation {
            entry_id: id,
            meditated: true,
            minutes: -5,
            notes: None,
        });
        assert!(result.is_err());
        assert_eq!(db.get_meditation(id).unwrap().unwrap().minutes, 0);
    }

    #[test]
    fn test_upsert_meditation_unknown_entry_fails() {
        let db = Database::open_in_memory().unwrap();
        let result = db.upsert_meditation(&NewMeditation {
            entry_id: 42,
            meditated: true,
            minutes: 5,
            notes: None,
        });
        assert!(result.is_err());
    }
}
