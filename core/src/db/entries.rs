use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::params;

use super::{Database, format_date};
use crate::models::{DailyEntry, Entry};

const ENTRY_COLUMNS: &str = "id, date, created_at, updated_at";

impl Database {
    // Expects columns in ENTRY_COLUMNS order.
    pub(super) fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        Ok(Entry {
            id: row.get(0)?,
            date: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }

    pub fn find_entry(&self, date: NaiveDate) -> Result<Option<Entry>> {
        self.query_optional(
            &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE date = ?1"),
            params![format_date(date)],
            Self::entry_from_row,
        )
    }

    pub fn get_entry_by_id(&self, id: i64) -> Result<Entry> {
        self.conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1"),
                params![id],
                Self::entry_from_row,
            )
            .with_context(|| format!("Entry {id} not found"))
    }

    /// Return the composed entry for `date`, creating the entry row first if
    /// the date has none.
    pub fn get_or_create_entry(&self, date: NaiveDate) -> Result<DailyEntry> {
        if let Some(existing) = self.find_entry(date)? {
            return self.build_daily_entry(existing);
        }

        self.conn.execute(
            "INSERT INTO entries (date) VALUES (?1)",
            params![format_date(date)],
        )?;
        let created = self.get_entry_by_id(self.conn.last_insert_rowid())?;
        self.build_daily_entry(created)
    }

    pub fn get_entry(&self, date: NaiveDate) -> Result<Option<DailyEntry>> {
        match self.find_entry(date)? {
            Some(entry) => Ok(Some(self.build_daily_entry(entry)?)),
            None => Ok(None),
        }
    }

    /// Entries with `start <= date <= end`, newest first. An inverted range
    /// matches nothing.
    pub fn list_entries(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries
             WHERE date BETWEEN ?1 AND ?2
             ORDER BY date DESC"
        ))?;
        let entries = stmt
            .query_map(
                params![format_date(start), format_date(end)],
                Self::entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn list_all_entries(&self) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY date DESC"
        ))?;
        let entries = stmt
            .query_map([], Self::entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Entries with at least one response whose text contains `query`, newest
    /// first. Matching follows SQLite `LIKE` (ASCII case-insensitive); `%`,
    /// `_` and `\` in the query match literally.
    pub fn search_entries(&self, query: &str) -> Result<Vec<Entry>> {
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT e.id, e.date, e.created_at, e.updated_at
             FROM entries e
             JOIN precept_responses pr ON pr.entry_id = e.id
             WHERE pr.response LIKE ?1 ESCAPE '\\'
             ORDER BY e.date DESC",
        )?;
        let entries = stmt
            .query_map(params![pattern], Self::entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewResponse;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn respond(db: &Database, entry_id: i64, precept: i64, text: &str) {
        db.upsert_response(&NewResponse {
            entry_id,
            precept_number: precept,
            response: Some(text.to_string()),
            rating: None,
            prompt_text: None,
        })
        .unwrap();
    }

    fn entry_count(db: &Database) -> i64 {
        db.conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_get_or_create_creates_entry() {
        let db = Database::open_in_memory().unwrap();
        let daily = db.get_or_create_entry(day(1)).unwrap();

        assert_eq!(daily.entry.date, "2024-01-01");
        assert!(!daily.entry.created_at.is_empty());
        assert!(daily.responses.is_empty());
        assert_eq!(entry_count(&db), 1);
    }

    #[test]
    fn test_get_or_create_is_create_once() {
        let db = Database::open_in_memory().unwrap();
        let first = db.get_or_create_entry(day(5)).unwrap();
        for _ in 0..4 {
            let again = db.get_or_create_entry(day(5)).unwrap();
            assert_eq!(again.entry.id, first.entry.id);
        }
        assert_eq!(entry_count(&db), 1);
    }

    #[test]
    fn test_get_entry_does_not_create() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_entry(day(2)).unwrap().is_none());
        assert_eq!(entry_count(&db), 0);

        let created = db.get_or_create_entry(day(2)).unwrap();
        let fetched = db.get_entry(day(2)).unwrap().unwrap();
        assert_eq!(fetched.entry, created.entry);
    }

    #[test]
    fn test_duplicate_date_insert_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.get_or_create_entry(day(3)).unwrap();
        let result = db
            .conn
            .execute("INSERT INTO entries (date) VALUES ('2024-01-03')", []);
        assert!(result.is_err());
        assert_eq!(entry_count(&db), 1);
    }

    #[test]
    fn test_list_entries_inclusive_and_descending() {
        let db = Database::open_in_memory().unwrap();
        for d in [1, 3, 5, 7] {
            db.get_or_create_entry(day(d)).unwrap();
        }

        let entries = db.list_entries(day(3), day(7)).unwrap();
        let dates: Vec<&str> = entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-07", "2024-01-05", "2024-01-03"]);
    }

    #[test]
    fn test_list_entries_inverted_range_is_empty() {
        let db = Database::open_in_memory().unwrap();
        for d in [1, 2, 3] {
            db.get_or_create_entry(day(d)).unwrap();
        }
        assert!(db.list_entries(day(3), day(1)).unwrap().is_empty());
    }

    #[test]
    fn test_search_entries_matches_response_text() {
        let db = Database::open_in_memory().unwrap();
        let a = db.get_or_create_entry(day(1)).unwrap();
        let b = db.get_or_create_entry(day(2)).unwrap();
        let c = db.get_or_create_entry(day(3)).unwrap();
        respond(&db, a.entry.id, 1, "felt patient with my sister");
        respond(&db, b.entry.id, 2, "rushed through the morning");
        respond(&db, c.entry.id, 4, "patience ran thin at work");
        respond(&db, c.entry.id, 5, "still patient by evening");

        let found = db.search_entries("patien").unwrap();
        let dates: Vec<&str> = found.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-01"]);
    }

    #[test]
    fn test_search_entries_treats_wildcards_literally() {
        let db = Database::open_in_memory().unwrap();
        let a = db.get_or_create_entry(day(1)).unwrap();
        let b = db.get_or_create_entry(day(2)).unwrap();
        respond(&db, a.entry.id, 1, "gave 100% attention");
        respond(&db, b.entry.id, 1, "gave 100 minutes");

        let found = db.search_entries("100%").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date, "2024-01-01");
    }

    #[test]
    fn test_search_entries_ignores_rating_only_responses() {
        let db = Database::open_in_memory().unwrap();
        let a = db.get_or_create_entry(day(1)).unwrap();
        db.upsert_response(&NewResponse {
            entry_id: a.entry.id,
            precept_number: 3,
            response: None,
            rating: Some(4),
            prompt_text: None,
        })
        .unwrap();
        assert!(db.search_entries("").unwrap().is_empty());
    }
}
