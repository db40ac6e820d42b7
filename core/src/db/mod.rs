mod compose;
mod entries;
mod meditation;
mod migrations;
mod prompts;
mod responses;
mod settings;
mod stats;
mod weekly;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, Params, Row};

pub use compose::rank_precepts;
pub use migrations::{AppliedMigration, MIGRATIONS, Migration};
pub use stats::compute_streak;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The single connection to the journal database.
///
/// Opening enables WAL journaling and foreign-key enforcement, then applies any
/// pending migrations before the handle is returned.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        // In-memory databases report "memory" here; only file databases switch to WAL.
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.pragma_update(None, "foreign_keys", true)?;

        let mut db = Database { conn };
        db.migrate().context("Failed to apply database migrations")?;
        Ok(db)
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, err)| err)
            .context("Failed to close database")
    }

    pub fn journal_mode(&self) -> Result<String> {
        Ok(self
            .conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))?)
    }

    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let enabled: i64 = self
            .conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))?;
        Ok(enabled == 1)
    }

    /// Run a query expected to match at most one row.
    fn query_optional<T, P>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> Result<Option<T>>
    where
        P: Params,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        if let Some(row) = rows.next()? {
            Ok(Some(map(row)?))
        } else {
            Ok(None)
        }
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Read a 0/1 integer column as a boolean.
fn flag(row: &Row, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(idx)? != 0)
}
