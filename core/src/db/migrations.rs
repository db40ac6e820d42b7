use std::collections::HashSet;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;

use super::Database;

/// A named, forward-only schema script.
///
/// Once a migration has been recorded in `_migrations` its script is never run
/// again, so editing an applied migration has no effect on existing databases.
/// Add a new migration to the end of [`MIGRATIONS`] instead.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001-initial-schema",
        sql: INITIAL_SCHEMA,
    },
    Migration {
        name: "002-prompt-lookup-index",
        sql: "CREATE INDEX IF NOT EXISTS idx_custom_prompts_precept
                ON custom_prompts(precept_number, created_at);",
    },
];

const INITIAL_SCHEMA: &str = "
    CREATE TABLE entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE precept_responses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entry_id INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
        precept_number INTEGER NOT NULL CHECK (precept_number BETWEEN 1 AND 16),
        response TEXT,
        rating INTEGER CHECK (rating BETWEEN 1 AND 5),
        prompt_text TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE (entry_id, precept_number)
    );

    CREATE TABLE meditation_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entry_id INTEGER NOT NULL UNIQUE REFERENCES entries(id) ON DELETE CASCADE,
        meditated INTEGER NOT NULL DEFAULT 0 CHECK (meditated IN (0, 1)),
        minutes INTEGER NOT NULL DEFAULT 0 CHECK (minutes >= 0),
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE weekly_reflections (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        week_start TEXT NOT NULL UNIQUE,
        reflection TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE custom_prompts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        precept_number INTEGER NOT NULL CHECK (precept_number BETWEEN 1 AND 16),
        prompt_text TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE settings (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE INDEX idx_precept_responses_entry ON precept_responses(entry_id);
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMigration {
    pub name: String,
    pub applied_at: String,
}

impl Database {
    pub(super) fn migrate(&mut self) -> Result<usize> {
        run_migrations(&mut self.conn, MIGRATIONS)
    }

    /// Bookkeeping rows in the order the migrations were applied.
    pub fn applied_migrations(&self) -> Result<Vec<AppliedMigration>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, applied_at FROM _migrations ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AppliedMigration {
                    name: row.get(0)?,
                    applied_at: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// Apply every migration whose name is not yet recorded, in list order.
///
/// Each script runs in the same transaction as its bookkeeping insert. Returns
/// the number of migrations applied.
pub(crate) fn run_migrations(conn: &mut Connection, migrations: &[Migration]) -> Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let applied: HashSet<String> = {
        let mut stmt = conn.prepare("SELECT name FROM _migrations")?;
        stmt.query_map([], |row| row.get(0))?
            .collect::<Result<HashSet<_>, _>>()?
    };

    let mut count = 0;
    for migration in migrations {
        if applied.contains(migration.name) {
            continue;
        }

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)
            .with_context(|| format!("Migration {} failed", migration.name))?;
        tx.execute(
            "INSERT INTO _migrations (name) VALUES (?1)",
            params![migration.name],
        )?;
        tx.commit()?;
        count += 1;
    }

    Ok(count)
}
