use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::params;

use super::{Database, format_date};
use crate::models::{NewResponse, PreceptResponse};

const RESPONSE_COLUMNS: &str =
    "id, entry_id, precept_number, response, rating, prompt_text, created_at, updated_at";

impl Database {
    // Expects columns in RESPONSE_COLUMNS order.
    fn response_from_row(row: &rusqlite::Row) -> rusqlite::Result<PreceptResponse> {
        Ok(PreceptResponse {
            id: row.get(0)?,
            entry_id: row.get(1)?,
            precept_number: row.get(2)?,
            response: row.get(3)?,
            rating: row.get(4)?,
            prompt_text: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    /// Insert the response for `(entry_id, precept_number)`, or overwrite the
    /// text, rating, and prompt of the one already stored.
    pub fn upsert_response(&self, new: &NewResponse) -> Result<PreceptResponse> {
        self.conn.execute(
            "INSERT INTO precept_responses (entry_id, precept_number, response, rating, prompt_text)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(entry_id, precept_number) DO UPDATE SET
                response = excluded.response,
                rating = excluded.rating,
                prompt_text = excluded.prompt_text,
                updated_at = datetime('now')",
            params![
                new.entry_id,
                new.precept_number,
                new.response,
                new.rating,
                new.prompt_text,
            ],
        )?;
        self.get_response(new.entry_id, new.precept_number)?
            .context("Precept response not found after upsert")
    }

    pub fn get_response(
        &self,
        entry_id: i64,
        precept_number: i64,
    ) -> Result<Option<PreceptResponse>> {
        self.query_optional(
            &format!(
                "SELECT {RESPONSE_COLUMNS} FROM precept_responses
                 WHERE entry_id = ?1 AND precept_number = ?2"
            ),
            params![entry_id, precept_number],
            Self::response_from_row,
        )
    }

    /// Response for one precept on the entry dated `date`, if both exist.
    pub fn find_response_on(
        &self,
        date: NaiveDate,
        precept_number: i64,
    ) -> Result<Option<PreceptResponse>> {
        self.query_optional(
            "SELECT pr.id, pr.entry_id, pr.precept_number, pr.response, pr.rating,
                    pr.prompt_text, pr.created_at, pr.updated_at
             FROM precept_responses pr
             JOIN entries e ON e.id = pr.entry_id
             WHERE e.date = ?1 AND pr.precept_number = ?2",
            params![format_date(date), precept_number],
            Self::response_from_row,
        )
    }

    pub fn get_responses_for_entry(&self, entry_id: i64) -> Result<Vec<PreceptResponse>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM precept_responses
             WHERE entry_id = ?1
             ORDER BY precept_number"
        ))?;
        let responses = stmt
            .query_map(params![entry_id], Self::response_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(responses)
    }
}
