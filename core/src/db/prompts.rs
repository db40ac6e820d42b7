use anyhow::{Context, Result, bail};
use rusqlite::params;

use super::{Database, flag};
use crate::models::{CustomPrompt, PromptUpdate};

const PROMPT_COLUMNS: &str = "id, precept_number, prompt_text, is_active, created_at";

impl Database {
    // Expects columns in PROMPT_COLUMNS order.
    fn prompt_from_row(row: &rusqlite::Row) -> rusqlite::Result<CustomPrompt> {
        Ok(CustomPrompt {
            id: row.get(0)?,
            precept_number: row.get(1)?,
            prompt_text: row.get(2)?,
            is_active: flag(row, 3)?,
            created_at: row.get(4)?,
        })
    }

    /// Custom prompts in creation order, optionally for one precept. Unfiltered
    /// listings are grouped by precept number first.
    pub fn list_prompts(&self, precept_number: Option<i64>) -> Result<Vec<CustomPrompt>> {
        let prompts = if let Some(number) = precept_number {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {PROMPT_COLUMNS} FROM custom_prompts
                 WHERE precept_number = ?1
                 ORDER BY created_at, id"
            ))?;
            stmt.query_map(params![number], Self::prompt_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {PROMPT_COLUMNS} FROM custom_prompts
                 ORDER BY precept_number, created_at, id"
            ))?;
            stmt.query_map([], Self::prompt_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(prompts)
    }

    pub fn get_prompt(&self, id: i64) -> Result<Option<CustomPrompt>> {
        self.query_optional(
            &format!("SELECT {PROMPT_COLUMNS} FROM custom_prompts WHERE id = ?1"),
            params![id],
            Self::prompt_from_row,
        )
    }

    pub fn create_prompt(&self, precept_number: i64, prompt_text: &str) -> Result<CustomPrompt> {
        self.conn.execute(
            "INSERT INTO custom_prompts (precept_number, prompt_text) VALUES (?1, ?2)",
            params![precept_number, prompt_text],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_prompt(id)?
            .with_context(|| format!("Custom prompt {id} not found after insert"))
    }

    /// Apply the supplied fields; omitted fields keep their stored values.
    pub fn update_prompt(&self, id: i64, update: &PromptUpdate) -> Result<CustomPrompt> {
        let changed = self.conn.execute(
            "UPDATE custom_prompts SET
                prompt_text = COALESCE(?1, prompt_text),
                is_active = COALESCE(?2, is_active)
             WHERE id = ?3",
            params![
                update.prompt_text,
                update.is_active.map(i64::from),
                id
            ],
        )?;
        if changed == 0 {
            bail!("Custom prompt {id} not found");
        }
        self.get_prompt(id)?
            .with_context(|| format!("Custom prompt {id} not found"))
    }

    /// Returns `false` when no prompt has that id.
    pub fn delete_prompt(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM custom_prompts WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_prompt_defaults_active() {
        let db = Database::open_in_memory().unwrap();
        let prompt = db
            .create_prompt(3, "Who supported you today?")
            .unwrap();
        assert_eq!(prompt.precept_number, 3);
        assert_eq!(prompt.prompt_text, "Who supported you today?");
        assert!(prompt.is_active);
        assert!(!prompt.created_at.is_empty());
    }

    #[test]
    fn test_list_prompts_filtered_and_unfiltered_order() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_prompt(5, "first for five").unwrap();
        let b = db.create_prompt(2, "first for two").unwrap();
        let c = db.create_prompt(5, "second for five").unwrap();

        let five: Vec<i64> = db
            .list_prompts(Some(5))
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(five, vec![a.id, c.id]);

        let all: Vec<i64> = db.list_prompts(None).unwrap().iter().map(|p| p.id).collect();
        assert_eq!(all, vec![b.id, a.id, c.id]);
        assert!(db.list_prompts(Some(9)).unwrap().is_empty());
    }

    #[test]
    fn test_update_prompt_active_flag_keeps_text() {
        let db = Database::open_in_memory().unwrap();
        let prompt = db.create_prompt(1, "original").unwrap();
        let updated = db
            .update_prompt(
                prompt.id,
                &PromptUpdate {
                    is_active: Some(false),
                    ..PromptUpdate::default()
                },
            )
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.prompt_text, "original");
    }

    #[test]
    fn test_update_prompt_text_keeps_active_flag() {
        let db = Database::open_in_memory().unwrap();
        let prompt = db.create_prompt(1, "original").unwrap();
        db.update_prompt(
            prompt.id,
            &PromptUpdate {
                is_active: Some(false),
                ..PromptUpdate::default()
            },
        )
        .unwrap();

        let updated = db
            .update_prompt(
                prompt.id,
                &PromptUpdate {
                    prompt_text: Some("x".to_string()),
                    ..PromptUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.prompt_text, "x");
        assert!(!updated.is_active);
    }

    #[test]
    fn test_update_prompt_empty_update_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let prompt = db.create_prompt(1, "original").unwrap();
        let same = db.update_prompt(prompt.id, &PromptUpdate::default()).unwrap();
        assert_eq!(same, prompt);
    }

    #[test]
    fn test_update_missing_prompt_errors() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .update_prompt(99, &PromptUpdate::default())
            .unwrap_err();
        assert!(err.to_string().contains("Custom prompt 99 not found"));
    }

    #[test]
    fn test_delete_prompt() {
        let db = Database::open_in_memory().unwrap();
        let prompt = db.create_prompt(4, "temporary").unwrap();
        assert!(db.delete_prompt(prompt.id).unwrap());
        assert!(db.get_prompt(prompt.id).unwrap().is_none());
        assert!(!db.delete_prompt(prompt.id).unwrap());
    }

    #[test]
    fn test_create_prompt_rejects_invalid_precept() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_prompt(0, "nope").is_err());
        assert!(db.create_prompt(17, "nope").is_err());
    }
}
