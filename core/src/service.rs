use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::{Days, Utc};

use crate::calendar::parse_iso_date;
use crate::db::{AppliedMigration, Database};
use crate::export::{self, ExportFormat, NO_ENTRIES};
use crate::models::{
    CustomPrompt, DailyEntry, Entry, HeatmapDay, MeditationLog, MeditationPoint, NewMeditation,
    NewResponse, PreceptAverage, PreceptResponse, PromptUpdate, Setting, StreakInfo,
    WeeklyReflection, WeeklySummary, validate_minutes, validate_precept_number, validate_rating,
};
use crate::precepts::precept;
use crate::rotation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// A private in-memory database. Closing discards its contents.
    InMemory,
}

/// Process-lifetime handle to the journal.
///
/// The database is opened on the first operation and kept until [`close`]
/// is called; the next operation after that opens it again. Dates are
/// `YYYY-MM-DD` strings.
///
/// [`close`]: JournalService::close
pub struct JournalService {
    location: DbLocation,
    db: Option<Database>,
}

impl JournalService {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            location: DbLocation::File(db_path.into()),
            db: None,
        }
    }

    #[must_use]
    pub fn new_in_memory() -> Self {
        Self {
            location: DbLocation::InMemory,
            db: None,
        }
    }

    #[must_use]
    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    /// Open the database if it is not open yet and return it.
    pub fn open(&mut self) -> Result<&Database> {
        let db = match self.db.take() {
            Some(db) => db,
            None => match &self.location {
                DbLocation::File(path) => Database::open(Path::new(path))?,
                DbLocation::InMemory => Database::open_in_memory()?,
            },
        };
        Ok(&*self.db.insert(db))
    }

    /// Release the connection. Does nothing if it is not open.
    pub fn close(&mut self) -> Result<()> {
        match self.db.take() {
            Some(db) => db.close(),
            None => Ok(()),
        }
    }

    pub fn applied_migrations(&mut self) -> Result<Vec<AppliedMigration>> {
        self.open()?.applied_migrations()
    }

    // --- Entries ---

    pub fn get_or_create_entry(&mut self, date: &str) -> Result<DailyEntry> {
        let date = parse_iso_date(date)?;
        self.open()?.get_or_create_entry(date)
    }

    pub fn get_entry(&mut self, date: &str) -> Result<Option<DailyEntry>> {
        let date = parse_iso_date(date)?;
        self.open()?.get_entry(date)
    }

    pub fn list_entries(&mut self, start: &str, end: &str) -> Result<Vec<Entry>> {
        let (start, end) = (parse_iso_date(start)?, parse_iso_date(end)?);
        self.open()?.list_entries(start, end)
    }

    pub fn search_entries(&mut self, query: &str) -> Result<Vec<Entry>> {
        self.open()?.search_entries(query)
    }

    pub fn upsert_response(&mut self, new: &NewResponse) -> Result<PreceptResponse> {
        validate_precept_number(new.precept_number)?;
        validate_rating(new.rating)?;
        self.open()?.upsert_response(new)
    }

    pub fn upsert_meditation(&mut self, new: &NewMeditation) -> Result<MeditationLog> {
        validate_minutes(new.minutes)?;
        self.open()?.upsert_meditation(new)
    }

    // --- Weekly ---

    pub fn get_weekly_reflection(&mut self, week_start: &str) -> Result<Option<WeeklyReflection>> {
        let week_start = parse_iso_date(week_start)?;
        self.open()?.get_weekly_reflection(week_start)
    }

    pub fn upsert_weekly_reflection(
        &mut self,
        week_start: &str,
        reflection: Option<&str>,
    ) -> Result<WeeklyReflection> {
        let week_start = parse_iso_date(week_start)?;
        self.open()?.upsert_weekly_reflection(week_start, reflection)
    }

    pub fn weekly_summary(&mut self, week_start: &str, week_end: &str) -> Result<WeeklySummary> {
        let (start, end) = (parse_iso_date(week_start)?, parse_iso_date(week_end)?);
        self.open()?.build_weekly_summary(start, end)
    }

    // --- Custom prompts ---

    pub fn list_prompts(&mut self, precept_number: Option<i64>) -> Result<Vec<CustomPrompt>> {
        if let Some(number) = precept_number {
            validate_precept_number(number)?;
        }
        self.open()?.list_prompts(precept_number)
    }

    pub fn get_prompt(&mut self, id: i64) -> Result<Option<CustomPrompt>> {
        self.open()?.get_prompt(id)
    }

    pub fn create_prompt(&mut self, precept_number: i64, prompt_text: &str) -> Result<CustomPrompt> {
        validate_precept_number(precept_number)?;
        let text = validate_prompt_text(prompt_text)?;
        self.open()?.create_prompt(precept_number, text)
    }

    pub fn update_prompt(&mut self, id: i64, update: &PromptUpdate) -> Result<CustomPrompt> {
        let update = PromptUpdate {
            prompt_text: update
                .prompt_text
                .as_deref()
                .map(validate_prompt_text)
                .transpose()?
                .map(str::to_string),
            is_active: update.is_active,
        };
        self.open()?.update_prompt(id, &update)
    }

    /// Returns `false` when no prompt has that id.
    pub fn delete_prompt(&mut self, id: i64) -> Result<bool> {
        self.open()?.delete_prompt(id)
    }

    /// Default prompts for the precept followed by its active custom prompts.
    pub fn prompt_pool(&mut self, precept_number: i64) -> Result<Vec<String>> {
        validate_precept_number(precept_number)?;
        let mut pool: Vec<String> = precept(precept_number)
            .map(|p| p.default_prompts.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        pool.extend(
            self.open()?
                .list_prompts(Some(precept_number))?
                .into_iter()
                .filter(|p| p.is_active)
                .map(|p| p.prompt_text),
        );
        Ok(pool)
    }

    /// The prompt to show for a precept on `date`.
    ///
    /// A prompt already stored with that day's response wins. Otherwise the
    /// rotated pick is used, avoiding the prompt stored the day before.
    pub fn prompt_for(&mut self, precept_number: i64, date: &str) -> Result<Option<String>> {
        let day = parse_iso_date(date)?;
        let pool = self.prompt_pool(precept_number)?;
        let db = self.open()?;

        if let Some(stored) = db
            .find_response_on(day, precept_number)?
            .and_then(|r| r.prompt_text)
        {
            return Ok(Some(stored));
        }

        let previous = match day.checked_sub_days(Days::new(1)) {
            Some(yesterday) => db
                .find_response_on(yesterday, precept_number)?
                .and_then(|r| r.prompt_text),
            None => None,
        };
        Ok(rotation::prompt_for_day(precept_number, day, &pool, previous.as_deref())
            .map(str::to_string))
    }

    pub fn next_prompt(&mut self, precept_number: i64, current: &str) -> Result<Option<String>> {
        let pool = self.prompt_pool(precept_number)?;
        Ok(rotation::next_prompt(current, &pool).map(str::to_string))
    }

    // --- Settings ---

    pub fn get_setting(&mut self, key: &str) -> Result<Option<String>> {
        self.open()?.get_setting(key)
    }

    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<Setting> {
        if key.trim().is_empty() {
            bail!("Setting key must not be empty");
        }
        self.open()?.set_setting(key, value)
    }

    pub fn get_all_settings(&mut self) -> Result<Vec<Setting>> {
        self.open()?.get_all_settings()
    }

    // --- Statistics ---

    pub fn get_streak(&mut self) -> Result<StreakInfo> {
        self.open()?.get_streak()
    }

    pub fn get_meditation_trend(&mut self, days: u32) -> Result<Vec<MeditationPoint>> {
        self.open()?.get_meditation_trend(days)
    }

    pub fn get_completion_heatmap(&mut self, days: u32) -> Result<Vec<HeatmapDay>> {
        self.open()?.get_completion_heatmap(days)
    }

    pub fn get_average_ratings(&mut self, start: &str, end: &str) -> Result<Vec<PreceptAverage>> {
        let (start, end) = (parse_iso_date(start)?, parse_iso_date(end)?);
        self.open()?.get_average_ratings(start, end)
    }

    // --- Export ---

    /// Render the whole journal, or the entries in an inclusive date range.
    pub fn export_journal(
        &mut self,
        format: ExportFormat,
        range: Option<(&str, &str)>,
        include_meditation: bool,
    ) -> Result<String> {
        let range = match range {
            Some((start, end)) => Some((parse_iso_date(start)?, parse_iso_date(end)?)),
            None => None,
        };
        let entries = self.open()?.list_daily_entries(range)?;
        if entries.is_empty() {
            bail!(NO_ENTRIES);
        }
        match format {
            ExportFormat::Markdown => Ok(export::to_markdown(&entries, include_meditation)),
            ExportFormat::Json => export::to_json(&entries, include_meditation, Utc::now()),
        }
    }
}

fn validate_prompt_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        bail!("Prompt text must not be empty");
    }
    Ok(trimmed)
}
