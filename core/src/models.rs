use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Number of precepts in the taxonomy. Precept numbers run `1..=PRECEPT_COUNT`.
pub const PRECEPT_COUNT: i64 = 16;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: i64,
    pub date: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreceptResponse {
    pub id: i64,
    pub entry_id: i64,
    pub precept_number: i64,
    pub response: Option<String>,
    pub rating: Option<i64>,
    pub prompt_text: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeditationLog {
    pub id: i64,
    pub entry_id: i64,
    pub meditated: bool,
    pub minutes: i64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl MeditationLog {
    /// Zero-value log for an entry that has no stored row. Never persisted;
    /// `id` is 0 and the timestamps mirror the entry's.
    #[must_use]
    pub fn unrecorded(entry: &Entry) -> Self {
        Self {
            id: 0,
            entry_id: entry.id,
            meditated: false,
            minutes: 0,
            notes: None,
            created_at: entry.created_at.clone(),
            updated_at: entry.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReflection {
    pub id: i64,
    pub week_start: String,
    pub reflection: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPrompt {
    pub id: i64,
    pub precept_number: i64,
    pub prompt_text: String,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

/// One day of journaling: the entry, its responses ordered by precept number,
/// and its meditation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub entry: Entry,
    pub responses: Vec<PreceptResponse>,
    pub meditation: MeditationLog,
}

impl DailyEntry {
    /// Responses that carry reflection text.
    #[must_use]
    pub fn reflected_count(&self) -> usize {
        self.responses
            .iter()
            .filter(|r| r.response.as_deref().is_some_and(|t| !t.is_empty()))
            .count()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResponse {
    pub entry_id: i64,
    pub precept_number: i64,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub prompt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeditation {
    pub entry_id: i64,
    pub meditated: bool,
    pub minutes: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Fields to change on a custom prompt. `None` leaves the stored value as is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptUpdate {
    #[serde(default)]
    pub prompt_text: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl PromptUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompt_text.is_none() && self.is_active.is_none()
    }
}

// --- Statistics ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakInfo {
    pub current: i64,
    pub longest: i64,
    pub last_entry_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeditationPoint {
    pub date: String,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapDay {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreceptAverage {
    pub precept_number: i64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreceptRatingSummary {
    pub precept_number: i64,
    pub average: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub week_start: String,
    pub week_end: String,
    pub days_with_entries: i64,
    /// Responses in range with text or a rating.
    pub total_precepts: i64,
    pub total_meditation_minutes: i64,
    pub days_with_meditation: i64,
    pub average_ratings: Vec<PreceptRatingSummary>,
    /// Up to three precept numbers, highest average first.
    pub top_precepts: Vec<i64>,
    /// Up to three precept numbers, lowest average first.
    pub growth_precepts: Vec<i64>,
    pub reflection: Option<WeeklyReflection>,
}

// --- Validation ---

pub fn validate_precept_number(number: i64) -> Result<i64> {
    if !(1..=PRECEPT_COUNT).contains(&number) {
        bail!("Invalid precept number {number}. Must be between 1 and {PRECEPT_COUNT}");
    }
    Ok(number)
}

pub fn validate_rating(rating: Option<i64>) -> Result<Option<i64>> {
    if let Some(r) = rating {
        if !(MIN_RATING..=MAX_RATING).contains(&r) {
            bail!("Invalid rating {r}. Must be between {MIN_RATING} and {MAX_RATING}");
        }
    }
    Ok(rating)
}

pub fn validate_minutes(minutes: i64) -> Result<i64> {
    if minutes < 0 {
        bail!("Meditation minutes must be non-negative (got {minutes})");
    }
    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> Entry {
        Entry {
            id: 7,
            date: "2024-03-04".to_string(),
            created_at: "2024-03-04 08:00:00".to_string(),
            updated_at: "2024-03-04 09:00:00".to_string(),
        }
    }

    #[test]
    fn test_validate_precept_number() {
        assert_eq!(validate_precept_number(1).unwrap(), 1);
        assert_eq!(validate_precept_number(16).unwrap(), 16);
        assert!(validate_precept_number(0).is_err());
        assert!(validate_precept_number(17).is_err());
        assert!(validate_precept_number(-3).is_err());
    }

    #[test]
    fn test_validate_rating() {
        assert_eq!(validate_rating(None).unwrap(), None);
        assert_eq!(validate_rating(Some(1)).unwrap(), Some(1));
        assert_eq!(validate_rating(Some(5)).unwrap(), Some(5));
        assert!(validate_rating(Some(0)).is_err());
        assert!(validate_rating(Some(6)).is_err());
    }

    #[test]
    fn test_validate_minutes() {
        assert_eq!(validate_minutes(0).unwrap(), 0);
        assert_eq!(validate_minutes(45).unwrap(), 45);
        assert!(validate_minutes(-1).is_err());
    }

    #[test]
    fn test_unrecorded_meditation_mirrors_entry() {
        let entry = sample_entry();
        let log = MeditationLog::unrecorded(&entry);
        assert_eq!(log.id, 0);
        assert_eq!(log.entry_id, 7);
        assert!(!log.meditated);
        assert_eq!(log.minutes, 0);
        assert_eq!(log.created_at, entry.created_at);
    }

    #[test]
    fn test_prompt_update_is_empty() {
        assert!(PromptUpdate::default().is_empty());
        let update = PromptUpdate {
            is_active: Some(false),
            ..PromptUpdate::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_prompt_update_deserializes_partial_fields() {
        let update: PromptUpdate = serde_json::from_str(r#"{"isActive": false}"#).unwrap();
        assert_eq!(update.is_active, Some(false));
        assert!(update.prompt_text.is_none());
    }

    #[test]
    fn test_entities_serialize_camel_case() {
        let json = serde_json::to_value(sample_entry()).unwrap();
        assert_eq!(json["createdAt"], "2024-03-04 08:00:00");
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_reflected_count_ignores_rating_only_and_empty() {
        let entry = sample_entry();
        let response = |n: i64, text: Option<&str>, rating: Option<i64>| PreceptResponse {
            id: n,
            entry_id: entry.id,
            precept_number: n,
            response: text.map(str::to_string),
            rating,
            prompt_text: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let daily = DailyEntry {
            meditation: MeditationLog::unrecorded(&entry),
            responses: vec![
                response(1, Some("noticed impatience"), None),
                response(2, None, Some(4)),
                response(3, Some(""), Some(2)),
            ],
            entry,
        };
        assert_eq!(daily.reflected_count(), 1);
    }
}
