//! Journal export as Markdown or JSON.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::db::DATE_FORMAT;
use crate::models::{DailyEntry, MAX_RATING};
use crate::precepts::{PreceptGroup, precept};

pub const NO_ENTRIES: &str = "No entries found for the selected date range.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    exported_at: String,
    entries: Vec<ExportedEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedEntry<'a> {
    date: &'a str,
    responses: Vec<ExportedResponse<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meditation: Option<ExportedMeditation<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportedResponse<'a> {
    precept_number: i64,
    vow: &'a str,
    response: Option<&'a str>,
    rating: Option<i64>,
    prompt_text: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ExportedMeditation<'a> {
    meditated: bool,
    minutes: i64,
    notes: Option<&'a str>,
}

/// "Monday, January 1, 2024". Unparseable dates are returned unchanged.
fn long_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_or_else(|_| date.to_string(), |d| d.format("%A, %B %-d, %Y").to_string())
}

fn rating_dots(rating: i64) -> String {
    let max = usize::try_from(MAX_RATING).unwrap_or(5);
    let filled = usize::try_from(rating).unwrap_or(0).min(max);
    format!("{}{}", "●".repeat(filled), "○".repeat(max - filled))
}

#[must_use]
pub fn to_markdown(entries: &[DailyEntry], include_meditation: bool) -> String {
    let mut out = String::from("# Precept Tracker Journal\n\n");

    for daily in entries {
        let _ = writeln!(out, "## {}\n", long_date(&daily.entry.date));

        let mut current_group: Option<PreceptGroup> = None;
        for resp in &daily.responses {
            let Some(meta) = precept(resp.precept_number) else {
                continue;
            };
            if current_group != Some(meta.group) {
                current_group = Some(meta.group);
                let _ = writeln!(out, "### {}\n", meta.group.name());
            }

            let _ = writeln!(out, "**{}. {}**", resp.precept_number, meta.vow);
            if let Some(prompt) = resp.prompt_text.as_deref().filter(|p| !p.is_empty()) {
                let _ = writeln!(out, "*Prompt: \"{prompt}\"*");
            }
            out.push('\n');

            if let Some(text) = resp.response.as_deref().filter(|t| !t.is_empty()) {
                let _ = writeln!(out, "{text}\n");
            }
            if let Some(rating) = resp.rating {
                let _ = writeln!(
                    out,
                    "Rating: {} ({rating}/{MAX_RATING})\n",
                    rating_dots(rating)
                );
            }
        }

        if include_meditation {
            let m = &daily.meditation;
            out.push_str("### Meditation\n");
            let _ = writeln!(out, "- Meditated: {}", if m.meditated { "Yes" } else { "No" });
            if m.meditated {
                let _ = writeln!(out, "- Duration: {} minutes", m.minutes);
            }
            if let Some(notes) = m.notes.as_deref().filter(|n| !n.is_empty()) {
                let _ = writeln!(out, "- Notes: {notes}");
            }
            out.push('\n');
        }

        out.push_str("---\n\n");
    }

    out
}

pub fn to_json(
    entries: &[DailyEntry],
    include_meditation: bool,
    exported_at: DateTime<Utc>,
) -> Result<String> {
    let document = ExportDocument {
        exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        entries: entries
            .iter()
            .map(|daily| ExportedEntry {
                date: &daily.entry.date,
                responses: daily
                    .responses
                    .iter()
                    .map(|r| ExportedResponse {
                        precept_number: r.precept_number,
                        vow: precept(r.precept_number).map_or("", |p| p.vow),
                        response: r.response.as_deref(),
                        rating: r.rating,
                        prompt_text: r.prompt_text.as_deref(),
                    })
                    .collect(),
                meditation: include_meditation.then(|| ExportedMeditation {
                    meditated: daily.meditation.meditated,
                    minutes: daily.meditation.minutes,
                    notes: daily.meditation.notes.as_deref(),
                }),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}
