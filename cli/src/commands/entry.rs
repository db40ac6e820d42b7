use anyhow::{Result, bail};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use precept_core::models::{
    DailyEntry, Entry, NewMeditation, NewResponse, PRECEPT_COUNT, validate_precept_number,
};
use precept_core::precepts::precept;
use precept_core::service::JournalService;

use super::helpers::{
    iso, json_error, parse_date, parse_range, precept_label, print_json, rating_stars, truncate,
};

pub(crate) fn cmd_today(svc: &mut JournalService, date: Option<String>, json: bool) -> Result<()> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct DayPrompt {
        precept_number: i64,
        prompt: Option<String>,
    }

    #[derive(Serialize)]
    struct Today {
        #[serde(flatten)]
        daily: DailyEntry,
        prompts: Vec<DayPrompt>,
    }

    #[derive(Tabled)]
    struct TodayRow {
        #[tabled(rename = "#")]
        number: i64,
        #[tabled(rename = "Precept")]
        name: String,
        #[tabled(rename = "Rating")]
        rating: String,
        #[tabled(rename = "Reflection")]
        reflection: String,
        #[tabled(rename = "Prompt")]
        prompt: String,
    }

    let date = iso(parse_date(date)?);
    let daily = svc.get_or_create_entry(&date)?;
    let prompts = (1..=PRECEPT_COUNT)
        .map(|n| -> Result<DayPrompt> {
            Ok(DayPrompt {
                precept_number: n,
                prompt: svc.prompt_for(n, &date)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if json {
        return print_json(&Today { daily, prompts });
    }

    let rows: Vec<TodayRow> = prompts
        .iter()
        .map(|p| {
            let response = daily
                .responses
                .iter()
                .find(|r| r.precept_number == p.precept_number);
            TodayRow {
                number: p.precept_number,
                name: precept_label(p.precept_number),
                rating: rating_stars(response.and_then(|r| r.rating)),
                reflection: response
                    .and_then(|r| r.response.as_deref())
                    .map_or_else(|| "-".to_string(), |t| truncate(t, 30)),
                prompt: p.prompt.as_deref().map(|t| truncate(t, 50)).unwrap_or_default(),
            }
        })
        .collect();

    println!("Journal for {date}");
    println!(
        "{}",
        Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::first()).with(Alignment::right()))
    );
    let m = &daily.meditation;
    if m.meditated {
        println!("Meditation: {} min", m.minutes);
    } else {
        println!("Meditation: not yet");
    }
    println!(
        "{} of {PRECEPT_COUNT} precepts reflected on",
        daily.reflected_count()
    );

    Ok(())
}

fn print_daily_entry(daily: &DailyEntry) {
    println!("Entry {} ({})", daily.entry.date, daily.entry.id);
    if daily.responses.is_empty() {
        println!("  No precept responses yet.");
    }
    for r in &daily.responses {
        let vow = precept(r.precept_number).map_or("", |p| p.vow);
        println!();
        println!("  {}. {vow}", r.precept_number);
        if let Some(ref prompt) = r.prompt_text {
            println!("     Prompt: {prompt}");
        }
        if let Some(ref text) = r.response {
            println!("     {text}");
        }
        if r.rating.is_some() {
            println!("     Rating: {}", rating_stars(r.rating));
        }
    }

    let m = &daily.meditation;
    println!();
    if m.meditated {
        println!("  Meditated {} min", m.minutes);
    } else {
        println!("  Did not meditate");
    }
    if let Some(ref notes) = m.notes {
        println!("  Notes: {notes}");
    }
}

pub(crate) fn cmd_entry_show(
    svc: &mut JournalService,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = iso(parse_date(date)?);

    if let Some(daily) = svc.get_entry(&date)? {
        if json {
            print_json(&daily)?;
        } else {
            print_daily_entry(&daily);
        }
    } else if json {
        println!("{}", json_error(&format!("No entry for {date}")));
    } else {
        eprintln!("No entry for {date}");
    }

    Ok(())
}

fn print_entry_table(entries: &[Entry]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Last updated")]
        updated_at: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| EntryRow {
            id: e.id,
            date: e.date.clone(),
            updated_at: e.updated_at.clone(),
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn cmd_entry_list(
    svc: &mut JournalService,
    from: Option<String>,
    to: Option<String>,
    days: u32,
    json: bool,
) -> Result<()> {
    let (start, end) = parse_range(from, to, days)?;
    let entries = svc.list_entries(&iso(start), &iso(end))?;

    if json {
        print_json(&entries)?;
    } else if entries.is_empty() {
        eprintln!("No entries between {} and {}", iso(start), iso(end));
    } else {
        print_entry_table(&entries);
    }

    Ok(())
}

pub(crate) fn cmd_entry_search(svc: &mut JournalService, query: &str, json: bool) -> Result<()> {
    let entries = svc.search_entries(query)?;

    if json {
        print_json(&entries)?;
    } else if entries.is_empty() {
        eprintln!("No entries mention '{query}'");
    } else {
        print_entry_table(&entries);
    }

    Ok(())
}

/// Record a reflection and/or rating. Fields not given keep their stored
/// values; a new response takes the day's rotated prompt unless one is given.
pub(crate) fn cmd_respond(
    svc: &mut JournalService,
    precept_number: i64,
    text: Option<String>,
    rating: Option<i64>,
    prompt: Option<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    validate_precept_number(precept_number)?;
    let date = iso(parse_date(date)?);
    let daily = svc.get_or_create_entry(&date)?;
    let existing = daily
        .responses
        .into_iter()
        .find(|r| r.precept_number == precept_number);

    if text.is_none() && rating.is_none() && existing.is_none() {
        bail!("Nothing to record. Pass --text and/or --rating");
    }

    let (old_text, old_rating, old_prompt) = match existing {
        Some(r) => (r.response, r.rating, r.prompt_text),
        None => (None, None, None),
    };
    let prompt_text = match prompt.or(old_prompt) {
        Some(p) => Some(p),
        None => svc.prompt_for(precept_number, &date)?,
    };

    let saved = svc.upsert_response(&NewResponse {
        entry_id: daily.entry.id,
        precept_number,
        response: text.or(old_text),
        rating: rating.or(old_rating),
        prompt_text,
    })?;

    if json {
        print_json(&saved)?;
    } else {
        println!(
            "Saved {} for {date} (rating {})",
            precept_label(precept_number),
            rating_stars(saved.rating)
        );
    }

    Ok(())
}

pub(crate) fn cmd_meditate(
    svc: &mut JournalService,
    minutes: Option<i64>,
    notes: Option<String>,
    skipped: bool,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = iso(parse_date(date)?);
    let daily = svc.get_or_create_entry(&date)?;
    let current = daily.meditation;

    let minutes = match minutes {
        Some(m) => m,
        None if skipped => 0,
        None => current.minutes,
    };
    let log = svc.upsert_meditation(&NewMeditation {
        entry_id: daily.entry.id,
        meditated: !skipped,
        minutes,
        notes: notes.or(current.notes),
    })?;

    if json {
        print_json(&log)?;
    } else if log.meditated {
        println!("Logged {} min of meditation for {date}", log.minutes);
    } else {
        println!("Marked {date} as no meditation");
    }

    Ok(())
}
