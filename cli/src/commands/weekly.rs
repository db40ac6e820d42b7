use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use precept_core::calendar::week_bounds_offset;
use precept_core::service::JournalService;

use super::helpers::{iso, json_error, parse_date, precept_label, print_json, rating_stars};

/// `YYYY-MM-DD` bounds of the week containing `date`, shifted by `offset` weeks.
fn week_of(date: Option<String>, offset: i64) -> Result<(String, String)> {
    let (start, end) = week_bounds_offset(parse_date(date)?, offset)?;
    Ok((iso(start), iso(end)))
}

pub(crate) fn cmd_weekly_show(
    svc: &mut JournalService,
    date: Option<String>,
    offset: i64,
    json: bool,
) -> Result<()> {
    let (week_start, _) = week_of(date, offset)?;

    match svc.get_weekly_reflection(&week_start)? {
        Some(reflection) if json => print_json(&reflection)?,
        Some(reflection) => {
            println!("Week of {week_start}");
            println!();
            println!("{}", reflection.reflection.as_deref().unwrap_or("(empty)"));
        }
        None if json => println!(
            "{}",
            json_error(&format!("No reflection for the week of {week_start}"))
        ),
        None => eprintln!("No reflection for the week of {week_start}"),
    }

    Ok(())
}

pub(crate) fn cmd_weekly_reflect(
    svc: &mut JournalService,
    text: Option<String>,
    date: Option<String>,
    offset: i64,
    json: bool,
) -> Result<()> {
    let (week_start, _) = week_of(date, offset)?;
    let saved = svc.upsert_weekly_reflection(&week_start, text.as_deref())?;

    if json {
        print_json(&saved)?;
    } else if saved.reflection.is_some() {
        println!("Saved reflection for the week of {week_start}");
    } else {
        println!("Cleared reflection for the week of {week_start}");
    }

    Ok(())
}

pub(crate) fn cmd_weekly_summary(
    svc: &mut JournalService,
    date: Option<String>,
    offset: i64,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct RatingRow {
        #[tabled(rename = "#")]
        number: i64,
        #[tabled(rename = "Precept")]
        name: String,
        #[tabled(rename = "Avg")]
        average: String,
        #[tabled(rename = "Rated")]
        count: i64,
        #[tabled(rename = "")]
        stars: String,
    }

    let (week_start, week_end) = week_of(date, offset)?;
    let summary = svc.weekly_summary(&week_start, &week_end)?;

    if json {
        return print_json(&summary);
    }

    println!("=== Week of {} to {} ===\n", summary.week_start, summary.week_end);
    println!("  Days journaled:   {} / 7", summary.days_with_entries);
    println!("  Precepts touched: {}", summary.total_precepts);
    println!(
        "  Meditation:       {} min over {} day(s)",
        summary.total_meditation_minutes, summary.days_with_meditation
    );

    if summary.average_ratings.is_empty() {
        println!("\n  No ratings this week.");
    } else {
        let rows: Vec<RatingRow> = summary
            .average_ratings
            .iter()
            .map(|r| {
                let rounded = r.average.round() as i64;
                RatingRow {
                    number: r.precept_number,
                    name: precept_label(r.precept_number),
                    average: format!("{:.1}", r.average),
                    count: r.count,
                    stars: rating_stars(Some(rounded)),
                }
            })
            .collect();
        println!();
        println!(
            "{}",
            Table::new(&rows)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
        );

        let names = |numbers: &[i64]| {
            numbers
                .iter()
                .map(|&n| precept_label(n))
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("  Strongest: {}", names(&summary.top_precepts));
        println!("  Growth:    {}", names(&summary.growth_precepts));
    }

    if let Some(text) = summary.reflection.as_ref().and_then(|r| r.reflection.as_deref()) {
        println!("\n  Reflection:\n  {text}");
    }

    Ok(())
}
