use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use precept_core::service::JournalService;

use super::helpers::{iso, parse_range, precept_label, print_json, rating_stars};

pub(crate) fn cmd_streak(svc: &mut JournalService, json: bool) -> Result<()> {
    let streak = svc.get_streak()?;
    if json {
        return print_json(&streak);
    }

    let days = |n: i64| if n == 1 { "day" } else { "days" };
    println!("Current streak: {} {}", streak.current, days(streak.current));
    println!("Longest streak: {} {}", streak.longest, days(streak.longest));
    if let Some(ref last) = streak.last_entry_date {
        println!("Last entry:     {last}");
    }
    Ok(())
}

pub(crate) fn cmd_trend(svc: &mut JournalService, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct TrendRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Minutes")]
        minutes: i64,
        #[tabled(rename = "")]
        bar: String,
    }

    let points = svc.get_meditation_trend(days)?;
    if json {
        return print_json(&points);
    }
    if points.is_empty() {
        eprintln!("No entries in the last {days} days");
        return Ok(());
    }

    let rows: Vec<TrendRow> = points
        .into_iter()
        .map(|p| TrendRow {
            bar: "▇".repeat(usize::try_from(p.minutes / 5).unwrap_or(0).min(24)),
            date: p.date,
            minutes: p.minutes,
        })
        .collect();
    println!(
        "{}",
        Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::single(1)).with(Alignment::right()))
    );
    Ok(())
}

pub(crate) fn cmd_heatmap(svc: &mut JournalService, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HeatRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Responses")]
        count: i64,
        #[tabled(rename = "")]
        cells: String,
    }

    let heatmap = svc.get_completion_heatmap(days)?;
    if json {
        return print_json(&heatmap);
    }
    if heatmap.is_empty() {
        eprintln!("No entries in the last {days} days");
        return Ok(());
    }

    let rows: Vec<HeatRow> = heatmap
        .into_iter()
        .map(|d| HeatRow {
            cells: "■".repeat(usize::try_from(d.count).unwrap_or(0)),
            date: d.date,
            count: d.count,
        })
        .collect();
    println!(
        "{}",
        Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::single(1)).with(Alignment::right()))
    );
    Ok(())
}

pub(crate) fn cmd_ratings(
    svc: &mut JournalService,
    from: Option<String>,
    to: Option<String>,
    days: u32,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct AverageRow {
        #[tabled(rename = "#")]
        number: i64,
        #[tabled(rename = "Precept")]
        name: String,
        #[tabled(rename = "Avg")]
        average: String,
        #[tabled(rename = "")]
        stars: String,
    }

    let (start, end) = parse_range(from, to, days)?;
    let (start, end) = (iso(start), iso(end));
    let averages = svc.get_average_ratings(&start, &end)?;
    if json {
        return print_json(&averages);
    }
    if averages.is_empty() {
        eprintln!("No ratings between {start} and {end}");
        return Ok(());
    }

    let rows: Vec<AverageRow> = averages
        .iter()
        .map(|a| {
            let rounded = a.average.round() as i64;
            AverageRow {
                number: a.precept_number,
                name: precept_label(a.precept_number),
                average: format!("{:.1}", a.average),
                stars: rating_stars(Some(rounded)),
            }
        })
        .collect();
    println!("Average ratings {start} to {end}");
    println!(
        "{}",
        Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::single(2)).with(Alignment::right()))
    );
    Ok(())
}
