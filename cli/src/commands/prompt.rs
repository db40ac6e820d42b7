use anyhow::{Result, bail};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use precept_core::models::{PromptUpdate, validate_precept_number};
use precept_core::service::JournalService;

use super::helpers::{iso, json_error, parse_date, precept_label, print_json, truncate};

pub(crate) fn cmd_prompt_list(
    svc: &mut JournalService,
    precept_number: Option<i64>,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct PromptRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "#")]
        number: i64,
        #[tabled(rename = "Precept")]
        name: String,
        #[tabled(rename = "Active")]
        active: &'static str,
        #[tabled(rename = "Prompt")]
        text: String,
    }

    if let Some(n) = precept_number {
        validate_precept_number(n)?;
    }
    let prompts = svc.list_prompts(precept_number)?;

    if json {
        return print_json(&prompts);
    }
    if prompts.is_empty() {
        eprintln!("No custom prompts");
        return Ok(());
    }

    let rows: Vec<PromptRow> = prompts
        .iter()
        .map(|p| PromptRow {
            id: p.id,
            number: p.precept_number,
            name: precept_label(p.precept_number),
            active: if p.is_active { "yes" } else { "no" },
            text: truncate(&p.prompt_text, 60),
        })
        .collect();
    println!(
        "{}",
        Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(0..2)).with(Alignment::right()))
    );

    Ok(())
}

pub(crate) fn cmd_prompt_add(
    svc: &mut JournalService,
    precept_number: i64,
    text: &str,
    json: bool,
) -> Result<()> {
    let prompt = svc.create_prompt(precept_number, text)?;

    if json {
        print_json(&prompt)?;
    } else {
        println!(
            "Added prompt {} for {}",
            prompt.id,
            precept_label(prompt.precept_number)
        );
    }

    Ok(())
}

pub(crate) fn cmd_prompt_update(
    svc: &mut JournalService,
    id: i64,
    text: Option<String>,
    active: Option<bool>,
    json: bool,
) -> Result<()> {
    let update = PromptUpdate {
        prompt_text: text,
        is_active: active,
    };
    if update.is_empty() {
        bail!("Nothing to update. Pass --text and/or --active");
    }
    let prompt = svc.update_prompt(id, &update)?;

    if json {
        print_json(&prompt)?;
    } else {
        let state = if prompt.is_active { "active" } else { "inactive" };
        println!("Updated prompt {} ({state})", prompt.id);
    }

    Ok(())
}

pub(crate) fn cmd_prompt_delete(svc: &mut JournalService, id: i64) -> Result<()> {
    if !svc.delete_prompt(id)? {
        bail!("Custom prompt {id} not found");
    }
    println!("Deleted prompt {id}");
    Ok(())
}

/// Show the prompt rotated in for a precept on a day, or the one after `after`.
pub(crate) fn cmd_prompt_today(
    svc: &mut JournalService,
    precept_number: i64,
    date: Option<String>,
    after: Option<String>,
    json: bool,
) -> Result<()> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ShownPrompt<'a> {
        precept_number: i64,
        date: &'a str,
        prompt: &'a str,
    }

    validate_precept_number(precept_number)?;
    let date = iso(parse_date(date)?);
    let prompt = match after {
        Some(current) => svc.next_prompt(precept_number, &current)?,
        None => svc.prompt_for(precept_number, &date)?,
    };

    match prompt {
        Some(prompt) if json => print_json(&ShownPrompt {
            precept_number,
            date: &date,
            prompt: &prompt,
        })?,
        Some(prompt) => println!("{}: {prompt}", precept_label(precept_number)),
        None if json => println!("{}", json_error("No prompts available")),
        None => eprintln!("No prompts available for {}", precept_label(precept_number)),
    }

    Ok(())
}
