use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use precept_core::service::JournalService;

use super::helpers::{json_error, print_json};

pub(crate) fn cmd_setting_get(svc: &mut JournalService, key: &str, json: bool) -> Result<()> {
    match svc.get_setting(key)? {
        Some(value) if json => print_json(&serde_json::json!({ "key": key, "value": value }))?,
        Some(value) => println!("{value}"),
        None if json => println!("{}", json_error(&format!("Setting '{key}' is not set"))),
        None => eprintln!("Setting '{key}' is not set"),
    }
    Ok(())
}

pub(crate) fn cmd_setting_set(
    svc: &mut JournalService,
    key: &str,
    value: &str,
    json: bool,
) -> Result<()> {
    let setting = svc.set_setting(key, value)?;
    if json {
        print_json(&setting)?;
    } else {
        println!("{} = {}", setting.key, setting.value);
    }
    Ok(())
}

pub(crate) fn cmd_setting_list(svc: &mut JournalService, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct SettingRow {
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Updated")]
        updated_at: String,
    }

    let settings = svc.get_all_settings()?;
    if json {
        return print_json(&settings);
    }
    if settings.is_empty() {
        eprintln!("No settings stored");
        return Ok(());
    }

    let rows: Vec<SettingRow> = settings
        .into_iter()
        .map(|s| SettingRow {
            key: s.key,
            value: s.value,
            updated_at: s.updated_at,
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}
