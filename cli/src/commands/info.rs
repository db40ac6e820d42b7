use anyhow::Result;
use serde::Serialize;

use precept_core::db::AppliedMigration;
use precept_core::service::{DbLocation, JournalService};

use super::helpers::print_json;

pub(crate) fn cmd_info(svc: &mut JournalService, json: bool) -> Result<()> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Info {
        database: String,
        migrations: Vec<AppliedMigration>,
    }

    let database = match svc.location() {
        DbLocation::File(path) => path.display().to_string(),
        DbLocation::InMemory => ":memory:".to_string(),
    };
    let migrations = svc.applied_migrations()?;

    if json {
        return print_json(&Info {
            database,
            migrations,
        });
    }

    println!("Database: {database}");
    println!("Migrations:");
    for m in &migrations {
        println!("  {} (applied {})", m.name, m.applied_at);
    }
    Ok(())
}
