mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    FormatArg, cmd_entry_list, cmd_entry_search, cmd_entry_show, cmd_export, cmd_heatmap,
    cmd_info, cmd_meditate, cmd_prompt_add, cmd_prompt_delete, cmd_prompt_list, cmd_prompt_today,
    cmd_prompt_update, cmd_ratings, cmd_respond, cmd_setting_get, cmd_setting_list,
    cmd_setting_set, cmd_streak, cmd_today, cmd_trend, cmd_weekly_reflect, cmd_weekly_show,
    cmd_weekly_summary,
};
use crate::config::Config;
use precept_core::service::JournalService;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND: &str = "127.0.0.1";

#[derive(Parser)]
#[command(
    name = "precept",
    version,
    about = "A daily journal for the sixteen bodhisattva precepts",
    long_about = "A daily journal for the sixteen bodhisattva precepts.\n\n\
        Reflect on each precept, rate how you kept it, log meditation and \
        review streaks, trends and weekly summaries."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the day's precepts with their prompts (creates the entry)
    Today {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a reflection and/or rating for a precept
    Respond {
        /// Precept number (1-16)
        precept: i64,
        /// Reflection text
        #[arg(short, long)]
        text: Option<String>,
        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: Option<i64>,
        /// Prompt the reflection answers (default: the day's rotated prompt)
        #[arg(long)]
        prompt: Option<String>,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log the day's meditation
    Meditate {
        /// Minutes sat
        #[arg(short, long)]
        minutes: Option<i64>,
        /// Notes on the sitting
        #[arg(short, long)]
        notes: Option<String>,
        /// Record that you did not meditate
        #[arg(long, conflicts_with = "minutes")]
        skipped: bool,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse journal entries
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Weekly reflections and summaries
    Weekly {
        #[command(subcommand)]
        command: WeeklyCommands,
    },
    /// Manage custom reflection prompts
    Prompt {
        #[command(subcommand)]
        command: PromptCommands,
    },
    /// Read and write settings
    Setting {
        #[command(subcommand)]
        command: SettingCommands,
    },
    /// Show streak, trend, heatmap and rating statistics
    Stats {
        #[command(subcommand)]
        command: StatsCommands,
    },
    /// Export the journal as Markdown or JSON
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: FormatArg,
        /// First date to include (default: whole journal)
        #[arg(long)]
        from: Option<String>,
        /// Last date to include (default: today; used with --from)
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Leave out meditation logs
        #[arg(long)]
        no_meditation: bool,
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Show the database location and applied migrations
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on (default: config value or 8080)
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long)]
        bind: Option<String>,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum EntryCommands {
    /// Show a day's entry with its responses and meditation
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List entries in a date range
    List {
        /// First date (default: --days before --to)
        #[arg(long)]
        from: Option<String>,
        /// Last date (default: today)
        #[arg(long)]
        to: Option<String>,
        /// Number of days to list when --from is omitted
        #[arg(short, long, default_value = "30")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find entries whose reflections mention some text
    Search {
        /// Text to look for
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeeklyCommands {
    /// Show the weekly reflection
    Show {
        /// Any date in the week (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Weeks to shift by (-1 for last week)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write or clear the weekly reflection
    Reflect {
        /// Reflection text (omit to clear)
        text: Option<String>,
        /// Any date in the week (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Weeks to shift by (-1 for last week)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize a Monday-to-Sunday week
    Summary {
        /// Any date in the week (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Weeks to shift by (-1 for last week)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PromptCommands {
    /// List custom prompts
    List {
        /// Only prompts for this precept
        #[arg(short, long)]
        precept: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a custom prompt to a precept's rotation
    Add {
        /// Precept number (1-16)
        precept: i64,
        /// Prompt text
        text: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a custom prompt's text or active flag
    Update {
        /// Prompt ID
        id: i64,
        /// New prompt text
        #[arg(long)]
        text: Option<String>,
        /// Include the prompt in rotation (true/false)
        #[arg(long)]
        active: Option<bool>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a custom prompt
    Delete {
        /// Prompt ID
        id: i64,
    },
    /// Show the prompt in rotation for a precept
    Today {
        /// Precept number (1-16)
        precept: i64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Show the prompt that follows this one instead
        #[arg(long, value_name = "PROMPT")]
        after: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingCommands {
    /// Print a setting's value
    Get {
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store a setting
    Set {
        key: String,
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all settings
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum StatsCommands {
    /// Current and longest run of consecutive journaling days
    Streak {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Meditation minutes per day
    Trend {
        /// Number of days to look back
        #[arg(short, long, default_value = "30")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Responses recorded per day
    Heatmap {
        /// Number of days to look back
        #[arg(short, long, default_value = "90")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Average rating per precept
    Ratings {
        /// First date (default: --days before --to)
        #[arg(long)]
        from: Option<String>,
        /// Last date (default: today)
        #[arg(long)]
        to: Option<String>,
        /// Number of days to average when --from is omitted
        #[arg(short, long, default_value = "30")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    tracing::debug!("Using database {}", config.db_path.display());
    let mut svc = JournalService::new(&config.db_path);

    if let Commands::Serve {
        port,
        bind,
        no_auth,
    } = cli.command
    {
        let (api_key, new_api_key) = if no_auth {
            (None, false)
        } else {
            let (key, new) = config.load_or_create_api_key()?;
            (Some(key), new)
        };
        let port = port.or(config.port).unwrap_or(DEFAULT_PORT);
        let bind = bind
            .or_else(|| config.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        return server::start_server(svc, port, &bind, api_key, new_api_key).await;
    }

    let result = match cli.command {
        Commands::Today { date, json } => cmd_today(&mut svc, date, json),
        Commands::Respond {
            precept,
            text,
            rating,
            prompt,
            date,
            json,
        } => cmd_respond(&mut svc, precept, text, rating, prompt, date, json),
        Commands::Meditate {
            minutes,
            notes,
            skipped,
            date,
            json,
        } => cmd_meditate(&mut svc, minutes, notes, skipped, date, json),
        Commands::Entry { command } => match command {
            EntryCommands::Show { date, json } => cmd_entry_show(&mut svc, date, json),
            EntryCommands::List {
                from,
                to,
                days,
                json,
            } => cmd_entry_list(&mut svc, from, to, days, json),
            EntryCommands::Search { query, json } => cmd_entry_search(&mut svc, &query, json),
        },
        Commands::Weekly { command } => match command {
            WeeklyCommands::Show { date, offset, json } => {
                cmd_weekly_show(&mut svc, date, offset, json)
            }
            WeeklyCommands::Reflect {
                text,
                date,
                offset,
                json,
            } => cmd_weekly_reflect(&mut svc, text, date, offset, json),
            WeeklyCommands::Summary { date, offset, json } => {
                cmd_weekly_summary(&mut svc, date, offset, json)
            }
        },
        Commands::Prompt { command } => match command {
            PromptCommands::List { precept, json } => cmd_prompt_list(&mut svc, precept, json),
            PromptCommands::Add {
                precept,
                text,
                json,
            } => cmd_prompt_add(&mut svc, precept, &text, json),
            PromptCommands::Update {
                id,
                text,
                active,
                json,
            } => cmd_prompt_update(&mut svc, id, text, active, json),
            PromptCommands::Delete { id } => cmd_prompt_delete(&mut svc, id),
            PromptCommands::Today {
                precept,
                date,
                after,
                json,
            } => cmd_prompt_today(&mut svc, precept, date, after, json),
        },
        Commands::Setting { command } => match command {
            SettingCommands::Get { key, json } => cmd_setting_get(&mut svc, &key, json),
            SettingCommands::Set { key, value, json } => {
                cmd_setting_set(&mut svc, &key, &value, json)
            }
            SettingCommands::List { json } => cmd_setting_list(&mut svc, json),
        },
        Commands::Stats { command } => match command {
            StatsCommands::Streak { json } => cmd_streak(&mut svc, json),
            StatsCommands::Trend { days, json } => cmd_trend(&mut svc, days, json),
            StatsCommands::Heatmap { days, json } => cmd_heatmap(&mut svc, days, json),
            StatsCommands::Ratings {
                from,
                to,
                days,
                json,
            } => cmd_ratings(&mut svc, from, to, days, json),
        },
        Commands::Export {
            format,
            from,
            to,
            no_meditation,
            output,
        } => cmd_export(&mut svc, format, from, to, no_meditation, output),
        Commands::Info { json } => cmd_info(&mut svc, json),
        Commands::Serve { .. } => Ok(()),
    };

    svc.close()?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_respond() {
        let cli = Cli::try_parse_from([
            "precept", "respond", "10", "--text", "Spoke kindly", "--rating", "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Respond {
                precept,
                text,
                rating,
                ..
            } => {
                assert_eq!(precept, 10);
                assert_eq!(text.as_deref(), Some("Spoke kindly"));
                assert_eq!(rating, Some(4));
            }
            _ => panic!("expected respond"),
        }
    }

    #[test]
    fn parses_negative_week_offset() {
        let cli = Cli::try_parse_from(["precept", "weekly", "summary", "--offset", "-1"]).unwrap();
        match cli.command {
            Commands::Weekly {
                command: WeeklyCommands::Summary { offset, .. },
            } => assert_eq!(offset, -1),
            _ => panic!("expected weekly summary"),
        }
    }

    #[test]
    fn meditate_skipped_conflicts_with_minutes() {
        assert!(
            Cli::try_parse_from(["precept", "meditate", "--skipped", "--minutes", "10"]).is_err()
        );
    }

    #[test]
    fn export_to_requires_from() {
        assert!(Cli::try_parse_from(["precept", "export", "--to", "2024-01-01"]).is_err());
    }
}
