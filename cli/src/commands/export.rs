use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;

use precept_core::export::ExportFormat;
use precept_core::service::JournalService;

use super::helpers::{iso, parse_date};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum FormatArg {
    Markdown,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => ExportFormat::Markdown,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

/// Export the journal to stdout or a file. Without `--from` the whole journal
/// is exported; `--to` defaults to today.
pub(crate) fn cmd_export(
    svc: &mut JournalService,
    format: FormatArg,
    from: Option<String>,
    to: Option<String>,
    no_meditation: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let range = match from {
        Some(from) => Some((iso(parse_date(Some(from))?), iso(parse_date(to)?))),
        None => None,
    };
    let format = ExportFormat::from(format);
    let rendered = svc.export_journal(
        format,
        range.as_ref().map(|(s, e)| (s.as_str(), e.as_str())),
        !no_meditation,
    )?;

    match output {
        Some(path) => {
            let path = if path.extension().is_none() {
                path.with_extension(format.extension())
            } else {
                path
            };
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported journal to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
