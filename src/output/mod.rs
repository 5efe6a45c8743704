use anyhow::Result;
use std::path::Path;

use crate::analysis::AnalysisOutcome;
use crate::cli::OutputFormat;
use crate::matcher::{Preference, Recommendation};

pub mod formatters;

pub use formatters::*;

/// What to render: a ranked recommendation list or the raw segment timeline
pub enum Report<'a> {
    Recommendations {
        outcome: &'a AnalysisOutcome,
        recommendations: &'a [Recommendation],
        preference: &'a Preference,
    },
    Segments {
        outcome: &'a AnalysisOutcome,
    },
}

/// Save a report to file
pub async fn save_to_file(report: &Report<'_>, path: &Path, format: OutputFormat) -> Result<()> {
    let content = render(report, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print a report to console
pub fn print_to_console(report: &Report<'_>, format: OutputFormat) -> Result<()> {
    let content = render(report, format)?;
    println!("{}", content);
    Ok(())
}

fn render(report: &Report<'_>, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format_as_text(report),
        OutputFormat::Json => format_as_json(report)?,
        OutputFormat::Markdown => format_as_markdown(report),
        OutputFormat::Csv => format_as_csv(report),
    })
}
