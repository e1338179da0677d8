//! Pattern file commands

use anyhow::{bail, Context, Result};
use colored::Colorize;
use datapilot_nlp::{LoadReport, PatternRegistry};
use std::path::Path;

use crate::output::{self, OutputFormat};
use crate::PatternsCommands;

pub fn run(cmd: &PatternsCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        PatternsCommands::Check { file } => check(file, format),
    }
}

/// Fails when the file cannot be loaded or any entry is rejected.
fn check(file: &Path, format: OutputFormat) -> Result<()> {
    let (_, report) = PatternRegistry::from_path(file)
        .with_context(|| format!("Failed to load pattern file {}", file.display()))?;

    match format {
        OutputFormat::Text => print_report(&report),
        _ => println!("{}", output::format_output(&report, format)?),
    }

    if !report.rejected.is_empty() {
        bail!("{} pattern entr{} rejected", report.rejected.len(), plural(report.rejected.len()));
    }
    Ok(())
}

fn print_report(report: &LoadReport) {
    for code in &report.merged {
        output::success(&format!("{} merged", code));
    }
    for rejected in &report.rejected {
        println!("{} {}: {}", "✗".red(), rejected.code.bold(), rejected.reason);
    }
    if report.merged.is_empty() && report.rejected.is_empty() {
        output::dimmed("Pattern file contains no entries.");
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}
