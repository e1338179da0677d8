//! DataPilot CLI
//!
//! A command-line interface for classifying analytics questions with the
//! DataPilot intent engine.

mod commands;
mod config;
mod output;
mod telemetry;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use datapilot_nlp::{FixedClock, IntentEngine};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "datapilot",
    author = "DataPilot Team",
    version,
    about = "DataPilot - intent engine for analytics questions",
    long_about = "A command-line interface for the DataPilot intent engine.\n\n\
                  Use this CLI to classify Chinese analytics questions, inspect\n\
                  resolved time ranges, and validate custom intent pattern files."
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "DATAPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (text, json, yaml)
    #[arg(
        short,
        long,
        default_value = "text",
        value_parser = ["text", "json", "yaml"]
    )]
    format: String,

    /// Intent pattern file merged over the built-in patterns
    #[arg(short, long)]
    patterns: Option<PathBuf>,

    /// LLM fallback confidence threshold
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Resolve relative dates against this day instead of today (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single question
    Classify {
        /// The question to classify
        query: String,

        /// Show every candidate intent
        #[arg(short = 'a', long)]
        candidates: bool,
    },

    /// Resolve the time range mentioned in a question
    Time {
        /// The question to parse
        query: String,
    },

    /// List the supported intents
    Catalog,

    /// Manage intent pattern files
    #[command(subcommand)]
    Patterns(PatternsCommands),

    /// Classify every line of a file and print summary statistics
    Batch {
        /// File with one question per line
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum PatternsCommands {
    /// Validate a pattern file against the built-in patterns
    Check {
        /// Pattern file (JSON, or YAML by extension)
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup colored output
    if cli.no_color {
        colored::control::set_override(false);
    }

    let result = run(&cli);

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            if cli.verbose {
                for cause in e.chain().skip(1) {
                    eprintln!("{}: {}", "Caused by".yellow(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut settings = config::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        settings.logging.level = level.clone();
    }
    if cli.json_logs {
        settings.logging.json = true;
    }
    if let Some(threshold) = cli.threshold {
        settings.engine.llm_fallback_threshold = threshold;
    }
    if let Some(patterns) = &cli.patterns {
        settings.engine.pattern_file = Some(patterns.display().to_string());
    }

    telemetry::init_telemetry(&settings.logging)?;
    settings.validate()?;

    let format: OutputFormat = cli.format.parse().map_err(anyhow::Error::msg)?;

    let build_engine = || -> anyhow::Result<IntentEngine> {
        let engine = IntentEngine::from_config(&settings.engine)
            .context("Failed to initialize intent engine")?;
        Ok(match cli.today {
            Some(today) => engine.with_clock(Arc::new(FixedClock::on(today))),
            None => engine,
        })
    };

    match &cli.command {
        Commands::Classify { query, candidates } => {
            commands::classify::run(&build_engine()?, query, *candidates || cli.verbose, format)
        }
        Commands::Time { query } => commands::time::run(&build_engine()?, query, format),
        Commands::Catalog => commands::catalog::run(format),
        Commands::Patterns(cmd) => commands::patterns::run(cmd, format),
        Commands::Batch { file } => commands::batch::run(&build_engine()?, file, format),
    }
}
