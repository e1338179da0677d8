//! Batch classification command

use anyhow::{Context, Result};
use colored::Colorize;
use datapilot_nlp::{IntentEngine, IntentResult, StatisticsSnapshot};
use serde::Serialize;
use std::path::Path;
use tabled::{Table, Tabled};

use crate::output::{self, OutputFormat};

#[derive(Serialize)]
struct BatchReport {
    results: Vec<IntentResult>,
    statistics: StatisticsSnapshot,
}

pub fn run(engine: &IntentEngine, file: &Path, format: OutputFormat) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let results: Vec<IntentResult> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| engine.classify(line))
        .collect();

    let report = BatchReport {
        results,
        statistics: engine.statistics(),
    };

    match format {
        OutputFormat::Text => print_report(&report, engine.llm_fallback_threshold()),
        _ => println!("{}", output::format_output(&report, format)?),
    }

    Ok(())
}

fn print_report(report: &BatchReport, threshold: f64) {
    if report.results.is_empty() {
        output::dimmed("No queries found.");
        return;
    }

    #[derive(Tabled)]
    struct ResultRow {
        #[tabled(rename = "Query")]
        query: String,
        #[tabled(rename = "Intent")]
        intent: String,
        #[tabled(rename = "Confidence")]
        confidence: String,
        #[tabled(rename = "Fallback")]
        fallback: &'static str,
    }

    let rows: Vec<ResultRow> = report
        .results
        .iter()
        .map(|r| ResultRow {
            query: output::truncate(&r.query, 24),
            intent: r.intent.code().to_string(),
            confidence: format!("{:.2}", r.confidence),
            fallback: if r.needs_llm_fallback { "yes" } else { "no" },
        })
        .collect();

    println!("{}", Table::new(rows));

    let stats = &report.statistics;
    output::section("Summary");
    output::key_value("Queries", &stats.total_requests.to_string());
    output::key_value(
        "Average confidence",
        &output::confidence(stats.average_confidence, threshold),
    );
    output::key_value(
        "Fallback rate",
        &format!("{:.1}%", stats.fallback_rate * 100.0).yellow().to_string(),
    );
    for (code, count) in &stats.intent_distribution {
        println!("  {:<28} {}", code, count);
    }
}
