//! Single-question classification command

use anyhow::Result;
use colored::Colorize;
use datapilot_nlp::{IntentEngine, IntentResult};
use tabled::{Table, Tabled};

use crate::output::{self, OutputFormat};

pub fn run(engine: &IntentEngine, query: &str, show_candidates: bool, format: OutputFormat) -> Result<()> {
    let result = engine.classify(query);

    match format {
        OutputFormat::Text => print_result(&result, engine.llm_fallback_threshold(), show_candidates),
        _ => println!("{}", output::format_output(&result, format)?),
    }

    Ok(())
}

fn print_result(result: &IntentResult, threshold: f64, show_candidates: bool) {
    println!(
        "{} {}",
        result.intent.code().cyan().bold(),
        format!("({})", result.intent.display_name()).dimmed()
    );
    output::key_value("Confidence", &output::confidence(result.confidence, threshold));
    output::key_value("Method", result.match_method.as_str());
    if !result.matched_keywords.is_empty() {
        output::key_value("Keywords", &result.matched_keywords.join(", "));
    }

    if let Some(range) = &result.time_range {
        output::key_value(
            "Time range",
            &format!(
                "{} ~ {} ({}, \"{}\")",
                range.start_date(),
                range.end_date(),
                range.granularity().as_str(),
                range.expression()
            ),
        );
    }
    if let Some(dimension) = result.dimension {
        output::key_value("Dimension", dimension.as_str());
    }
    if !result.entities.is_empty() {
        output::key_value("Entities", &result.entities.join(", "));
    }
    for (name, value) in &result.parameters {
        let value = value
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| value.to_string());
        output::key_value(&format!("  {}", name), &value);
    }

    if result.needs_llm_fallback {
        output::warning("Low confidence or ambiguous: LLM fallback recommended");
    } else {
        output::success("Resolved by rules");
    }
    output::dimmed(&format!("Processed in {}", output::format_micros(result.processing_time_us)));

    if show_candidates && !result.candidates.is_empty() {
        #[derive(Tabled)]
        struct CandidateRow {
            #[tabled(rename = "Intent")]
            intent: String,
            #[tabled(rename = "Confidence")]
            confidence: String,
            #[tabled(rename = "Method")]
            method: &'static str,
            #[tabled(rename = "Keywords")]
            keywords: String,
        }

        let rows: Vec<CandidateRow> = result
            .candidates
            .iter()
            .map(|c| CandidateRow {
                intent: c.intent.code().to_string(),
                confidence: format!("{:.3}", c.confidence),
                method: c.method.as_str(),
                keywords: c.matched_keywords.join(", "),
            })
            .collect();

        output::section("Candidates");
        println!("{}", Table::new(rows));
    }
}
