//! Time range resolution command

use anyhow::Result;
use colored::Colorize;
use datapilot_nlp::IntentEngine;

use crate::output::{self, OutputFormat};

pub fn run(engine: &IntentEngine, query: &str, format: OutputFormat) -> Result<()> {
    let range = engine.parse_time_range(query, None);

    match format {
        OutputFormat::Text => match &range {
            Some(range) => {
                println!(
                    "{} ~ {}",
                    range.start_date().to_string().green().bold(),
                    range.end_date().to_string().green().bold()
                );
                output::key_value("Expression", range.expression());
                output::key_value("Granularity", range.granularity().as_str());
                output::key_value("Relative", if range.is_relative() { "yes" } else { "no" });
                output::key_value("Days", &range.days().to_string());
            }
            None => output::dimmed("No time expression found."),
        },
        _ => println!("{}", output::format_output(&range, format)?),
    }

    Ok(())
}
