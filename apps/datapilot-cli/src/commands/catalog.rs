//! Intent catalog listing

use anyhow::Result;
use datapilot_nlp::catalog;
use tabled::{Table, Tabled};

use crate::output::{self, OutputFormat};

pub fn run(format: OutputFormat) -> Result<()> {
    let intents = catalog();

    match format {
        OutputFormat::Text => {
            #[derive(Tabled)]
            struct IntentRow {
                #[tabled(rename = "Code")]
                code: String,
                #[tabled(rename = "Name")]
                name: String,
                #[tabled(rename = "Group")]
                group: &'static str,
                #[tabled(rename = "Query")]
                query: &'static str,
            }

            let rows: Vec<IntentRow> = intents
                .into_iter()
                .map(|d| IntentRow {
                    code: d.code,
                    name: d.name,
                    group: d.group.as_str(),
                    query: if d.is_query_intent { "yes" } else { "no" },
                })
                .collect();

            println!("{}", Table::new(rows));
        }
        _ => println!("{}", output::format_output(&intents, format)?),
    }

    Ok(())
}
