//! Search command - query the catalog from the terminal

use crate::commands::show::print_pretty;
use crate::lookup::{AudiolibrixClient, SearchOptions};
use crate::metadata::AudiobookMetadata;
use anyhow::Result;
use colored::Colorize;
use std::time::Duration;

/// Run the search command
pub async fn run(
    client: &AudiolibrixClient,
    query: &str,
    timeout_ms: Option<u64>,
    json: bool,
) -> Result<()> {
    let options = SearchOptions {
        timeout: timeout_ms.map(Duration::from_millis),
    };
    let results = client.search(query, options).await;

    if json {
        print_json(&results)?;
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    print_results(&results);
    Ok(())
}

fn print_results(results: &[AudiobookMetadata]) {
    println!();
    println!("Found {} result(s):", results.len());

    for (index, record) in results.iter().enumerate() {
        println!();
        let title = record.title.as_deref().unwrap_or("Unknown Title");
        println!("{} {}", format!("{}.", index + 1).dimmed(), title.bold());
        print_pretty(record);
    }
}

fn print_json(results: &[AudiobookMetadata]) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}
