//! Show command - scrape a single detail page

use crate::lookup::{AudiolibrixClient, SearchOptions};
use crate::metadata::{AudiobookMetadata, PublishedYear};
use anyhow::{bail, Result};
use colored::Colorize;

pub async fn run(client: &AudiolibrixClient, url: &str, json: bool, quiet: bool) -> Result<()> {
    let Some(metadata) = client.scrape_details(url, SearchOptions::default()).await else {
        bail!("Failed to scrape {}", url);
    };

    if json {
        print_json(&metadata)?;
    } else {
        if !quiet {
            println!("{}", url.bold());
            println!("{}", "─".repeat(40));
        }
        print_pretty(&metadata);
    }

    Ok(())
}

fn print_json(metadata: &AudiobookMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata)?;
    println!("{}", json);
    Ok(())
}

/// Print a record as aligned label/value lines
pub fn print_pretty(metadata: &AudiobookMetadata) {
    print_field("Title", metadata.title.as_deref());
    print_field("Author", metadata.author.as_deref());
    print_field("Narrator", metadata.narrator.as_deref());
    print_field("Publisher", metadata.publisher.as_deref());

    if let Some(year) = &metadata.published_year {
        let year = match year {
            PublishedYear::Year(y) => y.to_string(),
            PublishedYear::Text(t) => t.clone(),
        };
        print_field("Year", Some(&year));
    }

    print_field("Language", Some(&metadata.language));
    print_field("Cover", metadata.cover.as_deref());

    if let Some(desc) = &metadata.description {
        println!();
        println!("{}", "Description:".cyan());
        for line in textwrap_simple(desc, 80) {
            println!("  {}", line);
        }
    }
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("{:>12}: {}", label.cyan(), v);
    }
}

/// Simple text wrapping without external dependency
fn textwrap_simple(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let mut current_line = String::new();

        for word in words {
            if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_line.len() + 1 + word.len() <= width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                lines.push(current_line);
                current_line = word.to_string();
            }
        }

        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }
    lines
}
