use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "audiolibrix-provider")]
#[command(about = "Audiobookshelf metadata provider that scrapes the Audiolibrix catalog")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/audiolibrix-provider/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the metadata provider HTTP server
    Serve {
        /// Port to listen on (overrides PORT and the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Search Audiolibrix and print matching audiobooks
    Search {
        /// Title, author or ISBN to search for
        query: String,

        /// Request timeout in milliseconds (uses config default if not specified)
        #[arg(long)]
        timeout: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scrape metadata from a single audiobook page
    Show {
        /// Audiobook detail page URL
        url: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
