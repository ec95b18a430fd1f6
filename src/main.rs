mod cli;
mod commands;
mod config;
mod lookup;
mod metadata;
mod server;
#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use lookup::AudiolibrixClient;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    let config = Config::load(cli.config.as_deref())?;
    let client = AudiolibrixClient::new(&config.scraper).context("Failed to create scraper")?;

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::run(&config, client, port).await?;
        }
        Commands::Search {
            query,
            timeout,
            json,
        } => {
            commands::search::run(&client, &query, timeout, json).await?;
        }
        Commands::Show { url, json } => {
            commands::show::run(&client, &url, json, cli.quiet).await?;
        }
    }

    Ok(())
}
