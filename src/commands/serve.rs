//! Serve command - run the metadata provider HTTP server

use crate::config::Config;
use crate::lookup::AudiolibrixClient;
use crate::server::run_server;
use anyhow::Result;
use tracing::info;

pub async fn run(config: &Config, client: AudiolibrixClient, port: Option<u16>) -> Result<()> {
    let env_port = std::env::var("PORT").ok();
    let port = config.port(port, env_port.as_deref())?;

    info!(
        base_url = %client.base_url(),
        timeout_ms = config.scraper.timeout_ms,
        max_concurrent_details = config.scraper.max_concurrent_details,
        "Scraper configured"
    );

    run_server(client, port).await
}
