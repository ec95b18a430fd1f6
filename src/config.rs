use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Port used when neither the CLI, `PORT`, nor the config file sets one
pub const DEFAULT_PORT: u16 = 3002;

/// Origin of the Audiolibrix catalog
pub const DEFAULT_BASE_URL: &str = "https://www.audiolibrix.com";

/// Per-request timeout for catalog pages, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Detail pages fetched at once for a single search
pub const DEFAULT_MAX_CONCURRENT_DETAILS: usize = 4;

/// Application configuration loaded from ~/.config/audiolibrix-provider/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
}

/// Configuration for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Port to listen on (default: 3002)
    pub port: Option<u16>,
}

/// Configuration for requests to the catalog site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Catalog origin; search URLs, relative links and covers are built from it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for each outbound request, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum detail pages fetched concurrently per search
    #[serde(default = "default_max_concurrent_details")]
    pub max_concurrent_details: usize,

    /// User-Agent header sent to the catalog (default: audiolibrix-provider/<version>)
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_concurrent_details() -> usize {
    DEFAULT_MAX_CONCURRENT_DETAILS
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            max_concurrent_details: default_max_concurrent_details(),
            user_agent: None,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load_from(&Self::config_path()?)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("audiolibrix-provider").join("config.toml"))
    }

    /// Reject values the scraper cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.scraper.timeout_ms == 0 {
            bail!("scraper.timeout_ms must be greater than 0");
        }
        if self.scraper.max_concurrent_details == 0 {
            bail!("scraper.max_concurrent_details must be greater than 0");
        }
        url::Url::parse(&self.scraper.base_url)
            .with_context(|| format!("Invalid scraper.base_url {:?}", self.scraper.base_url))?;
        Ok(())
    }

    /// Resolve the listening port.
    ///
    /// CLI override takes precedence, then the `PORT` environment value,
    /// then the config file, then [`DEFAULT_PORT`].
    pub fn port(&self, cli_override: Option<u16>, env_port: Option<&str>) -> Result<u16> {
        if let Some(port) = cli_override {
            return Ok(port);
        }

        if let Some(raw) = env_port {
            return raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {:?}", raw));
        }

        Ok(self.server.port.unwrap_or(DEFAULT_PORT))
    }
}
