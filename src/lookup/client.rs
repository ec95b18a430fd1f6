//! HTTP client for the Audiolibrix catalog

use std::time::Duration;

use futures::future;
use futures::stream::{self, StreamExt};
use scraper::Html;
use tracing::{debug, error, info};
use url::Url;

use crate::config::ScraperConfig;
use crate::lookup::error::ScrapeError;
use crate::lookup::extract;
use crate::metadata::AudiobookMetadata;

const USER_AGENT: &str = concat!("audiolibrix-provider/", env!("CARGO_PKG_VERSION"));

/// Per-call knobs for a search
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Replaces the configured timeout for the search page and every detail page
    pub timeout: Option<Duration>,
}

/// Scrapes search results and detail pages from the catalog.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct AudiolibrixClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    max_concurrent_details: usize,
}

impl AudiolibrixClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ScrapeError::InvalidUrl(config.base_url.clone(), e))?;

        let user_agent = config.user_agent.as_deref().unwrap_or(USER_AGENT);
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ScrapeError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            timeout: Duration::from_millis(config.timeout_ms),
            max_concurrent_details: config.max_concurrent_details.max(1),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Search page URL for a free-text query
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/en/search?query={}",
            self.base_url.as_str().trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }

    /// Search the catalog and scrape every hit.
    ///
    /// Never fails: if the search page cannot be fetched the result is empty,
    /// and detail pages that fail are left out. Results keep the order in
    /// which they appear on the search page.
    pub async fn search(&self, query: &str, options: SearchOptions) -> Vec<AudiobookMetadata> {
        let url = self.search_url(query);

        let html = match self.fetch(&url, options).await {
            Ok(html) => html,
            Err(e) => {
                error!(url = %url, error = %e, "Search request failed");
                return Vec::new();
            }
        };

        let links = self.result_links(&html);
        if links.is_empty() {
            info!(query, "No search results");
            return Vec::new();
        }

        let found = links.len();
        let records: Vec<AudiobookMetadata> = stream::iter(links)
            .map(|link| async move { self.scrape_details(&link, options).await })
            .buffered(self.max_concurrent_details)
            .filter_map(future::ready)
            .collect()
            .await;

        info!(query, found, scraped = records.len(), "Search finished");
        records
    }

    /// Scrape a single detail page.
    ///
    /// Any failure is logged and reported as `None`.
    pub async fn scrape_details(
        &self,
        url: &str,
        options: SearchOptions,
    ) -> Option<AudiobookMetadata> {
        match self.fetch(url, options).await {
            Ok(html) => {
                let record = self.parse_details(&html);
                debug!(url, title = ?record.title, "Scraped detail page");
                Some(record)
            }
            Err(e) => {
                error!(url, error = %e, "Detail request failed");
                None
            }
        }
    }

    /// Extract a record from detail page HTML
    pub fn parse_details(&self, html: &str) -> AudiobookMetadata {
        let document = Html::parse_document(html);
        let structured = extract::structured_data(&document);
        extract::extract(structured.as_ref(), &document, &self.base_url)
    }

    /// Absolute detail URLs found on a search page
    fn result_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);

        extract::result_links(&document)
            .into_iter()
            .filter_map(|href| match self.resolve(&href) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    error!(error = %e, "Skipping search result");
                    None
                }
            })
            .collect()
    }

    fn resolve(&self, href: &str) -> Result<Url, ScrapeError> {
        self.base_url
            .join(href)
            .map_err(|e| ScrapeError::InvalidUrl(href.to_string(), e))
    }

    async fn fetch(&self, url: &str, options: SearchOptions) -> Result<String, ScrapeError> {
        let response = self
            .http
            .get(url)
            .timeout(options.timeout.unwrap_or(self.timeout))
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}
