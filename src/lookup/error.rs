//! Errors raised while talking to the catalog site

/// Failure of a single scrape request.
///
/// These never leave the lookup client: a failed search becomes an empty
/// result list and a failed detail page becomes a dropped entry.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Transport failure, timeout, or a non-2xx status
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A link or configured URL could not be parsed
    #[error("invalid url {0:?}: {1}")]
    InvalidUrl(String, url::ParseError),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
