use serde::{Deserialize, Serialize};

/// Language reported for every Audiolibrix record
pub const LANGUAGE: &str = "en";

/// Publication year as found on the page.
///
/// Structured data yields a parsed year (serialized as a number), the markup
/// fallback yields whatever text the page shows (serialized as a string).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishedYear {
    Year(i32),
    Text(String),
}

/// Audiobook metadata in the shape Audiobookshelf expects from a custom provider.
///
/// Every key is always serialized; missing values go out as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudiobookMetadata {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub narrator: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<PublishedYear>,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub isbn: Option<String>,
    pub asin: Option<String>,
    pub genres: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub series: Option<String>,
    pub language: String,
    pub duration: Option<u64>,
}

/// Raw field values pulled off a detail page, before normalization
#[derive(Debug, Clone, Default)]
pub struct ScrapedFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub narrator: Option<String>,
    pub publisher: Option<String>,
    pub published_year: Option<PublishedYear>,
    pub description: Option<String>,
    pub cover: Option<String>,
}

impl AudiobookMetadata {
    /// Build a record from scraped fields.
    ///
    /// Empty strings become absent. `cover` must already be absolute.
    /// Fields this source never provides are always absent.
    pub fn from_scraped(fields: ScrapedFields) -> Self {
        let published_year = match fields.published_year {
            Some(PublishedYear::Text(text)) => non_empty(Some(text)).map(PublishedYear::Text),
            other => other,
        };

        Self {
            title: non_empty(fields.title),
            subtitle: None,
            author: non_empty(fields.author),
            narrator: non_empty(fields.narrator),
            publisher: non_empty(fields.publisher),
            published_year,
            description: non_empty(fields.description),
            cover: non_empty(fields.cover),
            isbn: None,
            asin: None,
            genres: None,
            tags: None,
            series: None,
            language: LANGUAGE.to_string(),
            duration: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
