//! Field extraction from Audiolibrix pages
//!
//! Everything here works on an already parsed [`Html`] document so it can be
//! exercised without touching the network. Detail pages are read in one of
//! two ways:
//!
//! - **Structured data**: a JSON-LD block is present and parses. Each field
//!   comes from JSON-LD, and only an empty JSON-LD field is backfilled from
//!   the page markup.
//! - **Markup**: no usable JSON-LD. Every field comes from fixed CSS
//!   selectors.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use crate::metadata::{AudiobookMetadata, PublishedYear, ScrapedFields};

const RESULT_TILE_SELECTOR_STR: &str = ".product-tile, .search-result-item";
const ANCHOR_SELECTOR_STR: &str = "a";
const JSON_LD_SELECTOR_STR: &str = r#"script[type="application/ld+json"]"#;
const META_DESCRIPTION_SELECTOR_STR: &str = r#"meta[name="description"]"#;

static RESULT_TILE: LazyLock<Selector> = LazyLock::new(|| selector(RESULT_TILE_SELECTOR_STR));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector(ANCHOR_SELECTOR_STR));
static JSON_LD: LazyLock<Selector> = LazyLock::new(|| selector(JSON_LD_SELECTOR_STR));
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(META_DESCRIPTION_SELECTOR_STR));

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static AUTHOR: LazyLock<Selector> = LazyLock::new(|| selector(".author"));
static NARRATOR: LazyLock<Selector> = LazyLock::new(|| selector(".narrator"));
static PUBLISHER: LazyLock<Selector> = LazyLock::new(|| selector(".publisher"));
static PUBLISHED_YEAR: LazyLock<Selector> = LazyLock::new(|| selector(".published-year"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector(".description"));
static COVER_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector(".cover-image"));

fn selector(css: &str) -> Selector {
    Selector::parse(css)
        .unwrap_or_else(|e| panic!("Failed to parse selector {css:?} - this is a bug: {e:?}"))
}

/// Collect result links from a search page, in document order.
///
/// Each result tile contributes the `href` of its first anchor. Tiles without
/// an anchor, or whose first anchor has no usable `href`, are skipped.
pub fn result_links(document: &Html) -> Vec<String> {
    let links: Vec<String> = document
        .select(&RESULT_TILE)
        .filter_map(|tile| tile.select(&ANCHOR).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(String::from)
        .collect();

    tracing::debug!(count = links.len(), "Search result links parsed");
    links
}

/// Find the JSON-LD node describing the book, if the page has one.
///
/// All `application/ld+json` blocks are considered. Top-level arrays and
/// `@graph` containers are flattened; a node typed `Book` or `Audiobook` is
/// preferred, otherwise the first object wins. Blocks that are not valid
/// JSON are skipped.
pub fn structured_data(document: &Html) -> Option<Value> {
    let mut nodes = Vec::new();

    for script in document.select(&JSON_LD) {
        let body = script.text().collect::<String>();
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(value) => collect_nodes(value, &mut nodes),
            Err(e) => tracing::debug!(error = %e, "Skipping malformed JSON-LD block"),
        }
    }

    match nodes.iter().position(is_book) {
        Some(index) => Some(nodes.swap_remove(index)),
        None => nodes.into_iter().next(),
    }
}

fn collect_nodes(value: Value, nodes: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_nodes(item, nodes);
            }
        }
        Value::Object(mut map) => match map.remove("@graph") {
            Some(graph) => collect_nodes(graph, nodes),
            None => nodes.push(Value::Object(map)),
        },
        _ => {}
    }
}

fn is_book(node: &Value) -> bool {
    let names_book = |t: &Value| {
        t.as_str()
            .is_some_and(|t| t.eq_ignore_ascii_case("book") || t.eq_ignore_ascii_case("audiobook"))
    };

    match node.get("@type") {
        Some(Value::Array(types)) => types.iter().any(names_book),
        Some(t) => names_book(t),
        None => false,
    }
}

/// Build a metadata record from a detail page.
///
/// `structured` is the output of [`structured_data`]. When present, it is the
/// primary source and markup only fills fields it leaves empty; when absent,
/// the markup selectors are used for everything. Covers are resolved against
/// `base_url`.
pub fn extract(structured: Option<&Value>, document: &Html, base_url: &Url) -> AudiobookMetadata {
    let mut fields = match structured {
        Some(data) => structured_fields(data, document),
        None => markup_fields(document),
    };

    fields.cover = fields
        .cover
        .and_then(|cover| absolute_url(base_url, &cover));

    AudiobookMetadata::from_scraped(fields)
}

fn structured_fields(data: &Value, document: &Html) -> ScrapedFields {
    let published_year = match field(data, "datePublished") {
        Some(date) => {
            let year = parse_year(&date);
            if year.is_none() {
                tracing::debug!(date = %date, "Unrecognized datePublished");
            }
            year.map(PublishedYear::Year)
        }
        None => markup_text(document, &PUBLISHED_YEAR).map(PublishedYear::Text),
    };

    ScrapedFields {
        title: field(data, "name").or_else(|| markup_text(document, &TITLE)),
        author: field(data, "author").or_else(|| markup_text(document, &AUTHOR)),
        narrator: field(data, "readBy").or_else(|| markup_text(document, &NARRATOR)),
        publisher: field(data, "publisher").or_else(|| markup_text(document, &PUBLISHER)),
        published_year,
        description: field(data, "description")
            .or_else(|| meta_description(document))
            .or_else(|| markup_text(document, &DESCRIPTION)),
        cover: data
            .get("image")
            .and_then(image_url)
            .or_else(|| cover_src(document)),
    }
}

fn markup_fields(document: &Html) -> ScrapedFields {
    ScrapedFields {
        title: markup_text(document, &TITLE),
        author: markup_text(document, &AUTHOR),
        narrator: markup_text(document, &NARRATOR),
        publisher: markup_text(document, &PUBLISHER),
        published_year: markup_text(document, &PUBLISHED_YEAR).map(PublishedYear::Text),
        description: markup_text(document, &DESCRIPTION),
        cover: cover_src(document),
    }
}

fn field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(value_text)
}

/// Flatten a JSON-LD value into display text.
///
/// People and organizations are objects carrying a `name`; several of them
/// come as an array and are joined with ", ".
fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => return map.get("name").and_then(value_text),
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };

    (!text.is_empty()).then_some(text)
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Object(map) => map
            .get("url")
            .or_else(|| map.get("contentUrl"))
            .and_then(image_url),
        Value::Array(items) => items.iter().find_map(image_url),
        _ => None,
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn markup_text(document: &Html, selector: &Selector) -> Option<String> {
    let parts: Vec<String> = document
        .select(selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}

fn meta_description(document: &Html) -> Option<String> {
    document
        .select(&META_DESCRIPTION)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn cover_src(document: &Html) -> Option<String> {
    document
        .select(&COVER_IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(String::from)
}

/// Extract the year from a `datePublished` value.
///
/// Accepts RFC 3339 and RFC 2822 timestamps, ISO dates with or without a
/// time part, `YYYY/MM/DD` and `YYYY-MM`. Anything else falls back to the
/// first standalone four-digit token, so `"May 2019"` is 2019.
pub fn parse_year(raw: &str) -> Option<i32> {
    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    let raw = raw.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.year());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc2822(raw) {
        return Some(datetime.year());
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.year());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date.year());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Some(date.year());
    }

    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .find(|token| token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
}

/// Resolve a page-relative path against the catalog origin.
///
/// Absolute URLs are returned unchanged. Empty paths yield `None`.
pub fn absolute_url(base_url: &Url, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }

    match base_url.join(path) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::warn!(path, error = %e, "Could not resolve URL against base");
            None
        }
    }
}
