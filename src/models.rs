//! Data models for feed entries and the enriched rows persisted to the store.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FeedEntry`]: one raw item returned by a feed-search query
//! - [`EnrichedRecord`]: an accepted entry with derived metadata, one CSV row
//! - [`Category`]: the fixed label set assigned by the classifier
//!
//! `cities` and `names` are kept as vectors in memory but are stored as
//! semicolon-joined strings, hence the custom column codecs at the bottom.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Column order of the persisted table.
pub const STORE_COLUMNS: [&str; 10] = [
    "title",
    "link",
    "published",
    "fetched_at",
    "summary",
    "category",
    "cities",
    "names",
    "relevance",
    "raw_text_snippet",
];

/// A raw item as delivered by the feed-search service.
///
/// `published` is kept verbatim; feeds disagree on timestamp formats and the
/// raw value is part of the identity key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    /// Headline of the item.
    pub title: String,
    /// Link to the article page.
    pub link: String,
    /// Loosely structured publication timestamp.
    pub published: String,
    /// Inline summary supplied by the feed, possibly empty.
    pub summary: String,
}

impl FeedEntry {
    /// Key used to decide whether this entry has already been persisted.
    pub fn identity_key(&self) -> String {
        identity_key(&self.title, &self.published)
    }
}

/// Build the dedup key from a title and a publication timestamp.
pub fn identity_key(title: &str, published: &str) -> String {
    format!("{title}_{published}")
}

/// Category label assigned by [`crate::classify::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Homicídio")]
    Homicide,
    #[serde(rename = "Tráfico")]
    Trafficking,
    #[serde(rename = "Operação Policial")]
    PoliceOperation,
    #[serde(rename = "Roubo")]
    Theft,
    #[serde(rename = "Outro")]
    Other,
}

impl Category {
    /// Every label, in classifier priority order.
    pub const ALL: [Category; 5] = [
        Category::Homicide,
        Category::Trafficking,
        Category::PoliceOperation,
        Category::Theft,
        Category::Other,
    ];

    /// Label written to the store.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Homicide => "Homicídio",
            Category::Trafficking => "Tráfico",
            Category::PoliceOperation => "Operação Policial",
            Category::Theft => "Roubo",
            Category::Other => "Outro",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An accepted feed entry together with everything derived from it.
///
/// Records are created once by the pipeline and never mutated afterwards.
/// Field order matches [`STORE_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub title: String,
    pub link: String,
    pub published: String,
    /// Processing time, RFC 3339 UTC.
    pub fetched_at: String,
    /// Short digest of the resolved text.
    pub summary: String,
    pub category: Category,
    /// Matched configured places, in configuration order.
    #[serde(serialize_with = "join_column", deserialize_with = "split_column")]
    pub cities: Vec<String>,
    /// Candidate person names.
    #[serde(serialize_with = "join_column", deserialize_with = "split_column")]
    pub names: Vec<String>,
    #[serde(deserialize_with = "relevance_column")]
    pub relevance: u32,
    /// Bounded excerpt of the resolved text on a single line.
    pub raw_text_snippet: String,
}

impl EnrichedRecord {
    pub fn identity_key(&self) -> String {
        identity_key(&self.title, &self.published)
    }
}

fn join_column<S>(values: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&values.join(";"))
}

fn split_column<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

/// Relevance as written by this crate (`2`), by spreadsheet tools (`2.0`) or
/// left blank (read as `0`).
fn relevance_column<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    if let Ok(value) = raw.parse::<u32>() {
        return Ok(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value.fract() == 0.0 => {
            Ok(value as u32)
        }
        _ => Err(serde::de::Error::custom(format!(
            "invalid relevance {raw:?}"
        ))),
    }
}
