//! Article body acquisition with an explicit fallback chain.
//!
//! 1. Download the article page (browser-like `User-Agent`, bounded timeout).
//! 2. Concatenate the text of every `<p>` element in document order.
//! 3. If that text is shorter than [`MIN_PARAGRAPH_CHARS`], use the page's
//!    `<meta name="description">` content instead, when present.
//! 4. If the page yields nothing, the caller falls back to the feed entry's
//!    own summary.
//!
//! Every step reports which source won, so each branch can be exercised
//! in isolation.

use crate::fetch::Fetch;
use crate::models::FeedEntry;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

/// Paragraph text shorter than this (in characters) prefers the meta description.
pub const MIN_PARAGRAPH_CHARS: usize = 200;

static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector"));
static META_DESCRIPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).expect("static selector"));

/// Where the resolved body text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// Concatenated `<p>` elements of the article page.
    Paragraphs,
    /// The page's meta description.
    MetaDescription,
    /// The summary carried by the feed entry.
    FeedSummary,
    /// Nothing usable was found.
    Empty,
}

/// Body text together with the step of the fallback chain that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedText {
    pub text: String,
    pub source: TextSource,
}

impl ResolvedText {
    fn empty() -> Self {
        Self {
            text: String::new(),
            source: TextSource::Empty,
        }
    }
}

/// Extract the best-available body text from an article page.
pub fn extract_article_text(html: &str) -> ResolvedText {
    let document = Html::parse_document(html);

    let paragraphs = document
        .select(&PARAGRAPH_SELECTOR)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");

    let mut resolved = ResolvedText {
        text: paragraphs,
        source: TextSource::Paragraphs,
    };

    if resolved.text.chars().count() < MIN_PARAGRAPH_CHARS {
        let meta = document
            .select(&META_DESCRIPTION_SELECTOR)
            .find_map(|m| m.value().attr("content"))
            .filter(|content| !content.trim().is_empty());
        if let Some(content) = meta {
            resolved = ResolvedText {
                text: content.to_string(),
                source: TextSource::MetaDescription,
            };
        }
    }

    resolved.text = resolved.text.trim().to_string();
    if resolved.text.is_empty() {
        return ResolvedText::empty();
    }
    resolved
}

/// Download `link` and extract its body text; any failure yields [`TextSource::Empty`].
#[instrument(level = "debug", skip(fetcher))]
pub async fn fetch_article_text<F: Fetch>(fetcher: &F, link: &str) -> ResolvedText {
    match fetcher.fetch(link).await {
        Ok(body) => extract_article_text(&String::from_utf8_lossy(&body)),
        Err(e) => {
            debug!(error = %e, "Article fetch failed");
            ResolvedText::empty()
        }
    }
}

/// Replace an empty article text with the feed entry's summary.
///
/// A short but present article text is kept as-is.
pub fn with_feed_fallback(article: ResolvedText, feed_summary: &str) -> ResolvedText {
    if !article.text.is_empty() {
        return article;
    }
    if feed_summary.is_empty() {
        return ResolvedText::empty();
    }
    ResolvedText {
        text: feed_summary.to_string(),
        source: TextSource::FeedSummary,
    }
}

/// Run the whole fallback chain for one feed entry.
pub async fn resolve_body_text<F: Fetch>(fetcher: &F, entry: &FeedEntry) -> ResolvedText {
    let article = fetch_article_text(fetcher, &entry.link).await;
    with_feed_fallback(article, &entry.summary)
}
