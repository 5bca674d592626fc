//! Feed retrieval: RSS 2.0 decoding into [`FeedEntry`] values.
//!
//! Entries are returned in the order the upstream feed supplies them (not
//! necessarily chronological) and truncated to a fixed count. Any failure,
//! transport or decoding, is a normal "no results" outcome.

use crate::fetch::Fetch;
use crate::models::FeedEntry;
use crate::utils::{collapse_whitespace, html_to_text};
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

impl From<Item> for FeedEntry {
    fn from(item: Item) -> Self {
        FeedEntry {
            title: item.title.unwrap_or_default().trim().to_string(),
            link: item.link.unwrap_or_default().trim().to_string(),
            published: item.pub_date.unwrap_or_default().trim().to_string(),
            summary: item
                .description
                .as_deref()
                .map(|d| collapse_whitespace(&html_to_text(d)))
                .unwrap_or_default(),
        }
    }
}

/// Decode an RSS 2.0 document into feed entries, in document order.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, quick_xml::DeError> {
    let rss: Rss = from_str(xml)?;
    Ok(rss.channel.items.into_iter().map(FeedEntry::from).collect())
}

/// Retrieve at most `limit` entries for a feed-search URL.
///
/// Returns an empty vector when retrieval or decoding fails.
#[instrument(level = "info", skip(fetcher))]
pub async fn fetch_feed<F: Fetch>(fetcher: &F, url: &str, limit: usize) -> Vec<FeedEntry> {
    let body = match fetcher.fetch(url).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "Feed retrieval failed; treating as no results");
            return Vec::new();
        }
    };

    let xml = String::from_utf8_lossy(&body);
    let mut entries = match parse_feed(&xml) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Feed could not be decoded; treating as no results");
            return Vec::new();
        }
    };

    entries.truncate(limit);
    info!(count = entries.len(), "Fetched feed entries");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    const GOOGLE_NEWS_SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <generator>NFE/5.0</generator>
    <title>"violência paraíba" - Google Notícias</title>
    <link>https://news.google.com/search?q=viol%C3%AAncia+para%C3%ADba</link>
    <language>pt-BR</language>
    <item>
      <title>Crime na Paraíba - Jornal da Paraíba</title>
      <link>https://news.google.com/rss/articles/abc</link>
      <guid isPermaLink="false">abc</guid>
      <pubDate>Tue, 06 May 2025 12:00:00 GMT</pubDate>
      <description>&lt;a href="https://news.google.com/rss/articles/abc"&gt;Crime na Paraíba&lt;/a&gt;&amp;nbsp;&amp;nbsp;&lt;font color="#6f6f6f"&gt;Jornal da Paraíba&lt;/font&gt;</description>
      <source url="https://jornaldaparaiba.com.br">Jornal da Paraíba</source>
    </item>
    <item>
      <title>Segunda notícia</title>
      <link>https://news.google.com/rss/articles/def</link>
      <pubDate>Mon, 05 May 2025 08:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Terceira notícia</title>
      <link>https://news.google.com/rss/articles/ghi</link>
      <pubDate>Wed, 07 May 2025 08:30:00 GMT</pubDate>
    </item>
  </channel>
</rss>"##;

    struct Canned(Option<&'static str>);

    impl Fetch for Canned {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
            match self.0 {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err("feed host unreachable".into()),
            }
        }
    }

    #[test]
    fn test_parse_feed_keeps_upstream_order() {
        let entries = parse_feed(GOOGLE_NEWS_SAMPLE).unwrap();
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Crime na Paraíba - Jornal da Paraíba",
                "Segunda notícia",
                "Terceira notícia"
            ]
        );
        assert_eq!(entries[0].published, "Tue, 06 May 2025 12:00:00 GMT");
        assert_eq!(entries[0].link, "https://news.google.com/rss/articles/abc");
    }

    #[test]
    fn test_parse_feed_reduces_description_html_to_text() {
        let entries = parse_feed(GOOGLE_NEWS_SAMPLE).unwrap();
        assert_eq!(entries[0].summary, "Crime na Paraíba Jornal da Paraíba");
        assert_eq!(entries[1].summary, "");
    }

    #[test]
    fn test_parse_feed_without_items() {
        let xml = r#"<rss version="2.0"><channel><title>empty</title></channel></rss>"#;
        assert!(parse_feed(xml).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_feed_truncates_to_limit() {
        let fetcher = Canned(Some(GOOGLE_NEWS_SAMPLE));
        let entries = fetch_feed(&fetcher, "https://feed", 2).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].title, "Segunda notícia");
    }

    #[tokio::test]
    async fn test_fetch_feed_failure_is_empty() {
        assert!(fetch_feed(&Canned(None), "https://feed", 10).await.is_empty());
        assert!(
            fetch_feed(&Canned(Some("<html>not a feed")), "https://feed", 10)
                .await
                .is_empty()
        );
    }
}
