//! Feed-search query construction.
//!
//! A keyword is conjoined with the region qualifier, percent-encoded and
//! embedded into the Google News RSS search template:
//!
//! ```text
//! https://news.google.com/rss/search?q=<keyword region>&hl=<lang>&gl=<country>&ceid=<country>:<lang-variant>
//! ```

/// Base URL of the feed-search endpoint.
pub const FEED_SEARCH_URL: &str = "https://news.google.com/rss/search";

/// Locale parameters of the feed-search URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLocale {
    /// `hl` parameter, e.g. `pt-BR`.
    pub language: String,
    /// `gl` parameter and `ceid` prefix, e.g. `BR`.
    pub country: String,
    /// Language part of `ceid`.
    pub ceid_language: String,
}

impl Default for FeedLocale {
    fn default() -> Self {
        Self {
            language: "pt-BR".to_string(),
            country: "BR".to_string(),
            ceid_language: "pt-PT".to_string(),
        }
    }
}

/// Build the feed-search URL for one keyword.
///
/// An empty keyword still yields a well-formed, region-only query.
pub fn build_feed_url(keyword: &str, region: &str, locale: &FeedLocale) -> String {
    let query = format!("{keyword} {region}");
    format!(
        "{FEED_SEARCH_URL}?q={}&hl={}&gl={}&ceid={}:{}",
        urlencoding::encode(query.trim()),
        locale.language,
        locale.country,
        locale.country,
        locale.ceid_language
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_feed_url_encodes_keyword_and_region() {
        let url = build_feed_url("violência", "paraíba", &FeedLocale::default());
        assert_eq!(
            url,
            "https://news.google.com/rss/search?q=viol%C3%AAncia%20para%C3%ADba&hl=pt-BR&gl=BR&ceid=BR:pt-PT"
        );
    }

    #[test]
    fn test_build_feed_url_multi_word_keyword() {
        let url = build_feed_url("operação policial", "paraíba", &FeedLocale::default());
        assert!(url.contains("q=opera%C3%A7%C3%A3o%20policial%20para%C3%ADba&"));
    }

    #[test]
    fn test_empty_keyword_is_region_only() {
        let url = build_feed_url("", "paraíba", &FeedLocale::default());
        assert!(url.contains("?q=para%C3%ADba&hl="));
        assert!(url::Url::parse(&url).is_ok());
    }

    #[test]
    fn test_custom_locale() {
        let locale = FeedLocale {
            language: "en".to_string(),
            country: "US".to_string(),
            ceid_language: "en".to_string(),
        };
        let url = build_feed_url("crime", "texas", &locale);
        assert!(url.ends_with("&hl=en&gl=US&ceid=US:en"));
    }
}
