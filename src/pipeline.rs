//! The ingestion-and-enrichment pipeline.
//!
//! Keywords are processed one at a time and, within a keyword, entries are
//! processed one at a time:
//!
//! 1. **Query**: build the region-scoped feed-search URL
//! 2. **Feed**: fetch the first N entries (retried, then empty on failure)
//! 3. **Dedup**: skip entries whose identity key is already known
//! 4. **Text**: resolve the article body, falling back to the feed summary
//! 5. **Region filter**: drop entries that never mention the region
//! 6. **Enrich**: summary, category, cities, names, relevance, snippet
//! 7. **Accept**: queue the row and pause before the next entry
//!
//! Nothing below this level returns an error; the only fatal conditions of a
//! run live in configuration loading and [`crate::store::commit`].

use crate::article::{ResolvedText, TextSource, resolve_body_text};
use crate::classify::classify;
use crate::config::KeywordConfig;
use crate::extract::{extract_cities, extract_names};
use crate::feed::fetch_feed;
use crate::fetch::{Fetch, RetryFetch};
use crate::models::{EnrichedRecord, FeedEntry};
use crate::query::{FeedLocale, build_feed_url};
use crate::relevance::{DEFAULT_REGION_TERMS, mentions_region, relevance_score};
use crate::store::MergeBatch;
use crate::summarize::{SUMMARY_SENTENCES, SentenceRanker, SummaryMethod, summarize};
use crate::utils::{snippet, truncate_for_log};
use chrono::{SecondsFormat, Utc};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument};

/// Runtime knobs of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Feed entries considered per keyword.
    pub entries_per_keyword: usize,
    /// Sentences kept by the summarizer.
    pub summary_sentences: usize,
    /// Maximum length of `raw_text_snippet`, in characters.
    pub snippet_chars: usize,
    /// Courtesy pause after each accepted entry.
    pub entry_delay: Duration,
    /// Extra feed-query attempts after a failure.
    pub feed_retries: usize,
    /// Initial backoff between feed-query attempts.
    pub feed_retry_delay: Duration,
    /// Qualifier appended to every keyword query.
    pub region: String,
    /// Spellings an accepted entry must mention.
    pub region_terms: Vec<String>,
    pub locale: FeedLocale,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            entries_per_keyword: 10,
            summary_sentences: SUMMARY_SENTENCES,
            snippet_chars: 800,
            entry_delay: Duration::from_millis(500),
            feed_retries: 0,
            feed_retry_delay: Duration::from_secs(1),
            region: "paraíba".to_string(),
            region_terms: DEFAULT_REGION_TERMS.iter().map(|s| s.to_string()).collect(),
            locale: FeedLocale::default(),
        }
    }
}

/// Counters describing one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub keywords: usize,
    pub entries_seen: usize,
    pub duplicates: usize,
    pub off_region: usize,
    pub accepted: usize,
    pub feed_summary_fallbacks: usize,
    pub summarizer_fallbacks: usize,
}

/// Per-entry outcome of [`Pipeline::process_entry`].
#[derive(Debug)]
pub enum EntryOutcome {
    Duplicate,
    OffRegion,
    Accepted(Box<EnrichedRecord>),
}

/// Drives the per-keyword, per-entry flow over borrowed collaborators.
pub struct Pipeline<'a, F, R> {
    fetcher: &'a F,
    ranker: &'a R,
    config: &'a KeywordConfig,
    settings: &'a PipelineSettings,
}

impl<'a, F, R> Pipeline<'a, F, R>
where
    F: Fetch,
    R: SentenceRanker,
{
    pub fn new(
        fetcher: &'a F,
        ranker: &'a R,
        config: &'a KeywordConfig,
        settings: &'a PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            ranker,
            config,
            settings,
        }
    }

    /// Process every configured keyword, accepting new rows into `batch`.
    #[instrument(level = "info", skip_all, fields(keywords = self.config.keywords.len()))]
    pub async fn run(&self, mut batch: MergeBatch) -> (MergeBatch, RunStats) {
        let mut stats = RunStats::default();
        let feed_fetcher = RetryFetch::new(
            self.fetcher,
            self.settings.feed_retries,
            self.settings.feed_retry_delay,
        );

        for keyword in &self.config.keywords {
            stats.keywords += 1;
            let url = build_feed_url(keyword, &self.settings.region, &self.settings.locale);
            info!(%keyword, %url, "Querying feed");

            let entries = fetch_feed(&feed_fetcher, &url, self.settings.entries_per_keyword).await;
            for entry in entries {
                stats.entries_seen += 1;
                match self.process_entry(&entry, &batch, &mut stats).await {
                    EntryOutcome::Duplicate => stats.duplicates += 1,
                    EntryOutcome::OffRegion => stats.off_region += 1,
                    EntryOutcome::Accepted(row) => {
                        info!(
                            title = %truncate_for_log(&row.title, 80),
                            category = %row.category,
                            relevance = row.relevance,
                            "Accepted entry"
                        );
                        if batch.accept(*row) {
                            stats.accepted += 1;
                        } else {
                            stats.duplicates += 1;
                        }
                        sleep(self.settings.entry_delay).await;
                    }
                }
            }
        }

        info!(?stats, "Pipeline run finished");
        (batch, stats)
    }

    /// Decide the fate of one entry against the keys already in `batch`.
    pub async fn process_entry(
        &self,
        entry: &FeedEntry,
        batch: &MergeBatch,
        stats: &mut RunStats,
    ) -> EntryOutcome {
        if !batch.is_new(&entry.identity_key()) {
            debug!(title = %entry.title, "Already collected; skipping");
            return EntryOutcome::Duplicate;
        }

        let body = resolve_body_text(self.fetcher, entry).await;
        if body.source == TextSource::FeedSummary {
            stats.feed_summary_fallbacks += 1;
        }

        let combined = format!("{} {}", entry.title, body.text);
        if !mentions_region(&combined, &self.settings.region_terms) {
            debug!(title = %entry.title, "Entry does not mention the region; discarding");
            return EntryOutcome::OffRegion;
        }

        let row = self.enrich(entry, &body, stats);
        EntryOutcome::Accepted(Box::new(row))
    }

    /// Derive every enriched field from an entry and its resolved text.
    pub fn enrich(&self, entry: &FeedEntry, body: &ResolvedText, stats: &mut RunStats) -> EnrichedRecord {
        let combined = format!("{} {}", entry.title, body.text);

        let summary = summarize(self.ranker, &body.text, self.settings.summary_sentences);
        if summary.method == SummaryMethod::NaiveSplit {
            stats.summarizer_fallbacks += 1;
        }

        EnrichedRecord {
            title: entry.title.clone(),
            link: entry.link.clone(),
            published: entry.published.clone(),
            fetched_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            summary: summary.text,
            category: classify(&combined),
            cities: extract_cities(&combined, &self.config.cities),
            names: extract_names(&body.text).into_iter().collect(),
            relevance: relevance_score(&combined, &self.config.keywords),
            raw_text_snippet: snippet(&body.text, self.settings.snippet_chars),
        }
    }
}
