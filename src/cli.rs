//! Command-line interface definitions for Paraíba News.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! All arguments can be provided via command-line flags or environment variables.

use crate::pipeline::PipelineSettings;
use crate::query::FeedLocale;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the Paraíba News collector.
///
/// # Examples
///
/// ```sh
/// # Defaults: ./keywords.json in, ./noticias_paraiba.csv out
/// paraiba_news
///
/// # Custom files and a faster courtesy pause
/// paraiba_news -c config/keywords.yaml -o data/noticias.csv --delay-ms 250
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Keyword and city configuration (JSON, or YAML by extension)
    #[arg(short, long, env = "PARAIBA_NEWS_CONFIG", default_value = "keywords.json")]
    pub config: PathBuf,

    /// CSV store the collected records are appended to
    #[arg(short, long, env = "PARAIBA_NEWS_OUTPUT", default_value = "noticias_paraiba.csv")]
    pub output: PathBuf,

    /// Feed entries considered per keyword
    #[arg(short = 'n', long, env = "PARAIBA_NEWS_LIMIT", default_value_t = 10)]
    pub limit: usize,

    /// Region qualifier appended to every query
    #[arg(long, env = "PARAIBA_NEWS_REGION", default_value = "paraíba")]
    pub region: String,

    /// HTTP timeout in seconds for feed and article requests
    #[arg(long, env = "PARAIBA_NEWS_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Pause after each accepted entry, in milliseconds
    #[arg(long, env = "PARAIBA_NEWS_DELAY_MS", default_value_t = 500)]
    pub delay_ms: u64,

    /// Extra attempts for a failing feed query (each one may take a full timeout)
    #[arg(long, env = "PARAIBA_NEWS_FEED_RETRIES", default_value_t = 0)]
    pub feed_retries: usize,

    /// Feed interface language (`hl`)
    #[arg(long, default_value = "pt-BR")]
    pub language: String,

    /// Feed country (`gl`)
    #[arg(long, default_value = "BR")]
    pub country: String,

    /// Language part of the feed edition (`ceid`)
    #[arg(long, default_value = "pt-PT")]
    pub ceid_language: String,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pipeline settings derived from the flags; unspecified knobs keep their defaults.
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            entries_per_keyword: self.limit,
            entry_delay: Duration::from_millis(self.delay_ms),
            feed_retries: self.feed_retries,
            region: self.region.clone(),
            locale: FeedLocale {
                language: self.language.clone(),
                country: self.country.clone(),
                ceid_language: self.ceid_language.clone(),
            },
            ..PipelineSettings::default()
        }
    }
}
