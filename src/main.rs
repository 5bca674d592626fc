//! # Paraíba News
//!
//! A news collection pipeline that queries Google News RSS for a list of
//! keywords, keeps the entries that are about Paraíba, enriches them locally
//! and appends them to a deduplicated CSV file.
//!
//! ## Features
//!
//! - Region-scoped feed queries per configured keyword
//! - Article body extraction with meta-description and feed-summary fallbacks
//! - Local LexRank summaries, keyword-bucket categories, city and name extraction
//! - Idempotent runs: a `title + published` key is never stored twice
//!
//! ## Usage
//!
//! ```sh
//! paraiba_news -c keywords.json -o noticias_paraiba.csv
//! ```
//!
//! ## Architecture
//!
//! The application follows a sequential pipeline architecture:
//! 1. **Configuration**: load keywords and cities (fatal if missing)
//! 2. **Store**: read previously collected rows and their identity keys
//! 3. **Collection**: per keyword, per entry, resolve text and enrich it,
//!    pausing after every accepted entry
//! 4. **Commit**: rewrite the CSV once, only when something new was found

use std::error::Error;

use clap::Parser;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod article;
mod classify;
mod cli;
mod config;
mod extract;
mod feed;
mod fetch;
mod models;
mod pipeline;
mod query;
mod relevance;
mod store;
mod summarize;
mod utils;

use cli::Cli;
use config::KeywordConfig;
use fetch::HttpFetcher;
use pipeline::Pipeline;
use store::CommitOutcome;
use summarize::LexRank;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("paraiba_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Configuration problems abort before any fetching.
    let config = match KeywordConfig::load(&args.config).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Cannot start without a valid configuration");
            return Err(e.into());
        }
    };

    if let Err(e) = store::check_writable(&args.output).await {
        error!(
            error = %e,
            "Store directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let settings = args.settings();
    let fetcher = HttpFetcher::new(args.timeout())?;
    let ranker = LexRank::default();
    let pipeline = Pipeline::new(&fetcher, &ranker, &config, &settings);

    let batch = store::load(&args.output).await;
    let (batch, stats) = pipeline.run(batch).await;

    match store::commit(&args.output, batch).await {
        Ok(CommitOutcome::Written { total, added }) => {
            info!(total, added, path = %args.output.display(), "Store updated");
            println!("Saved {} records to {}", total, args.output.display());
        }
        Ok(CommitOutcome::NothingNew { total }) => {
            info!(total, "Nothing new to store");
            println!("No new records found.");
        }
        Err(e) => {
            error!(error = %e, "Failed to write the store");
            return Err(e.into());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        accepted = stats.accepted,
        duplicates = stats.duplicates,
        off_region = stats.off_region,
        "Execution complete"
    );

    Ok(())
}
