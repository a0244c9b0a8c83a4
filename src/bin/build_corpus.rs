//! Offline corpus builder: discovers popular member usernames, scrapes each
//! member's rated films, and writes the combined table to CSV for the API
//! server to load at startup.

use std::{path::Path, sync::Arc};

use clap::Parser;
use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

use cinerec_api::{
    scrape::{discover::MemberDiscoverer, fleet::scrape_fleet, page::LetterboxdClient},
    services::corpus,
};

#[derive(Debug, Parser)]
#[command(name = "build-corpus", about = "Scrape member ratings into a CSV corpus")]
struct Args {
    /// Number of member usernames to collect
    #[arg(long, default_value_t = 100)]
    users: usize,

    /// Maximum simultaneous in-flight page fetches
    #[arg(long, default_value_t = 10)]
    concurrency: usize,

    /// Listing pages fetched per user
    #[arg(long, default_value_t = 10)]
    max_pages: u32,

    /// Popular-member pages fetched per discovery round
    #[arg(long, default_value_t = 5)]
    pages_per_round: usize,

    /// Upper bound on discovery rounds before giving up
    #[arg(long, default_value_t = 50)]
    max_rounds: usize,

    /// Output CSV path (a numeric suffix is added if it already exists)
    #[arg(long, default_value = "letterboxd_user_ratings.csv")]
    out: String,

    /// Base URL of the film listing site
    #[arg(long, default_value = "https://letterboxd.com")]
    base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let client = Arc::new(LetterboxdClient::new(args.base_url.clone())?);

    let discoverer = MemberDiscoverer::new(client.clone(), args.pages_per_round, args.max_rounds);
    let usernames = discoverer.discover(args.users).await?;
    tracing::info!(users = usernames.len(), "Discovered members");

    let gate = Arc::new(Semaphore::new(args.concurrency));
    let records = scrape_fleet(client, &usernames, gate, args.max_pages).await;
    // 0.0 is the parser's "no usable rating" sentinel; keep it out of the corpus
    let records: Vec<_> = records
        .into_iter()
        .filter(|record| record.rating > 0.0)
        .collect();
    if records.is_empty() {
        anyhow::bail!("No ratings collected; corpus not written");
    }

    let written = corpus::save(&records, Path::new(&args.out))?;
    tracing::info!(
        records = records.len(),
        path = %written.display(),
        "Corpus written"
    );

    Ok(())
}
