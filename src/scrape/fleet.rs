use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::{
    models::RatingRecord,
    scrape::{
        page::FilmPageSource,
        user::{PagingPolicy, UserScraper},
    },
};

/// Scrapes rating records for many users into one concatenated corpus.
///
/// All users run concurrently, but every page fetch across the whole fleet
/// goes through the single shared `gate`, so total in-flight requests stay
/// bounded. Each user's task owns its own result: a user that yields nothing
/// (or whose task fails) is logged and skipped without touching anyone
/// else's records. Duplicate rows across users are expected and retained.
pub async fn scrape_fleet(
    source: Arc<dyn FilmPageSource>,
    usernames: &[String],
    gate: Arc<Semaphore>,
    max_pages: u32,
) -> Vec<RatingRecord> {
    tracing::info!(users = usernames.len(), "Started fleet scrape");

    let mut tasks = Vec::with_capacity(usernames.len());
    for username in usernames {
        let scraper = UserScraper::new(
            Arc::clone(&source),
            Arc::clone(&gate),
            max_pages,
            PagingPolicy::FixedWindow,
        );
        let username = username.clone();
        tasks.push(tokio::spawn(
            async move { scraper.scrape_ratings(&username).await },
        ));
    }

    let mut corpus = Vec::new();
    let mut empty_users = 0usize;
    for task in tasks {
        match task.await {
            Ok(records) if records.is_empty() => empty_users += 1,
            Ok(records) => corpus.extend(records),
            Err(e) => {
                tracing::error!(error = %e, "User scrape task failed");
                empty_users += 1;
            }
        }
    }

    tracing::info!(
        users = usernames.len(),
        empty_users,
        records = corpus.len(),
        "Finished fleet scrape"
    );
    corpus
}
