use std::{future::Future, sync::Arc};

use tokio::sync::Semaphore;

use crate::{
    models::{PageFetch, RatingRecord},
    scrape::page::FilmPageSource,
};

/// How the page window is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingPolicy {
    /// Fetch all `max_pages` pages concurrently, even past the user's last
    /// page. Costs extra requests but keeps latency flat.
    FixedWindow,
    /// Fetch pages sequentially and stop at the first page with no records.
    StopAtFirstEmpty,
}

/// Aggregates one user's listing pages into a flat record list.
///
/// Page fetches run under the injected semaphore; the gate may be shared
/// with other scrapers so that total in-flight fetches stay bounded across
/// the whole process. Output preserves page order regardless of the
/// concurrency limit. An all-empty window is "no data", not an error.
pub struct UserScraper {
    source: Arc<dyn FilmPageSource>,
    gate: Arc<Semaphore>,
    max_pages: u32,
    policy: PagingPolicy,
}

impl UserScraper {
    pub fn new(
        source: Arc<dyn FilmPageSource>,
        gate: Arc<Semaphore>,
        max_pages: u32,
        policy: PagingPolicy,
    ) -> Self {
        Self {
            source,
            gate,
            max_pages,
            policy,
        }
    }

    /// Scrapes all of a user's rating records across the page window.
    pub async fn scrape_ratings(&self, username: &str) -> Vec<RatingRecord> {
        tracing::debug!(username = %username, "Started scraping ratings");

        let records = self
            .collect_pages(username, |source, username, page| async move {
                source.fetch_ratings_page(&username, page).await
            })
            .await;

        tracing::info!(
            username = %username,
            records = records.len(),
            "Finished scraping ratings"
        );
        records
    }

    /// Scrapes every film slug the user has watched across the page window.
    pub async fn scrape_watched(&self, username: &str) -> Vec<String> {
        tracing::debug!(username = %username, "Started scraping watched films");

        let slugs = self
            .collect_pages(username, |source, username, page| async move {
                source.fetch_watched_page(&username, page).await
            })
            .await;

        tracing::info!(
            username = %username,
            films = slugs.len(),
            "Finished scraping watched films"
        );
        slugs
    }

    async fn collect_pages<T, F, Fut>(&self, username: &str, fetch: F) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn FilmPageSource>, String, u32) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = PageFetch<T>> + Send + 'static,
    {
        match self.policy {
            PagingPolicy::FixedWindow => self.fixed_window(username, fetch).await,
            PagingPolicy::StopAtFirstEmpty => self.stop_at_first_empty(username, fetch).await,
        }
    }

    /// Issues one fetch per page in the window, bounded by the gate, and
    /// flattens results in page order.
    async fn fixed_window<T, F, Fut>(&self, username: &str, fetch: F) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn FilmPageSource>, String, u32) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = PageFetch<T>> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(self.max_pages as usize);
        for page in 1..=self.max_pages {
            let source = Arc::clone(&self.source);
            let gate = Arc::clone(&self.gate);
            let username = username.to_string();
            let fetch = fetch.clone();

            handles.push(tokio::spawn(async move {
                // Owned permit: released on every exit path, including panics
                let _permit = gate.acquire_owned().await.expect("semaphore never closed");
                fetch(source, username, page).await
            }));
        }

        let mut collected = Vec::new();
        for (page, handle) in (1..=self.max_pages).zip(handles) {
            match handle.await {
                Ok(outcome) => collected.extend(outcome.into_records()),
                Err(e) => {
                    tracing::error!(username = %username, page, error = %e, "Page task failed");
                }
            }
        }
        collected
    }

    async fn stop_at_first_empty<T, F, Fut>(&self, username: &str, fetch: F) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn FilmPageSource>, String, u32) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = PageFetch<T>> + Send + 'static,
    {
        let mut collected = Vec::new();
        for page in 1..=self.max_pages {
            let outcome = {
                let _permit = self.gate.acquire().await.expect("semaphore never closed");
                fetch(Arc::clone(&self.source), username.to_string(), page).await
            };

            match outcome {
                PageFetch::Records(records) => collected.extend(records),
                PageFetch::Empty | PageFetch::Failed(_) => break,
            }
        }
        collected
    }
}
