use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::{
    error::AppResult,
    models::{FetchFailure, PageFetch, RatingRecord},
    scrape::stars::{parse_star_rating, LIKED_PLACEHOLDER},
};

/// Per-request timeout for listing page fetches
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of per-user film listing pages.
///
/// `fetch_ratings_page` and `fetch_watched_page` read the same listing; the
/// ratings variant keeps only containers with a star rating or a liked
/// marker, the watched variant keeps every container with a film slug.
#[async_trait]
pub trait FilmPageSource: Send + Sync {
    async fn fetch_ratings_page(&self, username: &str, page: u32) -> PageFetch<RatingRecord>;

    async fn fetch_watched_page(&self, username: &str, page: u32) -> PageFetch<String>;
}

/// Source of popular-member listing pages, yielding usernames.
#[async_trait]
pub trait MemberPageSource: Send + Sync {
    async fn fetch_members_page(&self, page: u32) -> PageFetch<String>;
}

/// HTTP client for the film listing site.
///
/// One instance holds one pooled `reqwest::Client`; clones share the pool.
#[derive(Clone)]
pub struct LetterboxdClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl LetterboxdClient {
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let http_client = reqwest::Client::builder().timeout(PAGE_TIMEOUT).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    fn films_url(&self, username: &str, page: u32) -> String {
        format!("{}/{}/films/page/{}/", self.base_url, username, page)
    }

    fn members_url(&self, page: u32) -> String {
        format!("{}/members/popular/page/{}/", self.base_url, page)
    }

    /// Fetches a page body, classifying timeout / transport / status failures.
    async fn fetch_html(&self, url: &str) -> Result<String, FetchFailure> {
        let response = match self.http_client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Err(FetchFailure::Timeout),
            Err(e) => return Err(FetchFailure::Transport(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))
    }
}

#[async_trait]
impl FilmPageSource for LetterboxdClient {
    async fn fetch_ratings_page(&self, username: &str, page: u32) -> PageFetch<RatingRecord> {
        let url = self.films_url(username, page);
        match self.fetch_html(&url).await {
            Ok(html) => {
                let records = parse_ratings_page(&html, username);
                if records.is_empty() {
                    PageFetch::Empty
                } else {
                    PageFetch::Records(records)
                }
            }
            Err(cause) => {
                tracing::warn!(
                    username = %username,
                    page,
                    error = %cause,
                    "Failed to retrieve ratings page"
                );
                PageFetch::Failed(cause)
            }
        }
    }

    async fn fetch_watched_page(&self, username: &str, page: u32) -> PageFetch<String> {
        let url = self.films_url(username, page);
        match self.fetch_html(&url).await {
            Ok(html) => {
                let slugs = parse_watched_page(&html);
                if slugs.is_empty() {
                    PageFetch::Empty
                } else {
                    PageFetch::Records(slugs)
                }
            }
            Err(cause) => {
                tracing::warn!(
                    username = %username,
                    page,
                    error = %cause,
                    "Failed to retrieve watched films page"
                );
                PageFetch::Failed(cause)
            }
        }
    }
}

#[async_trait]
impl MemberPageSource for LetterboxdClient {
    async fn fetch_members_page(&self, page: u32) -> PageFetch<String> {
        let url = self.members_url(page);
        match self.fetch_html(&url).await {
            Ok(html) => {
                let usernames = parse_members_page(&html);
                if usernames.is_empty() {
                    PageFetch::Empty
                } else {
                    PageFetch::Records(usernames)
                }
            }
            Err(cause) => {
                tracing::warn!(page, error = %cause, "Failed to retrieve members page");
                PageFetch::Failed(cause)
            }
        }
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("hard-coded selector")
}

/// Extracts rating records from a films listing page.
///
/// Each `li.poster-container` yields at most one record: the film slug comes
/// from a `div[data-film-slug]` child (missing slug skips the container), the
/// rating from a `span.rating` child passed through the star parser. A
/// container with no rating text but a `span.like` marker gets the liked
/// placeholder; one with neither yields nothing.
pub fn parse_ratings_page(html: &str, username: &str) -> Vec<RatingRecord> {
    let document = Html::parse_document(html);
    let container_sel = selector("li.poster-container");
    let slug_sel = selector("div[data-film-slug]");
    let rating_sel = selector("span.rating");
    let like_sel = selector("span.like");

    let mut records = Vec::new();
    for container in document.select(&container_sel) {
        let Some(slug) = container
            .select(&slug_sel)
            .next()
            .and_then(|el| el.value().attr("data-film-slug"))
        else {
            continue;
        };

        let rating_text = container
            .select(&rating_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());
        let liked = container.select(&like_sel).next().is_some();

        match rating_text {
            Some(text) if !text.is_empty() => records.push(RatingRecord {
                username: username.to_string(),
                movie_slug: slug.to_string(),
                rating: parse_star_rating(&text),
            }),
            _ if liked => records.push(RatingRecord {
                username: username.to_string(),
                movie_slug: slug.to_string(),
                rating: LIKED_PLACEHOLDER,
            }),
            _ => {}
        }
    }

    records
}

/// Extracts watched film slugs from a films listing page.
///
/// Any poster container with a film slug counts as watched, regardless of
/// rating or liked status.
pub fn parse_watched_page(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let container_sel = selector("li.poster-container");
    let slug_sel = selector("div[data-film-slug]");

    document
        .select(&container_sel)
        .filter_map(|container| {
            container
                .select(&slug_sel)
                .next()
                .and_then(|el| el.value().attr("data-film-slug"))
                .map(str::to_string)
        })
        .collect()
}

/// Extracts usernames from a popular-members listing page.
///
/// Usernames are the last path segment of each `a.name` profile link.
pub fn parse_members_page(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let name_sel = selector("a.name");

    document
        .select(&name_sel)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| {
            href.split('/')
                .filter(|segment| !segment.is_empty())
                .next_back()
                .map(str::to_string)
        })
        .collect()
}
