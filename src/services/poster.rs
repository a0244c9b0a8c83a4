use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[cfg(test)]
use mockall::automock;

const POSTER_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Poster artwork lookup, one call per recommended film.
///
/// Purely cosmetic: implementations degrade to `None` on failure rather
/// than failing the recommendation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PosterSource: Send + Sync {
    async fn poster_url(&self, movie_slug: &str) -> Option<String>;
}

/// TMDb movie-search client
pub struct TmdbClient {
    http_client: reqwest::Client,
    api_key: String,
    api_url: String,
    year_suffix: Regex,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    #[serde(default)]
    poster_path: Option<String>,
}

impl TmdbClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
            api_url,
            year_suffix: Regex::new(r"-\d{4}$").expect("hard-coded pattern"),
        }
    }

    /// Turns a film slug into a search query: the trailing release year is
    /// stripped and hyphens become spaces ("dune-part-two-2024" → "dune part two").
    fn search_query(&self, movie_slug: &str) -> String {
        self.year_suffix.replace(movie_slug, "").replace('-', " ")
    }

    async fn search_poster(&self, query: &str) -> AppResult<Option<String>> {
        let url = format!("{}/search/movie", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "TMDb search returned status {}",
                status
            )));
        }

        let search: TmdbSearchResponse = response.json().await?;
        Ok(search
            .results
            .first()
            .and_then(|movie| movie.poster_path.as_deref())
            .map(|path| format!("{}{}", POSTER_IMAGE_BASE, path)))
    }
}

#[async_trait]
impl PosterSource for TmdbClient {
    async fn poster_url(&self, movie_slug: &str) -> Option<String> {
        let query = self.search_query(movie_slug);
        match self.search_poster(&query).await {
            Ok(poster_url) => poster_url,
            Err(e) => {
                tracing::warn!(movie_slug = %movie_slug, error = %e, "Poster lookup failed");
                None
            }
        }
    }
}
