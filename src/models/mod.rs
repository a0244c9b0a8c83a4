use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A single scraped rating: one user's numeric score for one film.
///
/// Ratings are half-point values in [0.5, 5.0]; a value of 0.0 is the
/// parser's "no usable rating" sentinel and must be filtered before any
/// statistical use. Duplicate (username, movie_slug) pairs across pages are
/// possible and retained as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub username: String,
    pub movie_slug: String,
    pub rating: f32,
}

/// Cause of a failed page fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchFailure {
    Timeout,
    Transport(String),
    Status(u16),
}

impl Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Timeout => write!(f, "request timed out"),
            FetchFailure::Transport(msg) => write!(f, "transport error: {}", msg),
            FetchFailure::Status(code) => write!(f, "non-success status {}", code),
        }
    }
}

/// Outcome of fetching one listing page.
///
/// Keeps the failure cause tagged at the page layer instead of collapsing
/// everything to an empty list; aggregators call [`PageFetch::into_records`]
/// to recover the original "failed pages contribute nothing" behavior.
#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch<T> {
    /// The page had poster containers and yielded records
    Records(Vec<T>),
    /// The page had no extractable records (end of data or an empty page)
    Empty,
    /// The fetch itself failed; recovered locally, never propagated
    Failed(FetchFailure),
}

impl<T> PageFetch<T> {
    /// Collapses the outcome into the records it produced, if any.
    pub fn into_records(self) -> Vec<T> {
        match self {
            PageFetch::Records(records) => records,
            PageFetch::Empty | PageFetch::Failed(_) => Vec::new(),
        }
    }
}

/// One recommended film returned to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub slug: String,
    pub poster_url: Option<String>,
    pub rating: f32,
}
