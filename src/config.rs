use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the film listing site being scraped
    #[serde(default = "default_letterboxd_url")]
    pub letterboxd_url: String,

    /// TMDb API key for poster lookups
    pub tmdb_api_key: String,

    /// TMDb API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Path to the pre-collected ratings corpus (CSV)
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Maximum simultaneous in-flight page fetches
    #[serde(default = "default_scrape_concurrency")]
    pub scrape_concurrency: usize,

    /// Number of listing pages fetched per user
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Number of recommendations returned per request
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_letterboxd_url() -> String {
    "https://letterboxd.com".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_corpus_path() -> String {
    "letterboxd_user_ratings.csv".to_string()
}

fn default_scrape_concurrency() -> usize {
    5
}

fn default_max_pages() -> u32 {
    10
}

fn default_top_n() -> usize {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
