use std::{path::Path, sync::Arc};

use tokio::sync::Semaphore;
use tracing_subscriber::EnvFilter;

use cinerec_api::{
    config::Config,
    routes::{create_router, AppState},
    scrape::{
        page::LetterboxdClient,
        user::{PagingPolicy, UserScraper},
    },
    services::{corpus, model::SvdTrainer, poster::TmdbClient, recommender::Recommender},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let records = corpus::load(Path::new(&config.corpus_path))?;

    let letterboxd = Arc::new(LetterboxdClient::new(config.letterboxd_url.clone())?);
    let gate = Arc::new(Semaphore::new(config.scrape_concurrency));
    let scraper = UserScraper::new(
        letterboxd,
        gate,
        config.max_pages,
        PagingPolicy::FixedWindow,
    );

    let recommender = Recommender::new(
        records,
        scraper,
        Arc::new(SvdTrainer::default()),
        Arc::new(TmdbClient::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
        )),
        config.top_n,
    );

    let app = create_router(AppState::new(recommender));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
