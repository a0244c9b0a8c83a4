use std::{
    cmp::Ordering,
    collections::HashSet,
    sync::Arc,
};

use futures::future::join_all;

use crate::{
    error::{AppError, AppResult},
    models::{RatingRecord, Recommendation},
    scrape::user::UserScraper,
    services::{model::ModelTrainer, poster::PosterSource},
};

/// Request-time orchestration: scrape the user, merge with the bulk corpus,
/// train, rank unseen films, attach posters.
pub struct Recommender {
    corpus: Vec<RatingRecord>,
    /// Unique corpus slugs in first-seen order; the candidate pool
    corpus_slugs: Vec<String>,
    scraper: UserScraper,
    trainer: Arc<dyn ModelTrainer>,
    posters: Arc<dyn PosterSource>,
    top_n: usize,
}

impl Recommender {
    pub fn new(
        corpus: Vec<RatingRecord>,
        scraper: UserScraper,
        trainer: Arc<dyn ModelTrainer>,
        posters: Arc<dyn PosterSource>,
        top_n: usize,
    ) -> Self {
        // Corpus files may carry 0.0 sentinel rows; they must never reach
        // training, and a sentinel-only film is not a usable candidate
        let corpus: Vec<RatingRecord> = corpus
            .into_iter()
            .filter(|record| record.rating > 0.0)
            .collect();

        let mut seen = HashSet::new();
        let corpus_slugs = corpus
            .iter()
            .filter(|record| seen.insert(record.movie_slug.clone()))
            .map(|record| record.movie_slug.clone())
            .collect();

        Self {
            corpus,
            corpus_slugs,
            scraper,
            trainer,
            posters,
            top_n,
        }
    }

    /// Builds the top-N recommendations for one username.
    ///
    /// A user with no usable ratings or no watched films surfaces as a typed
    /// 404-class error; everything below the aggregation boundary has
    /// already been absorbed into empty results.
    pub async fn recommend(&self, username: &str) -> AppResult<Vec<Recommendation>> {
        let user_ratings: Vec<RatingRecord> = self
            .scraper
            .scrape_ratings(username)
            .await
            .into_iter()
            // 0.0 is the parser's "no usable rating" sentinel, not a score
            .filter(|record| record.rating > 0.0)
            .collect();
        if user_ratings.is_empty() {
            return Err(AppError::NoRatings);
        }

        let watched: HashSet<String> = self
            .scraper
            .scrape_watched(username)
            .await
            .into_iter()
            .collect();
        if watched.is_empty() {
            return Err(AppError::NoWatched);
        }

        let mut combined = self.corpus.clone();
        combined.extend(user_ratings);

        let trainer = Arc::clone(&self.trainer);
        let model = tokio::task::spawn_blocking(move || trainer.train(&combined))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let mut scored: Vec<(String, f32)> = self
            .corpus_slugs
            .iter()
            .filter(|slug| !watched.contains(*slug))
            .map(|slug| (slug.clone(), model.predict(username, slug)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(self.top_n);

        let fetches = scored.into_iter().map(|(slug, rating)| {
            let posters = Arc::clone(&self.posters);
            async move {
                let poster_url = posters.poster_url(&slug).await;
                Recommendation {
                    slug,
                    poster_url,
                    rating,
                }
            }
        });
        let recommendations = join_all(fetches).await;

        tracing::info!(
            username = %username,
            count = recommendations.len(),
            "Recommendations generated"
        );
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageFetch;
    use crate::scrape::page::FilmPageSource;
    use crate::scrape::user::PagingPolicy;
    use crate::services::model::{MockModelTrainer, MockRatingModel};
    use crate::services::poster::MockPosterSource;
    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    struct FixtureSource {
        ratings: Vec<RatingRecord>,
        watched: Vec<String>,
    }

    #[async_trait]
    impl FilmPageSource for FixtureSource {
        async fn fetch_ratings_page(&self, _username: &str, page: u32) -> PageFetch<RatingRecord> {
            if page == 1 && !self.ratings.is_empty() {
                PageFetch::Records(self.ratings.clone())
            } else {
                PageFetch::Empty
            }
        }

        async fn fetch_watched_page(&self, _username: &str, page: u32) -> PageFetch<String> {
            if page == 1 && !self.watched.is_empty() {
                PageFetch::Records(self.watched.clone())
            } else {
                PageFetch::Empty
            }
        }
    }

    fn record(username: &str, slug: &str, rating: f32) -> RatingRecord {
        RatingRecord {
            username: username.to_string(),
            movie_slug: slug.to_string(),
            rating,
        }
    }

    fn corpus() -> Vec<RatingRecord> {
        vec![
            record("bob", "film-one", 4.0),
            record("bob", "film-two", 3.0),
            record("carol", "film-three", 5.0),
            record("carol", "film-one", 2.0), // duplicate slug, dedup in pool only
        ]
    }

    fn scraper(source: FixtureSource) -> UserScraper {
        UserScraper::new(
            Arc::new(source),
            Arc::new(Semaphore::new(5)),
            10,
            PagingPolicy::FixedWindow,
        )
    }

    fn scoring_trainer() -> MockModelTrainer {
        let mut trainer = MockModelTrainer::new();
        trainer.expect_train().returning(|_| {
            let mut model = MockRatingModel::new();
            model
                .expect_predict()
                .returning(|_, slug| match slug {
                    "film-two" => 4.5,
                    "film-three" => 2.0,
                    _ => 1.0,
                });
            Box::new(model)
        });
        trainer
    }

    fn poster_stub() -> MockPosterSource {
        let mut posters = MockPosterSource::new();
        posters
            .expect_poster_url()
            .returning(|slug| Some(format!("https://posters.test/{slug}.jpg")));
        posters
    }

    #[tokio::test]
    async fn test_recommendations_exclude_watched_and_rank_by_estimate() {
        let source = FixtureSource {
            ratings: vec![record("alice", "film-one", 5.0)],
            watched: vec!["film-one".to_string()],
        };
        let recommender = Recommender::new(
            corpus(),
            scraper(source),
            Arc::new(scoring_trainer()),
            Arc::new(poster_stub()),
            5,
        );

        let recommendations = recommender.recommend("alice").await.unwrap();

        let slugs: Vec<&str> = recommendations.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["film-two", "film-three"]);
        assert_eq!(recommendations[0].rating, 4.5);
        assert_eq!(
            recommendations[0].poster_url.as_deref(),
            Some("https://posters.test/film-two.jpg")
        );
    }

    #[tokio::test]
    async fn test_top_n_truncates_the_ranked_list() {
        let source = FixtureSource {
            ratings: vec![record("alice", "film-one", 5.0)],
            watched: vec!["film-one".to_string()],
        };
        let recommender = Recommender::new(
            corpus(),
            scraper(source),
            Arc::new(scoring_trainer()),
            Arc::new(poster_stub()),
            1,
        );

        let recommendations = recommender.recommend("alice").await.unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].slug, "film-two");
    }

    #[tokio::test]
    async fn test_sentinel_corpus_rows_never_reach_training() {
        let source = FixtureSource {
            ratings: vec![record("alice", "film-one", 5.0)],
            watched: vec!["film-one".to_string()],
        };
        let mut seeded = corpus();
        seeded.push(record("bob", "junk-glyph-film", 0.0));

        let mut trainer = MockModelTrainer::new();
        trainer
            .expect_train()
            .withf(|ratings| ratings.iter().all(|r| r.rating > 0.0))
            .returning(|_| {
                let mut model = MockRatingModel::new();
                model.expect_predict().returning(|_, _| 3.0);
                Box::new(model)
            });

        let recommender = Recommender::new(
            seeded,
            scraper(source),
            Arc::new(trainer),
            Arc::new(poster_stub()),
            5,
        );

        let recommendations = recommender.recommend("alice").await.unwrap();
        // A sentinel-only film is not a candidate either
        assert!(recommendations.iter().all(|r| r.slug != "junk-glyph-film"));
    }

    #[tokio::test]
    async fn test_no_ratings_surfaces_typed_error() {
        let source = FixtureSource {
            ratings: vec![],
            watched: vec!["film-one".to_string()],
        };
        let recommender = Recommender::new(
            corpus(),
            scraper(source),
            Arc::new(MockModelTrainer::new()),
            Arc::new(MockPosterSource::new()),
            5,
        );

        let result = recommender.recommend("ghost").await;
        assert!(matches!(result, Err(AppError::NoRatings)));
    }

    #[tokio::test]
    async fn test_sentinel_only_ratings_count_as_no_ratings() {
        let source = FixtureSource {
            ratings: vec![record("alice", "junk-glyphs", 0.0)],
            watched: vec!["film-one".to_string()],
        };
        let recommender = Recommender::new(
            corpus(),
            scraper(source),
            Arc::new(MockModelTrainer::new()),
            Arc::new(MockPosterSource::new()),
            5,
        );

        let result = recommender.recommend("alice").await;
        assert!(matches!(result, Err(AppError::NoRatings)));
    }

    #[tokio::test]
    async fn test_no_watched_films_surfaces_typed_error() {
        let source = FixtureSource {
            ratings: vec![record("alice", "film-one", 5.0)],
            watched: vec![],
        };
        let recommender = Recommender::new(
            corpus(),
            scraper(source),
            Arc::new(MockModelTrainer::new()),
            Arc::new(MockPosterSource::new()),
            5,
        );

        let result = recommender.recommend("alice").await;
        assert!(matches!(result, Err(AppError::NoWatched)));
    }
}
