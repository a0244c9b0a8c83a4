use std::collections::HashMap;

use rand::Rng;

use crate::models::RatingRecord;

#[cfg(test)]
use mockall::automock;

/// A fitted latent-factor model queried one (user, item) pair at a time.
#[cfg_attr(test, automock)]
pub trait RatingModel: Send + Sync {
    /// Estimated rating of `movie_slug` for `username`, clamped to the
    /// model's rating bounds.
    fn predict(&self, username: &str, movie_slug: &str) -> f32;
}

/// Fits a rating model from a combined ratings table.
///
/// The narrow boundary the recommendation path consumes: train once per
/// request, then predict per candidate. Internals of the factorization are
/// not part of the contract.
#[cfg_attr(test, automock)]
pub trait ModelTrainer: Send + Sync {
    fn train(&self, ratings: &[RatingRecord]) -> Box<dyn RatingModel>;
}

/// Hyperparameters for [`SvdTrainer`].
#[derive(Debug, Clone)]
pub struct SvdParams {
    pub factors: usize,
    pub epochs: usize,
    pub learning_rate: f32,
    pub regularization: f32,
    /// Rating scale bounds fixed at construction; predictions are clamped
    pub rating_bounds: (f32, f32),
}

impl Default for SvdParams {
    fn default() -> Self {
        Self {
            factors: 100,
            epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
            rating_bounds: (1.0, 5.0),
        }
    }
}

/// Biased matrix factorization trained by stochastic gradient descent.
#[derive(Debug, Clone, Default)]
pub struct SvdTrainer {
    params: SvdParams,
}

impl SvdTrainer {
    pub fn new(params: SvdParams) -> Self {
        Self { params }
    }
}

impl ModelTrainer for SvdTrainer {
    fn train(&self, ratings: &[RatingRecord]) -> Box<dyn RatingModel> {
        Box::new(SvdModel::fit(ratings, &self.params))
    }
}

/// A fitted factorization: per-user and per-item biases plus latent factors.
pub struct SvdModel {
    users: HashMap<String, usize>,
    items: HashMap<String, usize>,
    user_factors: Vec<f32>,
    item_factors: Vec<f32>,
    user_bias: Vec<f32>,
    item_bias: Vec<f32>,
    global_mean: f32,
    factors: usize,
    bounds: (f32, f32),
}

impl SvdModel {
    fn fit(ratings: &[RatingRecord], params: &SvdParams) -> Self {
        let mut users: HashMap<String, usize> = HashMap::new();
        let mut items: HashMap<String, usize> = HashMap::new();
        let mut samples = Vec::with_capacity(ratings.len());

        for record in ratings {
            let next_user = users.len();
            let u = *users.entry(record.username.clone()).or_insert(next_user);
            let next_item = items.len();
            let i = *items.entry(record.movie_slug.clone()).or_insert(next_item);
            samples.push((u, i, record.rating));
        }

        let (lo, hi) = params.rating_bounds;
        let global_mean = if samples.is_empty() {
            (lo + hi) / 2.0
        } else {
            samples.iter().map(|&(_, _, r)| r).sum::<f32>() / samples.len() as f32
        };

        let f = params.factors;
        let mut rng = rand::thread_rng();
        let mut user_factors: Vec<f32> = (0..users.len() * f)
            .map(|_| rng.gen_range(0.0..0.1))
            .collect();
        let mut item_factors: Vec<f32> = (0..items.len() * f)
            .map(|_| rng.gen_range(0.0..0.1))
            .collect();
        let mut user_bias = vec![0.0f32; users.len()];
        let mut item_bias = vec![0.0f32; items.len()];

        let lr = params.learning_rate;
        let reg = params.regularization;
        for _ in 0..params.epochs {
            for &(u, i, r) in &samples {
                let dot: f32 = user_factors[u * f..(u + 1) * f]
                    .iter()
                    .zip(&item_factors[i * f..(i + 1) * f])
                    .map(|(pu, qi)| pu * qi)
                    .sum();
                let err = r - (global_mean + user_bias[u] + item_bias[i] + dot);

                user_bias[u] += lr * (err - reg * user_bias[u]);
                item_bias[i] += lr * (err - reg * item_bias[i]);
                for k in 0..f {
                    let puk = user_factors[u * f + k];
                    let qik = item_factors[i * f + k];
                    user_factors[u * f + k] += lr * (err * qik - reg * puk);
                    item_factors[i * f + k] += lr * (err * puk - reg * qik);
                }
            }
        }

        tracing::debug!(
            users = users.len(),
            items = items.len(),
            samples = samples.len(),
            "Trained rating model"
        );

        Self {
            users,
            items,
            user_factors,
            item_factors,
            user_bias,
            item_bias,
            global_mean,
            factors: f,
            bounds: params.rating_bounds,
        }
    }
}

impl RatingModel for SvdModel {
    fn predict(&self, username: &str, movie_slug: &str) -> f32 {
        let u = self.users.get(username).copied();
        let i = self.items.get(movie_slug).copied();

        let mut estimate = self.global_mean;
        if let Some(u) = u {
            estimate += self.user_bias[u];
        }
        if let Some(i) = i {
            estimate += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (u, i) {
            let f = self.factors;
            estimate += self.user_factors[u * f..(u + 1) * f]
                .iter()
                .zip(&self.item_factors[i * f..(i + 1) * f])
                .map(|(pu, qi)| pu * qi)
                .sum::<f32>();
        }

        estimate.clamp(self.bounds.0, self.bounds.1)
    }
}
