use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Could not scrape user data or user has no ratings.")]
    NoRatings,

    #[error("Could not scrape watched movies or user has no watched movies.")]
    NoWatched,

    #[error("Member source exhausted: found {found} of {target} requested usernames")]
    SourceExhausted { found: usize, target: usize },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Corpus file error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NoRatings | AppError::NoWatched => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::SourceExhausted { .. }
            | AppError::HttpClient(_)
            | AppError::ExternalApi(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Csv(_) | AppError::Io(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
