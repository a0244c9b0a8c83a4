use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{error::AppResult, models::Recommendation, routes::AppState};

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
}

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendResponse>> {
    tracing::info!(username = %request.username, "Recommendation request received");

    let recommendations = state.recommender.recommend(&request.username).await?;
    Ok(Json(RecommendResponse { recommendations }))
}
