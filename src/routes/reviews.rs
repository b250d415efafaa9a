use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::agents::{AnalysisResult, GroqClient};
use crate::db::{self, NewReview, SubmissionStatus};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    rating: Option<i32>,
    review: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    id: i64,
    ai_response: String,
    created_at: DateTime<Utc>,
}

/// POST /api/v1/reviews. Single synchronous attempt, no retry of the AI
/// call. AI failures are absorbed into a FAILED row with the fallback text;
/// only a persistence failure is fatal to this request.
pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let Json(request) = payload
        .map_err(|_| ApiError::Validation("Invalid JSON format in request body".to_string()))?;

    let (rating, review_text) = validate_request(request)?;

    info!("Processing review submission with rating: {}", rating);

    let client = GroqClient::new(
        state.config.groq_api_key.clone(),
        state.config.groq_api_url.clone(),
    );
    let analysis = client.analyze(rating, &review_text).await;

    let review = build_submission(rating, review_text, analysis);
    let saved = db::insert_review(state.pool.as_ref(), &review).await?;

    info!(
        "Review submission saved with id: {}, status: {}",
        saved.id,
        saved.status.as_str()
    );

    // Summary, actions and diagnostics stay admin-only.
    Ok(Json(ReviewResponse {
        id: saved.id,
        ai_response: saved.ai_user_response,
        created_at: saved.created_at,
    }))
}

fn validate_request(request: ReviewRequest) -> Result<(i32, String), ApiError> {
    let rating = request
        .rating
        .ok_or_else(|| ApiError::Validation("Rating is required".to_string()))?;
    if !(1..=5).contains(&rating) {
        return Err(ApiError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let review = request.review.unwrap_or_default();
    if review.trim().is_empty() {
        return Err(ApiError::Validation("Review text is required".to_string()));
    }

    Ok((rating, review))
}

fn build_submission(rating: i32, review_text: String, analysis: AnalysisResult) -> NewReview {
    if analysis.success {
        NewReview {
            rating,
            review_text,
            ai_user_response: analysis.user_response,
            ai_summary: analysis.summary,
            ai_recommended_actions: serialize_actions(&analysis.actions),
            status: SubmissionStatus::Success,
            error_message: None,
        }
    } else {
        NewReview {
            rating,
            review_text,
            ai_user_response: analysis.user_response,
            ai_summary: None,
            ai_recommended_actions: None,
            status: SubmissionStatus::Failed,
            error_message: analysis.error_message,
        }
    }
}

pub(crate) fn serialize_actions(actions: &[String]) -> Option<String> {
    if actions.is_empty() {
        return None;
    }
    match serde_json::to_string(actions) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("Failed to serialize actions: {}", e);
            None
        }
    }
}
