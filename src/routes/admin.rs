use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::db::{self, ReviewFilter, ReviewSubmission};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    rating: Option<i32>,
    limit: Option<i64>,
    offset: Option<i64>,
    search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReviewItem {
    id: i64,
    rating: i32,
    review: String,
    ai_summary: Option<String>,
    ai_actions: Vec<String>,
    status: String,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponse {
    items: Vec<AdminReviewItem>,
    total: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    total: i64,
    count_by_rating: BTreeMap<String, i64>,
}

/// GET /api/v1/admin/reviews: filtered, newest-first, paginated.
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ReviewListResponse>, ApiError> {
    let Query(params) =
        params.map_err(|_| ApiError::Validation("Invalid query parameters".to_string()))?;

    info!(
        "Admin fetching reviews - rating: {:?}, limit: {:?}, offset: {:?}, search: {:?}",
        params.rating, params.limit, params.offset, params.search
    );

    let (page_size, page_number) = page_geometry(params.limit, params.offset);
    let filter = ReviewFilter::new(params.rating, params.search);

    let rows = db::list_reviews(state.pool.as_ref(), &filter, page_size, page_number).await?;
    let total = db::count_reviews(state.pool.as_ref(), &filter).await?;

    Ok(Json(ReviewListResponse {
        items: rows.into_iter().map(to_admin_item).collect(),
        total,
    }))
}

/// GET /api/v1/admin/analytics: total plus a dense 1..5 rating histogram.
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    info!("Admin fetching analytics");

    let total = db::count_reviews(state.pool.as_ref(), &ReviewFilter::default()).await?;
    let grouped = db::count_by_rating(state.pool.as_ref()).await?;

    Ok(Json(AnalyticsResponse {
        total,
        count_by_rating: dense_histogram(&grouped),
    }))
}

// Page-numbered pagination: offsets that are not multiples of the page size
// round down to the nearest page boundary.
fn page_geometry(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let page_size = match limit {
        Some(l) if l > 0 => l.min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    };
    let page_number = match offset {
        Some(o) if o >= 0 => o / page_size,
        _ => 0,
    };
    (page_size, page_number)
}

// Every key "1".."5" is present regardless of data sparsity; grouped counts
// overwrite the zero defaults.
fn dense_histogram(grouped: &[(i32, i64)]) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> = (1..=5).map(|r| (r.to_string(), 0)).collect();
    for (rating, count) in grouped {
        counts.insert(rating.to_string(), *count);
    }
    counts
}

fn to_admin_item(row: ReviewSubmission) -> AdminReviewItem {
    AdminReviewItem {
        id: row.id,
        rating: row.rating,
        review: row.review_text,
        ai_summary: row.ai_summary,
        ai_actions: deserialize_actions(row.ai_recommended_actions.as_deref()),
        status: row.status.as_str().to_string(),
        error_message: row.error_message,
        created_at: row.created_at,
    }
}

// Stored actions are JSON array text; anything unreadable becomes an empty
// list rather than failing the whole listing.
fn deserialize_actions(raw: Option<&str>) -> Vec<String> {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return Vec::new(),
    };
    match serde_json::from_str(raw) {
        Ok(actions) => actions,
        Err(e) => {
            error!("Failed to deserialize actions: {}", e);
            Vec::new()
        }
    }
}
