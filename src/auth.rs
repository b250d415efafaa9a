use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "X-ADMIN-TOKEN";

/// Gate on every admin route. CORS pre-flight passes through untouched;
/// everything else needs the shared secret header.
pub async fn require_admin_token(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    match check_token(provided, &state.config.admin_token) {
        Ok(()) => next.run(req).await,
        Err(e) => {
            warn!("Admin token rejected for request to: {}", req.uri().path());
            e.into_response()
        }
    }
}

fn check_token(provided: &str, expected: &str) -> Result<(), ApiError> {
    if provided.trim().is_empty() {
        return Err(ApiError::Unauthorized("Admin token is required".to_string()));
    }
    if provided != expected {
        return Err(ApiError::Unauthorized("Invalid admin token".to_string()));
    }
    Ok(())
}
