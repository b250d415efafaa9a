use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error surface of the API. Every variant renders as the
/// `{"error": {"code", "message"}}` envelope.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Unauthorized(String),
    // Part of the public error contract; AI failures are normally absorbed
    // by the submission pipeline, so nothing constructs this today.
    #[allow(dead_code)]
    Llm(String),
    NotFound(String),
    Internal,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Llm(_) => "LLM_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Llm(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(m)
            | ApiError::Unauthorized(m)
            | ApiError::Llm(m)
            | ApiError::NotFound(m) => m.clone(),
            ApiError::Internal => "An unexpected error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.message(),
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

// Persistence failures return a generic response; full detail stays in the log.
impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", e);
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let err = ApiError::Validation("Rating must be between 1 and 5".to_string());
        let body = ErrorBody {
            error: ErrorDetail {
                code: err.code(),
                message: err.message(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": {
                    "code": "VALIDATION_ERROR",
                    "message": "Rating must be between 1 and 5"
                }
            })
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::Validation(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized(String::new()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound(String::new()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Llm(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_error_leaks_no_detail() {
        assert_eq!(ApiError::Internal.message(), "An unexpected error occurred");
    }
}
