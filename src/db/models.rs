use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "UPPERCASE")]
pub enum SubmissionStatus {
    Success,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Success => "SUCCESS",
            SubmissionStatus::Failed => "FAILED",
        }
    }
}

/// One persisted review plus its AI analysis outcome. Immutable once created.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewSubmission {
    pub id: i64,
    pub rating: i32,
    pub review_text: String,
    pub ai_user_response: String,
    pub ai_summary: Option<String>,
    pub ai_recommended_actions: Option<String>,
    pub status: SubmissionStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; id and created_at are assigned by the database.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub rating: i32,
    pub review_text: String,
    pub ai_user_response: String,
    pub ai_summary: Option<String>,
    pub ai_recommended_actions: Option<String>,
    pub status: SubmissionStatus,
    pub error_message: Option<String>,
}

/// Admin list filter. Both fields set means rating AND substring match.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub rating: Option<i32>,
    pub search: Option<String>,
}

impl ReviewFilter {
    pub fn new(rating: Option<i32>, search: Option<String>) -> Self {
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self { rating, search }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_renders_as_wire_string() {
        assert_eq!(SubmissionStatus::Success.as_str(), "SUCCESS");
        assert_eq!(SubmissionStatus::Failed.as_str(), "FAILED");
    }

    #[test]
    fn filter_drops_blank_search() {
        let filter = ReviewFilter::new(Some(3), Some("   ".to_string()));
        assert_eq!(filter.rating, Some(3));
        assert!(filter.search.is_none());
    }

    #[test]
    fn filter_trims_search() {
        let filter = ReviewFilter::new(None, Some("  great  ".to_string()));
        assert_eq!(filter.search.as_deref(), Some("great"));
    }
}
