pub mod admin;
pub mod reviews;

use crate::error::ApiError;

pub async fn not_found() -> ApiError {
    ApiError::NotFound("The requested resource was not found".to_string())
}
