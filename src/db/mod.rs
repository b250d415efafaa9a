mod models;

pub use models::*;

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

pub type DbPool = Arc<PgPool>;

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Appends exactly one row; there is no update path by design.
pub async fn insert_review(
    pool: &PgPool,
    review: &NewReview,
) -> Result<ReviewSubmission, sqlx::Error> {
    sqlx::query_as::<_, ReviewSubmission>(
        r#"
        INSERT INTO review_submissions
            (rating, review_text, ai_user_response, ai_summary, ai_recommended_actions, status, error_message)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(review.rating)
    .bind(&review.review_text)
    .bind(&review.ai_user_response)
    .bind(&review.ai_summary)
    .bind(&review.ai_recommended_actions)
    .bind(review.status)
    .bind(&review.error_message)
    .fetch_one(pool)
    .await
}

fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a ReviewFilter) {
    let mut prefix = " WHERE ";
    if let Some(rating) = filter.rating {
        builder.push(prefix).push("rating = ").push_bind(rating);
        prefix = " AND ";
    }
    if let Some(search) = &filter.search {
        builder
            .push(prefix)
            .push("review_text LIKE ")
            .push_bind(format!("%{}%", search));
    }
}

pub async fn list_reviews(
    pool: &PgPool,
    filter: &ReviewFilter,
    page_size: i64,
    page_number: i64,
) -> Result<Vec<ReviewSubmission>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM review_submissions");
    push_filter(&mut builder, filter);
    builder
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page_size)
        .push(" OFFSET ")
        .push_bind(page_number * page_size);

    builder
        .build_query_as::<ReviewSubmission>()
        .fetch_all(pool)
        .await
}

pub async fn count_reviews(pool: &PgPool, filter: &ReviewFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM review_submissions");
    push_filter(&mut builder, filter);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Grouped counts; only ratings actually present in the table appear.
pub async fn count_by_rating(pool: &PgPool) -> Result<Vec<(i32, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (i32, i64)>(
        "SELECT rating, COUNT(*) FROM review_submissions GROUP BY rating ORDER BY rating",
    )
    .fetch_all(pool)
    .await
}
