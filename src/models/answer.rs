// src/models/answer.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'answers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub doubt_id: i64,
    pub mentor_id: i64,
    pub content: String,

    /// Cached aggregate of the upvote ledger; the ledger is the source of
    /// truth (see the admin reconcile operation).
    pub upvote_count: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for posting an answer.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAnswerRequest {
    #[validate(length(
        min = 20,
        max = 10000,
        message = "Answer must be at least 20 characters."
    ))]
    pub content: String,
}

/// DTO for updating an answer.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAnswerRequest {
    #[validate(length(min = 20, max = 10000))]
    pub content: String,
}

/// Query parameters for listing answers under a doubt.
#[derive(Debug, Deserialize)]
pub struct AnswerListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// 'upvotes' (default) or 'recent'.
    pub sort_by: Option<String>,
}
