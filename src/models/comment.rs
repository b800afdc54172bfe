// src/models/comment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub doubt_id: i64,
    pub user_id: i64,
    pub content: String,
    /// Set on replies; replies to replies are rejected, keeping the tree two
    /// levels deep by construction.
    pub parent_comment_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1 to 2000 characters."))]
    pub content: String,

    /// Optional: the ID of the top-level comment being replied to.
    pub parent_comment_id: Option<i64>,
}

/// DTO for updating a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// DTO for displaying a comment with author info.
#[derive(Debug, Serialize, FromRow)]
pub struct CommentResponse {
    pub id: i64,
    pub doubt_id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub parent_comment_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A top-level comment with its direct replies attached.
#[derive(Debug, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub replies: Vec<CommentResponse>,
}
