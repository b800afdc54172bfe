// src/models/junior_space_post.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'junior_space_posts' table: lightweight social posts,
/// distinct from doubts.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JuniorSpacePost {
    pub id: i64,
    pub junior_id: i64,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a junior space post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJuniorPostRequest {
    #[validate(length(min = 1, max = 3000, message = "Post must be 1 to 3000 characters."))]
    pub content: String,
}

/// DTO for updating a junior space post.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJuniorPostRequest {
    #[validate(length(min = 1, max = 3000))]
    pub content: String,
}
