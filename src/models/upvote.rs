// src/models/upvote.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'upvotes' table: one row per (user, answer) pair, enforced
/// by a unique index. The index is the sole concurrency guard; the loser of a
/// double-upvote race surfaces ALREADY_UPVOTED.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Upvote {
    pub id: i64,
    pub user_id: i64,
    pub answer_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
