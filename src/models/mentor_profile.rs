// src/models/mentor_profile.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use validator::Validate;

/// Represents the 'mentor_profiles' table: supplemental mentor metadata,
/// 1:1 with a mentor user. Created on the mentor's own request, not at
/// registration.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MentorProfile {
    pub id: i64,
    pub user_id: i64,
    pub badge: String,
    pub expertise_tags: Json<Vec<String>>,

    /// Cached aggregate of upvotes across the mentor's answers.
    pub total_upvotes: i32,

    /// Moves together with users.is_mentor_approved under the approval
    /// workflow (both updated in one transaction).
    pub approved_by_admin: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a mentor profile.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMentorProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub badge: Option<String>,
    pub expertise_tags: Vec<String>,
}

/// DTO for updating a mentor profile. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMentorProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub badge: Option<String>,
    pub expertise_tags: Option<Vec<String>>,
}
