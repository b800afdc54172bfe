// src/models/doubt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use validator::Validate;

/// Lifecycle of a doubt. The open -> answered transition is triggered by the
/// first answer only; resolved/closed are set by the owner (or an admin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubtStatus {
    Open,
    Answered,
    Resolved,
    Closed,
}

impl DoubtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoubtStatus::Open => "open",
            DoubtStatus::Answered => "answered",
            DoubtStatus::Resolved => "resolved",
            DoubtStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<DoubtStatus> {
        match s {
            "open" => Some(DoubtStatus::Open),
            "answered" => Some(DoubtStatus::Answered),
            "resolved" => Some(DoubtStatus::Resolved),
            "closed" => Some(DoubtStatus::Closed),
            _ => None,
        }
    }
}

/// Represents the 'doubts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Doubt {
    pub id: i64,
    pub junior_id: i64,
    pub title: String,
    pub description: String,
    pub tags: Json<Vec<String>>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for posting a new doubt.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDoubtRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters."))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description must be 1 to 5000 characters."))]
    pub description: String,

    pub tags: Vec<String>,
}

/// DTO for updating a doubt. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDoubtRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
}

/// Query parameters for listing doubts.
#[derive(Debug, Deserialize)]
pub struct DoubtListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in [
            DoubtStatus::Open,
            DoubtStatus::Answered,
            DoubtStatus::Resolved,
            DoubtStatus::Closed,
        ] {
            assert_eq!(DoubtStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(DoubtStatus::parse("reopened"), None);
    }
}
