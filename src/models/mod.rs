// src/models/mod.rs

pub mod admin_action;
pub mod answer;
pub mod comment;
pub mod doubt;
pub mod junior_space_post;
pub mod mentor_profile;
pub mod upvote;
pub mod user;

use serde::Deserialize;

/// Shared page/limit query parameters for list endpoints.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Returns (page, limit, offset) with the limit clamped to 100.
    pub fn resolve(&self, default_limit: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, 100);
        (page, limit, (page - 1) * limit)
    }

    /// Builds the pagination metadata block attached to list responses.
    pub fn meta(total: i64, page: i64, limit: i64) -> serde_json::Value {
        serde_json::json!({
            "total": total,
            "page": page,
            "limit": limit,
            "pages": (total + limit - 1) / limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination {
            page: None,
            limit: None,
        };
        assert_eq!(p.resolve(10), (1, 10, 0));

        let p = Pagination {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(p.resolve(10), (3, 100, 200));

        let p = Pagination {
            page: Some(0),
            limit: Some(20),
        };
        assert_eq!(p.resolve(10), (1, 20, 0));
    }

    #[test]
    fn meta_rounds_page_count_up() {
        let meta = Pagination::meta(21, 1, 10);
        assert_eq!(meta["pages"], 3);
    }
}
