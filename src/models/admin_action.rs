// src/models/admin_action.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The closed set of auditable moderation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    ApproveMentor,
    RejectMentor,
    DeleteDoubt,
    DeleteAnswer,
    DeleteComment,
    DeleteJuniorPost,
    BanUser,
    UnbanUser,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::ApproveMentor => "approve_mentor",
            ActionType::RejectMentor => "reject_mentor",
            ActionType::DeleteDoubt => "delete_doubt",
            ActionType::DeleteAnswer => "delete_answer",
            ActionType::DeleteComment => "delete_comment",
            ActionType::DeleteJuniorPost => "delete_junior_post",
            ActionType::BanUser => "ban_user",
            ActionType::UnbanUser => "unban_user",
        }
    }

    pub fn parse(s: &str) -> Option<ActionType> {
        match s {
            "approve_mentor" => Some(ActionType::ApproveMentor),
            "reject_mentor" => Some(ActionType::RejectMentor),
            "delete_doubt" => Some(ActionType::DeleteDoubt),
            "delete_answer" => Some(ActionType::DeleteAnswer),
            "delete_comment" => Some(ActionType::DeleteComment),
            "delete_junior_post" => Some(ActionType::DeleteJuniorPost),
            "ban_user" => Some(ActionType::BanUser),
            "unban_user" => Some(ActionType::UnbanUser),
            _ => None,
        }
    }
}

/// Represents the 'admin_actions' table: the append-only audit ledger.
/// Rows are inserted once per completed moderation action and never touched
/// again.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdminAction {
    pub id: i64,
    pub admin_id: i64,
    pub action_type: String,
    pub target_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Query parameters for listing one's own actions.
#[derive(Debug, serde::Deserialize)]
pub struct ActionListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub action_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_round_trips() {
        for a in [
            ActionType::ApproveMentor,
            ActionType::RejectMentor,
            ActionType::DeleteDoubt,
            ActionType::DeleteAnswer,
            ActionType::DeleteComment,
            ActionType::DeleteJuniorPost,
            ActionType::BanUser,
            ActionType::UnbanUser,
        ] {
            assert_eq!(ActionType::parse(a.as_str()), Some(a));
        }
        assert_eq!(ActionType::parse("shadow_ban"), None);
    }
}
