// src/policy.rs

//! Pure authorization rules shared by every handler.
//!
//! Decisions are made from the actor's identity alone plus the target's
//! ownership; no database access happens here. Precedence:
//! 1. Admins may do anything.
//! 2. Owned content may be mutated only by its owner.
//! 3. Answers may be posted only by approved mentors.
//! 4. Moderation operations require the admin role.

use crate::error::AppError;

/// Closed set of user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Junior,
    Mentor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Junior => "junior",
            Role::Mentor => "mentor",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "junior" => Some(Role::Junior),
            "mentor" => Some(Role::Mentor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The authenticated caller, as established by the JWT middleware plus a
/// user lookup where the approval flag matters.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
    pub is_mentor_approved: bool,
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Authenticated but not the owner of the target.
    NotOwner,
    /// Wrong role for the operation.
    WrongRole,
    /// Mentor account exists but has not been approved by an admin.
    MentorNotApproved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Rule 2: update/delete of an owned content entity (doubt, answer, comment,
/// junior post, mentor profile). Admins pass unconditionally.
pub fn can_modify_owned(actor: &Actor, owner_id: i64) -> Decision {
    match actor.role {
        Role::Admin => Decision::Allow,
        Role::Junior | Role::Mentor => {
            if actor.id == owner_id {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotOwner)
            }
        }
    }
}

/// Rule 3: posting an answer. Answers are additive, not owned-content
/// mutation, so ownership never enters into it.
pub fn can_post_answer(actor: &Actor) -> Decision {
    match actor.role {
        Role::Admin => Decision::Allow,
        Role::Mentor => {
            if actor.is_mentor_approved {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::MentorNotApproved)
            }
        }
        Role::Junior => Decision::Deny(DenyReason::WrongRole),
    }
}

/// Rule 4: admin-only operations (approve/reject mentor, ban/unban,
/// delete-any-content, audit log access).
pub fn can_moderate(actor: &Actor) -> Decision {
    match actor.role {
        Role::Admin => Decision::Allow,
        Role::Junior | Role::Mentor => Decision::Deny(DenyReason::WrongRole),
    }
}

/// Maps a denial to the boundary error with its stable code.
pub fn deny_to_error(reason: DenyReason, what: &str) -> AppError {
    match reason {
        DenyReason::NotOwner => AppError::Forbidden(
            "FORBIDDEN",
            format!("Not authorized to modify this {}", what),
        ),
        DenyReason::WrongRole => AppError::Forbidden(
            "UNAUTHORIZED",
            format!("Your role does not permit this operation on {}", what),
        ),
        DenyReason::MentorNotApproved => AppError::Forbidden(
            "NOT_APPROVED",
            "Your mentor account is not approved yet".to_string(),
        ),
    }
}

/// Convenience: turns a `Decision` into `Result` for use with `?`.
pub fn require(decision: Decision, what: &str) -> Result<(), AppError> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(deny_to_error(reason, what)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: i64, role: Role, approved: bool) -> Actor {
        Actor {
            id,
            role,
            is_mentor_approved: approved,
        }
    }

    #[test]
    fn admin_always_allowed() {
        let admin = actor(1, Role::Admin, true);
        assert_eq!(can_modify_owned(&admin, 999), Decision::Allow);
        assert_eq!(can_post_answer(&admin), Decision::Allow);
        assert_eq!(can_moderate(&admin), Decision::Allow);
    }

    #[test]
    fn owner_can_modify_own_content() {
        let junior = actor(7, Role::Junior, true);
        assert_eq!(can_modify_owned(&junior, 7), Decision::Allow);
    }

    #[test]
    fn non_owner_is_forbidden() {
        let junior = actor(7, Role::Junior, true);
        let mentor = actor(8, Role::Mentor, true);
        assert_eq!(
            can_modify_owned(&junior, 8),
            Decision::Deny(DenyReason::NotOwner)
        );
        // Mentors get no resource-level allowance on others' content either.
        assert_eq!(
            can_modify_owned(&mentor, 7),
            Decision::Deny(DenyReason::NotOwner)
        );
    }

    #[test]
    fn only_approved_mentors_answer() {
        let approved = actor(2, Role::Mentor, true);
        let unapproved = actor(3, Role::Mentor, false);
        let junior = actor(4, Role::Junior, true);

        assert_eq!(can_post_answer(&approved), Decision::Allow);
        assert_eq!(
            can_post_answer(&unapproved),
            Decision::Deny(DenyReason::MentorNotApproved)
        );
        assert_eq!(
            can_post_answer(&junior),
            Decision::Deny(DenyReason::WrongRole)
        );
    }

    #[test]
    fn moderation_requires_admin() {
        assert_eq!(
            can_moderate(&actor(5, Role::Mentor, true)),
            Decision::Deny(DenyReason::WrongRole)
        );
        assert_eq!(
            can_moderate(&actor(6, Role::Junior, false)),
            Decision::Deny(DenyReason::WrongRole)
        );
    }

    #[test]
    fn deny_reasons_map_to_stable_codes() {
        assert_eq!(deny_to_error(DenyReason::NotOwner, "doubt").code(), "FORBIDDEN");
        assert_eq!(
            deny_to_error(DenyReason::WrongRole, "answer").code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            deny_to_error(DenyReason::MentorNotApproved, "answer").code(),
            "NOT_APPROVED"
        );
    }

    #[test]
    fn role_round_trips() {
        for role in [Role::Junior, Role::Mentor, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }
}
