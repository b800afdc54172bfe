// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique email address.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    /// User role: 'junior', 'mentor' or 'admin'. Immutable after creation.
    pub role: String,

    pub bio: String,

    /// Approval gate for posting answers. True at creation for juniors and
    /// admins; flipped true for mentors only by an admin approve action.
    pub is_mentor_approved: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for registration. Role defaults to 'junior'; registering as 'mentor'
/// here starts unapproved (the secret-key mentor registration lives under
/// mentor-profiles).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters."))]
    pub name: String,

    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters."))]
    pub password: String,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    /// 'junior' (default) or 'mentor'.
    pub role: Option<String>,
}

/// DTO for mentor/admin registration gated by a shared secret.
#[derive(Debug, Deserialize, Validate)]
pub struct SecretRegisterRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters."))]
    pub name: String,

    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters."))]
    pub password: String,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(length(min = 1, message = "Secret key is required."))]
    pub secret_key: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for profile updates. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
}

/// DTO for password changes. The current password is re-verified.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters."))]
    pub new_password: String,
}
