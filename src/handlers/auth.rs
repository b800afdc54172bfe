// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{LoginRequest, RegisterRequest, User},
    policy::Role,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Inserts a user row and signs a token for it. Shared by the public
/// registration and the secret-key mentor/admin registrations.
pub(crate) async fn create_account(
    pool: &PgPool,
    config: &Config,
    name: &str,
    email: &str,
    password: &str,
    bio: &str,
    role: Role,
    is_mentor_approved: bool,
) -> Result<(User, String), AppError> {
    let password_hash = hash_password(password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash, role, bio, is_mentor_approved)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, email, password_hash, role, bio, is_mentor_approved, created_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(bio)
    .bind(is_mentor_approved)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("EMAIL_EXISTS", "Email already registered".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let token = sign_jwt(user.id, &user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok((user, token))
}

/// Registers a new user (junior by default; 'mentor' starts unapproved).
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the user data and a JWT token.
pub async fn register(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let role = match payload.role.as_deref() {
        None | Some("junior") => Role::Junior,
        Some("mentor") => Role::Mentor,
        Some(other) => {
            return Err(AppError::Validation(format!(
                "Invalid role '{}'. Must be 'junior' or 'mentor'.",
                other
            )));
        }
    };

    // Only juniors are auto-approved; mentors wait for an admin.
    let is_mentor_approved = role == Role::Junior;

    let (user, token) = create_account(
        &pool,
        &config,
        &payload.name,
        &payload.email,
        &payload.password,
        payload.bio.as_deref().unwrap_or(""),
        role,
        is_mentor_approved,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "data": {
                "userId": user.id,
                "name": user.name,
                "email": user.email,
                "role": user.role,
                "bio": user.bio,
                "isMentorApproved": user.is_mentor_approved,
            },
            "token": token,
        })),
    ))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, role, bio, is_mentor_approved, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::Internal(e.to_string())
    })?;

    // Identical error for unknown email and wrong password.
    let invalid = || {
        AppError::InvalidCredentials(
            "INVALID_CREDENTIALS",
            "Invalid email or password".to_string(),
        )
    };

    let user = user.ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }

    let token = sign_jwt(user.id, &user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "data": {
            "userId": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
            "bio": user.bio,
            "isMentorApproved": user.is_mentor_approved,
        },
        "token": token,
    })))
}
