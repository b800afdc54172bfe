// src/handlers/user.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        Pagination,
        user::{ChangePasswordRequest, UpdateProfileRequest, User},
    },
    policy,
    utils::{
        hash::{hash_password, verify_password},
        jwt::Claims,
    },
};

pub(crate) async fn find_user(pool: &PgPool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, role, bio, is_mentor_approved, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("USER_NOT_FOUND", "User not found".to_string()))
}

/// Fetches a public user profile.
pub async fn get_profile(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&pool, user_id).await?;

    Ok(Json(json!({ "success": true, "data": user })))
}

/// Updates name/bio on a profile. Owner or admin only.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let user = find_user(&pool, user_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), user.id),
        "profile",
    )?;

    let updated = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = COALESCE($1, name), bio = COALESCE($2, bio)
        WHERE id = $3
        RETURNING id, name, email, password_hash, role, bio, is_mentor_approved, created_at
        "#,
    )
    .bind(payload.name)
    .bind(payload.bio)
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "data": updated,
    })))
}

/// Deletes a user account. Owner or admin only.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&pool, user_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), user.id),
        "account",
    )?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::Internal(e.to_string())
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
        "data": { "userId": user_id },
    })))
}

/// Changes a password after re-verifying the current one. Owner or admin.
pub async fn change_password(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let user = find_user(&pool, user_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), user.id),
        "account",
    )?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials(
            "INVALID_PASSWORD",
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(new_hash)
        .bind(user_id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password changed successfully",
    })))
}

/// Lists approved mentors, newest first.
pub async fn list_approved_mentors(
    State(pool): State<PgPool>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit, offset) = params.resolve(10);

    let mentors = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, role, bio, is_mentor_approved, created_at
        FROM users
        WHERE role = 'mentor' AND is_mentor_approved = TRUE
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE role = 'mentor' AND is_mentor_approved = TRUE",
    )
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": mentors,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Lists users of a given role.
pub async fn list_users_by_role(
    State(pool): State<PgPool>,
    Path(role): Path<String>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    if crate::policy::Role::parse(&role).is_none() {
        return Err(AppError::Validation(format!("Invalid role '{}'", role)));
    }

    let (page, limit, offset) = params.resolve(10);

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, password_hash, role, bio, is_mentor_approved, created_at
        FROM users
        WHERE role = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&role)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
        .bind(&role)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": users,
        "pagination": Pagination::meta(total, page, limit),
    })))
}
