// src/handlers/mentor_profile.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::{
        Pagination,
        mentor_profile::{
            CreateMentorProfileRequest, MentorProfile, UpdateMentorProfileRequest,
        },
        user::SecretRegisterRequest,
    },
    policy::{self, Role},
    utils::jwt::Claims,
};

const SELECT_PROFILE: &str = r#"
    SELECT id, user_id, badge, expertise_tags, total_upvotes, approved_by_admin, created_at
    FROM mentor_profiles
"#;

fn lowercase_tags(tags: &[String]) -> Vec<String> {
    tags.iter().map(|t| t.trim().to_lowercase()).collect()
}

pub(crate) async fn find_profile(pool: &PgPool, user_id: i64) -> Result<MentorProfile, AppError> {
    sqlx::query_as::<_, MentorProfile>(&format!("{} WHERE user_id = $1", SELECT_PROFILE))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("PROFILE_NOT_FOUND", "Mentor profile not found".to_string())
        })
}

/// Registers a mentor account, gated by the mentor secret key.
/// The account starts unapproved; answering stays locked until an admin
/// approves it.
pub async fn register_mentor(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<SecretRegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    if payload.secret_key != config.mentor_secret_key {
        return Err(AppError::Forbidden(
            "INVALID_SECRET_KEY",
            "Invalid secret key for mentor registration".to_string(),
        ));
    }

    let (user, token) = super::auth::create_account(
        &pool,
        &config,
        &payload.name,
        &payload.email,
        &payload.password,
        payload.bio.as_deref().unwrap_or(""),
        Role::Mentor,
        false,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Mentor account created successfully. Awaiting admin approval.",
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

/// Creates a mentor profile. Owner or admin; the target user must hold the
/// mentor role.
pub async fn create_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(mentor_id): Path<i64>,
    Json(payload): Json<CreateMentorProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    policy::require(
        policy::can_modify_owned(&claims.actor(), mentor_id),
        "mentor profile",
    )?;

    let user = super::user::find_user(&pool, mentor_id).await?;
    if Role::parse(&user.role) != Some(Role::Mentor) {
        return Err(AppError::Forbidden(
            "UNAUTHORIZED",
            "Only mentors can have mentor profiles".to_string(),
        ));
    }

    let tags = lowercase_tags(&payload.expertise_tags);

    let profile = sqlx::query_as::<_, MentorProfile>(
        r#"
        INSERT INTO mentor_profiles (user_id, badge, expertise_tags, total_upvotes, approved_by_admin)
        VALUES ($1, $2, $3, 0, FALSE)
        RETURNING id, user_id, badge, expertise_tags, total_upvotes, approved_by_admin, created_at
        "#,
    )
    .bind(mentor_id)
    .bind(payload.badge.as_deref().unwrap_or("Mentor"))
    .bind(serde_json::to_value(tags)?)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(
                "PROFILE_EXISTS",
                "Mentor profile already exists for this user".to_string(),
            )
        } else {
            tracing::error!("Failed to create mentor profile: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Mentor profile created successfully",
            "data": profile,
        })),
    ))
}

/// Fetches a mentor profile with the owner's public info and answer count.
pub async fn get_profile(
    State(pool): State<PgPool>,
    Path(mentor_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let profile = find_profile(&pool, mentor_id).await?;
    let user = super::user::find_user(&pool, mentor_id).await?;

    let answers_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE mentor_id = $1")
        .bind(mentor_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "profile": profile,
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
                "bio": user.bio,
                "role": user.role,
                "isMentorApproved": user.is_mentor_approved,
            },
            "answersCount": answers_count,
        },
    })))
}

/// Updates badge/expertise tags. Owner or admin only.
pub async fn update_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(mentor_id): Path<i64>,
    Json(payload): Json<UpdateMentorProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    policy::require(
        policy::can_modify_owned(&claims.actor(), mentor_id),
        "mentor profile",
    )?;
    find_profile(&pool, mentor_id).await?;

    let tags_json = match payload.expertise_tags {
        Some(ref tags) => Some(serde_json::to_value(lowercase_tags(tags))?),
        None => None,
    };

    let updated = sqlx::query_as::<_, MentorProfile>(
        r#"
        UPDATE mentor_profiles
        SET badge = COALESCE($1, badge),
            expertise_tags = COALESCE($2, expertise_tags)
        WHERE user_id = $3
        RETURNING id, user_id, badge, expertise_tags, total_upvotes, approved_by_admin, created_at
        "#,
    )
    .bind(payload.badge)
    .bind(tags_json)
    .bind(mentor_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Mentor profile updated successfully",
        "data": updated,
    })))
}

/// Deletes a mentor profile. Owner or admin only.
pub async fn delete_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(mentor_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    policy::require(
        policy::can_modify_owned(&claims.actor(), mentor_id),
        "mentor profile",
    )?;
    find_profile(&pool, mentor_id).await?;

    sqlx::query("DELETE FROM mentor_profiles WHERE user_id = $1")
        .bind(mentor_id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Mentor profile deleted successfully",
        "data": { "mentorId": mentor_id },
    })))
}

/// Lists approved profiles, most upvoted first.
pub async fn list_approved(
    State(pool): State<PgPool>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit, offset) = params.resolve(10);

    let profiles = sqlx::query_as::<_, MentorProfile>(&format!(
        r#"{}
        WHERE approved_by_admin = TRUE
        ORDER BY total_upvotes DESC
        LIMIT $1 OFFSET $2
        "#,
        SELECT_PROFILE
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM mentor_profiles WHERE approved_by_admin = TRUE")
            .fetch_one(&pool)
            .await?;

    Ok(Json(json!({
        "success": true,
        "data": profiles,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Lists profiles awaiting admin approval, oldest first.
pub async fn list_pending(
    State(pool): State<PgPool>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit, offset) = params.resolve(10);

    let profiles = sqlx::query_as::<_, MentorProfile>(&format!(
        r#"{}
        WHERE approved_by_admin = FALSE
        ORDER BY created_at ASC
        LIMIT $1 OFFSET $2
        "#,
        SELECT_PROFILE
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM mentor_profiles WHERE approved_by_admin = FALSE")
            .fetch_one(&pool)
            .await?;

    Ok(Json(json!({
        "success": true,
        "data": profiles,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Lists approved profiles carrying an expertise tag.
pub async fn list_by_expertise(
    State(pool): State<PgPool>,
    Path(tag): Path<String>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit, offset) = params.resolve(10);
    let tag_json = json!([tag.to_lowercase()]);

    let profiles = sqlx::query_as::<_, MentorProfile>(&format!(
        r#"{}
        WHERE approved_by_admin = TRUE AND expertise_tags @> $1
        ORDER BY total_upvotes DESC
        LIMIT $2 OFFSET $3
        "#,
        SELECT_PROFILE
    ))
    .bind(&tag_json)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM mentor_profiles WHERE approved_by_admin = TRUE AND expertise_tags @> $1",
    )
    .bind(&tag_json)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": profiles,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Lists the most upvoted approved mentors.
pub async fn list_top(
    State(pool): State<PgPool>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (_, limit, _) = params.resolve(10);

    let profiles = sqlx::query_as::<_, MentorProfile>(&format!(
        r#"{}
        WHERE approved_by_admin = TRUE
        ORDER BY total_upvotes DESC
        LIMIT $1
        "#,
        SELECT_PROFILE
    ))
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": profiles })))
}
