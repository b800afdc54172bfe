// src/handlers/admin.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    config::Config,
    error::AppError,
    models::{
        Pagination,
        admin_action::{ActionListParams, ActionType, AdminAction},
        user::SecretRegisterRequest,
    },
    policy::Role,
    utils::jwt::Claims,
};
use validator::Validate;

/// Appends a row to the audit ledger inside the caller's transaction, so the
/// mutation and its record commit or roll back together.
async fn record_action(
    tx: &mut Transaction<'_, Postgres>,
    admin_id: i64,
    action: ActionType,
    target_id: i64,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO admin_actions (admin_id, action_type, target_id) VALUES ($1, $2, $3)",
    )
    .bind(admin_id)
    .bind(action.as_str())
    .bind(target_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Registers an admin account, gated by the admin secret key. Admins are
/// created approved so they can answer without a separate approval step.
pub async fn register_admin(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<SecretRegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    if payload.secret_key != config.admin_secret_key {
        return Err(AppError::Forbidden(
            "INVALID_SECRET_KEY",
            "Invalid secret key for admin registration".to_string(),
        ));
    }

    let (user, token) = super::auth::create_account(
        &pool,
        &config,
        &payload.name,
        &payload.email,
        &payload.password,
        payload.bio.as_deref().unwrap_or(""),
        Role::Admin,
        true,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Admin account created successfully",
            "data": {
                "userId": user.id,
                "name": user.name,
                "email": user.email,
                "role": user.role,
            },
            "token": token,
        })),
    ))
}

/// Approves a mentor. Flips the users flag and, when a profile exists, its
/// approved flag too, with the audit row, all in one transaction.
pub async fn approve_mentor(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(mentor_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = super::user::find_user(&pool, mentor_id).await?;
    if Role::parse(&user.role) != Some(Role::Mentor) {
        return Err(AppError::Validation(
            "User is not a mentor".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE users SET is_mentor_approved = TRUE WHERE id = $1")
        .bind(mentor_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE mentor_profiles SET approved_by_admin = TRUE WHERE user_id = $1")
        .bind(mentor_id)
        .execute(&mut *tx)
        .await?;
    record_action(&mut tx, claims.user_id(), ActionType::ApproveMentor, mentor_id).await?;

    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Mentor approved successfully",
        "data": { "mentorId": mentor_id, "isMentorApproved": true },
    })))
}

/// Rejects a pending mentor by deleting the profile. The account itself
/// stays, unapproved, so the mentor may reapply.
pub async fn reject_mentor(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(mentor_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    super::mentor_profile::find_profile(&pool, mentor_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM mentor_profiles WHERE user_id = $1")
        .bind(mentor_id)
        .execute(&mut *tx)
        .await?;
    record_action(&mut tx, claims.user_id(), ActionType::RejectMentor, mentor_id).await?;

    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Mentor profile rejected",
        "data": { "mentorId": mentor_id },
    })))
}

/// Records a ban in the ledger. The ledger is the single record of ban
/// state; no per-user flag exists.
pub async fn ban_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    super::user::find_user(&pool, user_id).await?;

    let mut tx = pool.begin().await?;
    record_action(&mut tx, claims.user_id(), ActionType::BanUser, user_id).await?;
    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "User banned",
        "data": { "userId": user_id },
    })))
}

pub async fn unban_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    super::user::find_user(&pool, user_id).await?;

    let mut tx = pool.begin().await?;
    record_action(&mut tx, claims.user_id(), ActionType::UnbanUser, user_id).await?;
    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "User unbanned",
        "data": { "userId": user_id },
    })))
}

/// Deletes a doubt and its whole subtree, plus the audit row, in one
/// transaction.
pub async fn delete_doubt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(doubt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    super::doubt::find_doubt(&pool, doubt_id).await?;

    let mut tx = pool.begin().await?;
    super::doubt::cascade_delete_doubt(&mut tx, doubt_id).await?;
    record_action(&mut tx, claims.user_id(), ActionType::DeleteDoubt, doubt_id).await?;
    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doubt deleted by admin",
        "data": { "doubtId": doubt_id },
    })))
}

pub async fn delete_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(answer_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    super::answer::find_answer(&pool, answer_id).await?;

    let mut tx = pool.begin().await?;
    super::answer::cascade_delete_answer(&mut tx, answer_id).await?;
    record_action(&mut tx, claims.user_id(), ActionType::DeleteAnswer, answer_id).await?;
    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Answer deleted by admin",
        "data": { "answerId": answer_id },
    })))
}

pub async fn delete_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    super::comment::find_comment(&pool, comment_id).await?;

    let mut tx = pool.begin().await?;
    super::comment::cascade_delete_comment(&mut tx, comment_id).await?;
    record_action(&mut tx, claims.user_id(), ActionType::DeleteComment, comment_id).await?;
    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted by admin",
        "data": { "commentId": comment_id },
    })))
}

pub async fn delete_junior_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    super::junior_space::find_post(&pool, post_id).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM junior_space_posts WHERE id = $1")
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
    record_action(&mut tx, claims.user_id(), ActionType::DeleteJuniorPost, post_id).await?;
    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Junior space post deleted by admin",
        "data": { "postId": post_id },
    })))
}

/// Lists the caller's own moderation history, newest first, optionally
/// filtered by action type.
pub async fn list_actions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ActionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let admin_id = claims.user_id();
    let (page, limit, offset) = Pagination {
        page: params.page,
        limit: params.limit,
    }
    .resolve(20);

    let action_type = match params.action_type.as_deref() {
        Some(raw) => match ActionType::parse(raw) {
            Some(a) => Some(a.as_str()),
            None => {
                return Err(AppError::Validation(format!(
                    "Unknown action type: {}",
                    raw
                )));
            }
        },
        None => None,
    };

    let actions = sqlx::query_as::<_, AdminAction>(
        r#"
        SELECT id, admin_id, action_type, target_id, created_at
        FROM admin_actions
        WHERE admin_id = $1 AND ($2::TEXT IS NULL OR action_type = $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(admin_id)
    .bind(action_type)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM admin_actions WHERE admin_id = $1 AND ($2::TEXT IS NULL OR action_type = $2)",
    )
    .bind(admin_id)
    .bind(action_type)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": actions,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

#[derive(Debug, sqlx::FromRow, serde::Serialize)]
struct ActionCount {
    action_type: String,
    count: i64,
}

/// The caller's action total with a per-type breakdown.
pub async fn action_stats(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let admin_id = claims.user_id();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_actions WHERE admin_id = $1")
        .bind(admin_id)
        .fetch_one(&pool)
        .await?;

    let by_type = sqlx::query_as::<_, ActionCount>(
        r#"
        SELECT action_type, COUNT(*) AS count
        FROM admin_actions
        WHERE admin_id = $1
        GROUP BY action_type
        ORDER BY count DESC
        "#,
    )
    .bind(admin_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "totalActions": total,
            "byType": by_type,
        },
    })))
}

/// Recomputes every cached upvote counter from the vote rows. The cached
/// columns are denormalized aggregates; this repairs any drift left by
/// crashes between partial writes.
pub async fn reconcile_upvotes(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let answers_fixed = sqlx::query(
        r#"
        UPDATE answers a
        SET upvote_count = v.n
        FROM (
            SELECT a2.id, COUNT(u.id) AS n
            FROM answers a2
            LEFT JOIN upvotes u ON u.answer_id = a2.id
            GROUP BY a2.id
        ) v
        WHERE a.id = v.id AND a.upvote_count <> v.n
        "#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let profiles_fixed = sqlx::query(
        r#"
        UPDATE mentor_profiles p
        SET total_upvotes = v.n
        FROM (
            SELECT p2.user_id, COUNT(u.id) AS n
            FROM mentor_profiles p2
            LEFT JOIN answers a ON a.mentor_id = p2.user_id
            LEFT JOIN upvotes u ON u.answer_id = a.id
            GROUP BY p2.user_id
        ) v
        WHERE p.user_id = v.user_id AND p.total_upvotes <> v.n
        "#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    tracing::info!(
        answers_fixed,
        profiles_fixed,
        "upvote counters reconciled"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Upvote counters reconciled",
        "data": {
            "answersFixed": answers_fixed,
            "profilesFixed": profiles_fixed,
        },
    })))
}
