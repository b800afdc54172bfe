// src/handlers/answer.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        Pagination,
        answer::{Answer, AnswerListParams, CreateAnswerRequest, UpdateAnswerRequest},
        doubt::DoubtStatus,
    },
    policy::{self, Actor},
    utils::{html::clean_html, jwt::Claims},
};

pub(crate) async fn find_answer(pool: &PgPool, id: i64) -> Result<Answer, AppError> {
    sqlx::query_as::<_, Answer>(
        r#"
        SELECT id, doubt_id, mentor_id, content, upvote_count, created_at, updated_at
        FROM answers
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("ANSWER_NOT_FOUND", "Answer not found".to_string()))
}

/// Deletes an answer and its upvotes inside the caller's transaction.
/// Shared with the admin moderation path.
pub(crate) async fn cascade_delete_answer(
    tx: &mut Transaction<'_, Postgres>,
    answer_id: i64,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM upvotes WHERE answer_id = $1")
        .bind(answer_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM answers WHERE id = $1")
        .bind(answer_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Posts an answer to a doubt. Approved mentors only (admins pass).
///
/// The first answer flips the doubt from 'open' to 'answered'; the insert and
/// the status flip commit together.
pub async fn create_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(doubt_id): Path<i64>,
    Json(payload): Json<CreateAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    // The approval flag lives in the users table, not the token.
    let user = super::user::find_user(&pool, claims.user_id()).await?;
    let actor = Actor {
        id: user.id,
        role: claims.role(),
        is_mentor_approved: user.is_mentor_approved,
    };
    policy::require(policy::can_post_answer(&actor), "answer")?;

    let doubt = super::doubt::find_doubt(&pool, doubt_id).await?;

    let mut tx = pool.begin().await?;

    let answer = sqlx::query_as::<_, Answer>(
        r#"
        INSERT INTO answers (doubt_id, mentor_id, content, upvote_count)
        VALUES ($1, $2, $3, 0)
        RETURNING id, doubt_id, mentor_id, content, upvote_count, created_at, updated_at
        "#,
    )
    .bind(doubt_id)
    .bind(actor.id)
    .bind(clean_html(&payload.content))
    .fetch_one(&mut *tx)
    .await?;

    // First answer only; the transition is one-directional.
    if DoubtStatus::parse(&doubt.status) == Some(DoubtStatus::Open) {
        sqlx::query("UPDATE doubts SET status = 'answered', updated_at = NOW() WHERE id = $1")
            .bind(doubt_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Answer posted successfully",
            "data": answer,
        })),
    ))
}

/// Lists answers under a doubt, sorted by upvotes (default) or recency.
pub async fn list_answers_by_doubt(
    State(pool): State<PgPool>,
    Path(doubt_id): Path<i64>,
    Query(params): Query<AnswerListParams>,
) -> Result<impl IntoResponse, AppError> {
    super::doubt::find_doubt(&pool, doubt_id).await?;

    let pagination = Pagination {
        page: params.page,
        limit: params.limit,
    };
    let (page, limit, offset) = pagination.resolve(10);

    let order = match params.sort_by.as_deref() {
        Some("recent") => "created_at DESC",
        _ => "upvote_count DESC",
    };

    let answers = sqlx::query_as::<_, Answer>(&format!(
        r#"
        SELECT id, doubt_id, mentor_id, content, upvote_count, created_at, updated_at
        FROM answers
        WHERE doubt_id = $1
        ORDER BY {}
        LIMIT $2 OFFSET $3
        "#,
        order
    ))
    .bind(doubt_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE doubt_id = $1")
        .bind(doubt_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": answers,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Fetches a single answer.
pub async fn get_answer(
    State(pool): State<PgPool>,
    Path(answer_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let answer = find_answer(&pool, answer_id).await?;

    Ok(Json(json!({ "success": true, "data": answer })))
}

/// Updates an answer's content. Owner or admin only.
pub async fn update_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(answer_id): Path<i64>,
    Json(payload): Json<UpdateAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let answer = find_answer(&pool, answer_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), answer.mentor_id),
        "answer",
    )?;

    let updated = sqlx::query_as::<_, Answer>(
        r#"
        UPDATE answers
        SET content = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING id, doubt_id, mentor_id, content, upvote_count, created_at, updated_at
        "#,
    )
    .bind(clean_html(&payload.content))
    .bind(answer_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Answer updated successfully",
        "data": updated,
    })))
}

/// Deletes an answer and its upvotes. Owner or admin only.
pub async fn delete_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(answer_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let answer = find_answer(&pool, answer_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), answer.mentor_id),
        "answer",
    )?;

    let mut tx = pool.begin().await?;
    cascade_delete_answer(&mut tx, answer_id).await?;
    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Answer deleted successfully",
        "data": { "answerId": answer_id },
    })))
}

/// Lists answers posted by a mentor.
pub async fn list_answers_by_mentor(
    State(pool): State<PgPool>,
    Path(mentor_id): Path<i64>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    super::user::find_user(&pool, mentor_id).await?;

    let (page, limit, offset) = params.resolve(10);

    let answers = sqlx::query_as::<_, Answer>(
        r#"
        SELECT id, doubt_id, mentor_id, content, upvote_count, created_at, updated_at
        FROM answers
        WHERE mentor_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(mentor_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers WHERE mentor_id = $1")
        .bind(mentor_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": answers,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Lists the most upvoted answers platform-wide.
pub async fn list_most_helpful(
    State(pool): State<PgPool>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (_, limit, _) = params.resolve(10);

    let answers = sqlx::query_as::<_, Answer>(
        r#"
        SELECT id, doubt_id, mentor_id, content, upvote_count, created_at, updated_at
        FROM answers
        ORDER BY upvote_count DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": answers })))
}
