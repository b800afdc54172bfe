// src/handlers/upvote.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::{AppError, is_unique_violation},
    models::{Pagination, upvote::Upvote},
    utils::jwt::Claims,
};

/// Upvotes an answer. The vote row, the answer's cached count, and the
/// mentor's cached total move in one transaction; the unique index on
/// (user_id, answer_id) decides double-upvote races.
pub async fn upvote_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(answer_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let answer = super::answer::find_answer(&pool, answer_id).await?;
    let user_id = claims.user_id();

    let already: Option<i64> =
        sqlx::query_scalar("SELECT id FROM upvotes WHERE user_id = $1 AND answer_id = $2")
            .bind(user_id)
            .bind(answer_id)
            .fetch_optional(&pool)
            .await?;
    if already.is_some() {
        return Err(AppError::Conflict(
            "ALREADY_UPVOTED",
            "You have already upvoted this answer".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let upvote_id: i64 = sqlx::query_scalar(
        "INSERT INTO upvotes (user_id, answer_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(user_id)
    .bind(answer_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(
                "ALREADY_UPVOTED",
                "You have already upvoted this answer".to_string(),
            )
        } else {
            AppError::from(e)
        }
    })?;

    let upvote_count: i32 = sqlx::query_scalar(
        "UPDATE answers SET upvote_count = upvote_count + 1 WHERE id = $1 RETURNING upvote_count",
    )
    .bind(answer_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE mentor_profiles SET total_upvotes = total_upvotes + 1 WHERE user_id = $1")
        .bind(answer.mentor_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Answer upvoted successfully",
            "data": {
                "upvoteId": upvote_id,
                "answerId": answer_id,
                "upvoteCount": upvote_count,
            },
        })),
    ))
}

/// Removes the caller's upvote, reversing both cached counters. Decrements
/// clamp at zero so a drifted counter never goes negative.
pub async fn remove_upvote(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(answer_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let answer = super::answer::find_answer(&pool, answer_id).await?;
    let user_id = claims.user_id();

    let upvote_id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM upvotes WHERE user_id = $1 AND answer_id = $2")
            .bind(user_id)
            .bind(answer_id)
            .fetch_optional(&pool)
            .await?;
    let Some(upvote_id) = upvote_id else {
        return Err(AppError::NotFound(
            "UPVOTE_NOT_FOUND",
            "You have not upvoted this answer".to_string(),
        ));
    };

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM upvotes WHERE id = $1")
        .bind(upvote_id)
        .execute(&mut *tx)
        .await?;

    let upvote_count: i32 = sqlx::query_scalar(
        "UPDATE answers SET upvote_count = GREATEST(0, upvote_count - 1) WHERE id = $1 RETURNING upvote_count",
    )
    .bind(answer_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE mentor_profiles SET total_upvotes = GREATEST(0, total_upvotes - 1) WHERE user_id = $1",
    )
    .bind(answer.mentor_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Upvote removed successfully",
        "data": {
            "answerId": answer_id,
            "upvoteCount": upvote_count,
        },
    })))
}

/// Lists the upvotes on an answer, newest first.
pub async fn list_by_answer(
    State(pool): State<PgPool>,
    Path(answer_id): Path<i64>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    super::answer::find_answer(&pool, answer_id).await?;
    let (page, limit, offset) = params.resolve(10);

    let upvotes = sqlx::query_as::<_, Upvote>(
        r#"
        SELECT id, user_id, answer_id, created_at
        FROM upvotes
        WHERE answer_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(answer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM upvotes WHERE answer_id = $1")
        .bind(answer_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": upvotes,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Lists the upvotes cast by a user, newest first.
pub async fn list_by_user(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    super::user::find_user(&pool, user_id).await?;
    let (page, limit, offset) = params.resolve(10);

    let upvotes = sqlx::query_as::<_, Upvote>(
        r#"
        SELECT id, user_id, answer_id, created_at
        FROM upvotes
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM upvotes WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": upvotes,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Reports whether a user has upvoted an answer.
pub async fn check_upvote(
    State(pool): State<PgPool>,
    Path((answer_id, user_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    super::answer::find_answer(&pool, answer_id).await?;

    let upvote_id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM upvotes WHERE user_id = $1 AND answer_id = $2")
            .bind(user_id)
            .bind(answer_id)
            .fetch_optional(&pool)
            .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "answerId": answer_id,
            "userId": user_id,
            "isUpvoted": upvote_id.is_some(),
        },
    })))
}

#[derive(Debug, sqlx::FromRow, serde::Serialize)]
struct AnswerUpvoteCount {
    answer_id: i64,
    count: i64,
}

/// Upvote totals plus the ten most upvoted answers, counted from vote rows
/// rather than the cached columns.
pub async fn upvote_stats(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM upvotes")
        .fetch_one(&pool)
        .await?;

    let top_answers = sqlx::query_as::<_, AnswerUpvoteCount>(
        r#"
        SELECT answer_id, COUNT(*) AS count
        FROM upvotes
        GROUP BY answer_id
        ORDER BY count DESC
        LIMIT 10
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "totalUpvotes": total,
            "topAnswers": top_answers,
        },
    })))
}
