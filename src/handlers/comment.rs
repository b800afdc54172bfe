// src/handlers/comment.rs

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
        comment::{
            Comment, CommentResponse, CommentThread, CreateCommentRequest, UpdateCommentRequest,
        },
    },
    policy,
    realtime::Broadcaster,
    utils::{html::clean_html, jwt::Claims},
};

const SELECT_COMMENT: &str = r#"
    SELECT id, doubt_id, user_id, content, parent_comment_id, created_at
    FROM comments
    WHERE id = $1
"#;

const SELECT_RESPONSE: &str = r#"
    SELECT c.id, c.doubt_id, c.user_id, u.name AS author_name, u.email AS author_email,
           c.content, c.parent_comment_id, c.created_at
    FROM comments c
    JOIN users u ON c.user_id = u.id
"#;

pub(crate) async fn find_comment(pool: &PgPool, id: i64) -> Result<Comment, AppError> {
    sqlx::query_as::<_, Comment>(SELECT_COMMENT)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("COMMENT_NOT_FOUND", "Comment not found".to_string()))
}

/// Deletes a comment and its direct replies inside the caller's transaction.
/// Shared with the admin moderation path.
pub(crate) async fn cascade_delete_comment(
    tx: &mut Transaction<'_, Postgres>,
    comment_id: i64,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM comments WHERE parent_comment_id = $1")
        .bind(comment_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn fetch_response(pool: &PgPool, id: i64) -> Result<CommentResponse, AppError> {
    sqlx::query_as::<_, CommentResponse>(&format!("{} WHERE c.id = $1", SELECT_RESPONSE))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("COMMENT_NOT_FOUND", "Comment not found".to_string()))
}

/// Creates a comment on a doubt and broadcasts it to the doubt's channel.
///
/// Replies may only target a top-level comment on the same doubt, keeping the
/// tree two levels deep by construction.
pub async fn create_comment(
    State(pool): State<PgPool>,
    State(broadcaster): State<Broadcaster>,
    Extension(claims): Extension<Claims>,
    Path(doubt_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    super::doubt::find_doubt(&pool, doubt_id).await?;

    if let Some(parent_id) = payload.parent_comment_id {
        let parent = sqlx::query_as::<_, Comment>(SELECT_COMMENT)
            .bind(parent_id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "PARENT_COMMENT_NOT_FOUND",
                    "Parent comment not found".to_string(),
                )
            })?;

        if parent.doubt_id != doubt_id {
            return Err(AppError::Validation(
                "Parent comment belongs to a different doubt".to_string(),
            ));
        }
        if parent.parent_comment_id.is_some() {
            return Err(AppError::Validation(
                "Replies to replies are not allowed".to_string(),
            ));
        }
    }

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (doubt_id, user_id, content, parent_comment_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, doubt_id, user_id, content, parent_comment_id, created_at
        "#,
    )
    .bind(doubt_id)
    .bind(claims.user_id())
    .bind(clean_html(&payload.content))
    .bind(payload.parent_comment_id)
    .fetch_one(&pool)
    .await?;

    let response = fetch_response(&pool, comment.id).await?;

    // Best-effort realtime delivery; never fails the mutation.
    broadcaster.publish(
        &format!("doubt-{}", doubt_id),
        "new-comment",
        serde_json::to_value(&response)?,
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Comment created successfully",
            "data": response,
        })),
    ))
}

/// Lists top-level comments on a doubt with their replies attached,
/// newest threads first, replies oldest first.
pub async fn list_comments_by_doubt(
    State(pool): State<PgPool>,
    Path(doubt_id): Path<i64>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    super::doubt::find_doubt(&pool, doubt_id).await?;

    let (page, limit, offset) = params.resolve(20);

    let top_level = sqlx::query_as::<_, CommentResponse>(&format!(
        r#"{}
        WHERE c.doubt_id = $1 AND c.parent_comment_id IS NULL
        ORDER BY c.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
        SELECT_RESPONSE
    ))
    .bind(doubt_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let mut threads = Vec::with_capacity(top_level.len());
    for comment in top_level {
        let replies = sqlx::query_as::<_, CommentResponse>(&format!(
            "{} WHERE c.parent_comment_id = $1 ORDER BY c.created_at ASC",
            SELECT_RESPONSE
        ))
        .bind(comment.id)
        .fetch_all(&pool)
        .await?;

        threads.push(CommentThread { comment, replies });
    }

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM comments WHERE doubt_id = $1 AND parent_comment_id IS NULL",
    )
    .bind(doubt_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": threads,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Fetches a comment with its replies.
pub async fn get_comment(
    State(pool): State<PgPool>,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comment = fetch_response(&pool, comment_id).await?;

    let replies = sqlx::query_as::<_, CommentResponse>(&format!(
        "{} WHERE c.parent_comment_id = $1 ORDER BY c.created_at ASC",
        SELECT_RESPONSE
    ))
    .bind(comment_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": CommentThread { comment, replies },
    })))
}

/// Updates a comment's content. Owner or admin only.
pub async fn update_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let comment = find_comment(&pool, comment_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), comment.user_id),
        "comment",
    )?;

    sqlx::query("UPDATE comments SET content = $1 WHERE id = $2")
        .bind(clean_html(&payload.content))
        .bind(comment_id)
        .execute(&pool)
        .await?;

    let updated = fetch_response(&pool, comment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment updated successfully",
        "data": updated,
    })))
}

/// Deletes a comment and its replies, then broadcasts the removal.
/// Owner or admin only.
pub async fn delete_comment(
    State(pool): State<PgPool>,
    State(broadcaster): State<Broadcaster>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comment = find_comment(&pool, comment_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), comment.user_id),
        "comment",
    )?;

    let mut tx = pool.begin().await?;
    cascade_delete_comment(&mut tx, comment_id).await?;
    tx.commit().await?;

    broadcaster.publish(
        &format!("doubt-{}", comment.doubt_id),
        "comment-deleted",
        json!({ "commentId": comment_id }),
    );

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted successfully",
        "data": { "commentId": comment_id },
    })))
}

/// Lists replies to a comment.
pub async fn list_replies(
    State(pool): State<PgPool>,
    Path(comment_id): Path<i64>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    find_comment(&pool, comment_id).await?;

    let (page, limit, offset) = params.resolve(10);

    let replies = sqlx::query_as::<_, CommentResponse>(&format!(
        r#"{}
        WHERE c.parent_comment_id = $1
        ORDER BY c.created_at ASC
        LIMIT $2 OFFSET $3
        "#,
        SELECT_RESPONSE
    ))
    .bind(comment_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE parent_comment_id = $1")
        .bind(comment_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": replies,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Lists a user's comments.
pub async fn list_comments_by_user(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    super::user::find_user(&pool, user_id).await?;

    let (page, limit, offset) = params.resolve(10);

    let comments = sqlx::query_as::<_, CommentResponse>(&format!(
        r#"{}
        WHERE c.user_id = $1
        ORDER BY c.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
        SELECT_RESPONSE
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": comments,
        "pagination": Pagination::meta(total, page, limit),
    })))
}
