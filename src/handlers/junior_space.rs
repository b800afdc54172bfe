// src/handlers/junior_space.rs

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
    error::AppError,
    models::{
        Pagination,
        junior_space_post::{CreateJuniorPostRequest, JuniorSpacePost, UpdateJuniorPostRequest},
    },
    policy,
    realtime::Broadcaster,
    utils::{html::clean_html, jwt::Claims},
};

/// Channel every junior-space subscriber listens on.
const CHANNEL: &str = "junior-space";

pub(crate) async fn find_post(pool: &PgPool, id: i64) -> Result<JuniorSpacePost, AppError> {
    sqlx::query_as::<_, JuniorSpacePost>(
        "SELECT id, junior_id, content, created_at FROM junior_space_posts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("POST_NOT_FOUND", "Post not found".to_string()))
}

/// Creates a junior space post and broadcasts it.
pub async fn create_post(
    State(pool): State<PgPool>,
    State(broadcaster): State<Broadcaster>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJuniorPostRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let post = sqlx::query_as::<_, JuniorSpacePost>(
        r#"
        INSERT INTO junior_space_posts (junior_id, content)
        VALUES ($1, $2)
        RETURNING id, junior_id, content, created_at
        "#,
    )
    .bind(claims.user_id())
    .bind(clean_html(&payload.content))
    .fetch_one(&pool)
    .await?;

    broadcaster.publish(CHANNEL, "new-post", serde_json::to_value(&post)?);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Junior space post created successfully",
            "data": post,
        })),
    ))
}

/// Lists posts, newest first.
pub async fn list_posts(
    State(pool): State<PgPool>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit, offset) = params.resolve(10);

    let posts = sqlx::query_as::<_, JuniorSpacePost>(
        r#"
        SELECT id, junior_id, content, created_at
        FROM junior_space_posts
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM junior_space_posts")
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": posts,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Fetches a single post.
pub async fn get_post(
    State(pool): State<PgPool>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = find_post(&pool, post_id).await?;

    Ok(Json(json!({ "success": true, "data": post })))
}

/// Updates a post's content. Owner or admin only.
pub async fn update_post(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    Json(payload): Json<UpdateJuniorPostRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let post = find_post(&pool, post_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), post.junior_id),
        "post",
    )?;

    let updated = sqlx::query_as::<_, JuniorSpacePost>(
        r#"
        UPDATE junior_space_posts
        SET content = $1
        WHERE id = $2
        RETURNING id, junior_id, content, created_at
        "#,
    )
    .bind(clean_html(&payload.content))
    .bind(post_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Junior space post updated successfully",
        "data": updated,
    })))
}

/// Deletes a post and broadcasts the removal. Owner or admin only.
pub async fn delete_post(
    State(pool): State<PgPool>,
    State(broadcaster): State<Broadcaster>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = find_post(&pool, post_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), post.junior_id),
        "post",
    )?;

    sqlx::query("DELETE FROM junior_space_posts WHERE id = $1")
        .bind(post_id)
        .execute(&pool)
        .await?;

    broadcaster.publish(CHANNEL, "post-deleted", json!({ "postId": post_id }));

    Ok(Json(json!({
        "success": true,
        "message": "Junior space post deleted successfully",
        "data": { "postId": post_id },
    })))
}

/// Lists a user's posts.
pub async fn list_posts_by_user(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    super::user::find_user(&pool, user_id).await?;

    let (page, limit, offset) = params.resolve(10);

    let posts = sqlx::query_as::<_, JuniorSpacePost>(
        r#"
        SELECT id, junior_id, content, created_at
        FROM junior_space_posts
        WHERE junior_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM junior_space_posts WHERE junior_id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(json!({
        "success": true,
        "data": posts,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Lists the most recent posts without pagination bookkeeping.
pub async fn list_recent_posts(
    State(pool): State<PgPool>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (_, limit, _) = params.resolve(20);

    let posts = sqlx::query_as::<_, JuniorSpacePost>(
        r#"
        SELECT id, junior_id, content, created_at
        FROM junior_space_posts
        ORDER BY created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": posts })))
}

/// Junior space statistics: total posts and distinct posters.
pub async fn junior_space_stats(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let total_posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM junior_space_posts")
        .fetch_one(&pool)
        .await?;

    let total_posters: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT junior_id) FROM junior_space_posts")
            .fetch_one(&pool)
            .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "totalPosts": total_posts,
            "totalPosters": total_posters,
        },
    })))
}
