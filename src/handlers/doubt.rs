// src/handlers/doubt.rs

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
        answer::Answer,
        doubt::{CreateDoubtRequest, Doubt, DoubtListParams, DoubtStatus, UpdateDoubtRequest},
    },
    policy,
    utils::{html::clean_html, jwt::Claims},
};

fn lowercase_tags(tags: &[String]) -> Vec<String> {
    tags.iter().map(|t| t.trim().to_lowercase()).collect()
}

pub(crate) async fn find_doubt(pool: &PgPool, id: i64) -> Result<Doubt, AppError> {
    sqlx::query_as::<_, Doubt>(
        r#"
        SELECT id, junior_id, title, description, tags, status, created_at, updated_at
        FROM doubts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("DOUBT_NOT_FOUND", "Doubt not found".to_string()))
}

/// Deletes a doubt plus its answers (and their upvotes) and comments inside
/// the caller's transaction. Shared with the admin moderation path.
pub(crate) async fn cascade_delete_doubt(
    tx: &mut Transaction<'_, Postgres>,
    doubt_id: i64,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM upvotes WHERE answer_id IN (SELECT id FROM answers WHERE doubt_id = $1)")
        .bind(doubt_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM answers WHERE doubt_id = $1")
        .bind(doubt_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE doubt_id = $1")
        .bind(doubt_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM doubts WHERE id = $1")
        .bind(doubt_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Posts a new doubt. Any authenticated user.
pub async fn create_doubt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateDoubtRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let tags = lowercase_tags(&payload.tags);

    let doubt = sqlx::query_as::<_, Doubt>(
        r#"
        INSERT INTO doubts (junior_id, title, description, tags, status)
        VALUES ($1, $2, $3, $4, 'open')
        RETURNING id, junior_id, title, description, tags, status, created_at, updated_at
        "#,
    )
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(clean_html(&payload.description))
    .bind(serde_json::to_value(tags)?)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create doubt: {:?}", e);
        AppError::Internal(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Doubt posted successfully",
            "data": doubt,
        })),
    ))
}

/// Fetches a doubt together with its answers, newest first.
pub async fn get_doubt(
    State(pool): State<PgPool>,
    Path(doubt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let doubt = find_doubt(&pool, doubt_id).await?;

    let answers = sqlx::query_as::<_, Answer>(
        r#"
        SELECT id, doubt_id, mentor_id, content, upvote_count, created_at, updated_at
        FROM answers
        WHERE doubt_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(doubt_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": { "doubt": doubt, "answers": answers },
    })))
}

/// Lists doubts with optional status/tag filters, newest first.
pub async fn list_doubts(
    State(pool): State<PgPool>,
    Query(params): Query<DoubtListParams>,
) -> Result<impl IntoResponse, AppError> {
    let pagination = Pagination {
        page: params.page,
        limit: params.limit,
    };
    let (page, limit, offset) = pagination.resolve(10);

    if let Some(status) = params.status.as_deref() {
        if DoubtStatus::parse(status).is_none() {
            return Err(AppError::Validation(format!("Invalid status '{}'", status)));
        }
    }

    let tag_filter = params.tag.as_deref().map(|t| json!([t.to_lowercase()]));

    let doubts = sqlx::query_as::<_, Doubt>(
        r#"
        SELECT id, junior_id, title, description, tags, status, created_at, updated_at
        FROM doubts
        WHERE ($1::TEXT IS NULL OR status = $1)
          AND ($2::JSONB IS NULL OR tags @> $2)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(&params.status)
    .bind(&tag_filter)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM doubts
        WHERE ($1::TEXT IS NULL OR status = $1)
          AND ($2::JSONB IS NULL OR tags @> $2)
        "#,
    )
    .bind(&params.status)
    .bind(&tag_filter)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": doubts,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Updates a doubt. Owner or admin only.
pub async fn update_doubt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(doubt_id): Path<i64>,
    Json(payload): Json<UpdateDoubtRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let doubt = find_doubt(&pool, doubt_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), doubt.junior_id),
        "doubt",
    )?;

    if let Some(status) = payload.status.as_deref() {
        if DoubtStatus::parse(status).is_none() {
            return Err(AppError::Validation(format!("Invalid status '{}'", status)));
        }
    }

    let tags_json = match payload.tags {
        Some(ref tags) => Some(serde_json::to_value(lowercase_tags(tags))?),
        None => None,
    };

    let updated = sqlx::query_as::<_, Doubt>(
        r#"
        UPDATE doubts
        SET title = COALESCE($1, title),
            description = COALESCE($2, description),
            tags = COALESCE($3, tags),
            status = COALESCE($4, status),
            updated_at = NOW()
        WHERE id = $5
        RETURNING id, junior_id, title, description, tags, status, created_at, updated_at
        "#,
    )
    .bind(payload.title)
    .bind(payload.description.as_deref().map(clean_html))
    .bind(tags_json)
    .bind(payload.status)
    .bind(doubt_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doubt updated successfully",
        "data": updated,
    })))
}

/// Deletes a doubt and everything hanging off it. Owner or admin only.
pub async fn delete_doubt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(doubt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let doubt = find_doubt(&pool, doubt_id).await?;
    policy::require(
        policy::can_modify_owned(&claims.actor(), doubt.junior_id),
        "doubt",
    )?;

    let mut tx = pool.begin().await?;
    cascade_delete_doubt(&mut tx, doubt_id).await?;
    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doubt deleted successfully",
        "data": { "doubtId": doubt_id },
    })))
}

/// Lists a user's doubts.
pub async fn list_doubts_by_user(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    super::user::find_user(&pool, user_id).await?;

    let (page, limit, offset) = params.resolve(10);

    let doubts = sqlx::query_as::<_, Doubt>(
        r#"
        SELECT id, junior_id, title, description, tags, status, created_at, updated_at
        FROM doubts
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

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doubts WHERE junior_id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": doubts,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Lists doubts carrying a tag.
pub async fn list_doubts_by_tag(
    State(pool): State<PgPool>,
    Path(tag): Path<String>,
    Query(params): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let (page, limit, offset) = params.resolve(10);
    let tag_json = json!([tag.to_lowercase()]);

    let doubts = sqlx::query_as::<_, Doubt>(
        r#"
        SELECT id, junior_id, title, description, tags, status, created_at, updated_at
        FROM doubts
        WHERE tags @> $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&tag_json)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doubts WHERE tags @> $1")
        .bind(&tag_json)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": doubts,
        "pagination": Pagination::meta(total, page, limit),
    })))
}

/// Row shape for the status breakdown aggregate.
#[derive(sqlx::FromRow)]
struct StatusCount {
    status: String,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct TagCount {
    tag: String,
    count: i64,
}

/// Platform-wide doubt statistics: totals by status and top tags.
pub async fn doubt_stats(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doubts")
        .fetch_one(&pool)
        .await?;

    let by_status = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) as count FROM doubts GROUP BY status",
    )
    .fetch_all(&pool)
    .await?;

    let mut status_map = serde_json::Map::new();
    for s in ["open", "answered", "resolved", "closed"] {
        let count = by_status
            .iter()
            .find(|row| row.status == s)
            .map(|row| row.count)
            .unwrap_or(0);
        status_map.insert(s.to_string(), json!(count));
    }

    let top_tags = sqlx::query_as::<_, TagCount>(
        r#"
        SELECT tag, COUNT(*) as count
        FROM doubts, jsonb_array_elements_text(tags) AS tag
        GROUP BY tag
        ORDER BY count DESC
        LIMIT 10
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "total": total,
            "byStatus": status_map,
            "topTags": top_tags
                .into_iter()
                .map(|t| json!({ "tag": t.tag, "count": t.count }))
                .collect::<Vec<_>>(),
        },
    })))
}
