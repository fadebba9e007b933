// src/handlers/comments.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::comment::{
        CommentRequest, CommentResponse, VoteAction, VoteParams, VoteType, transition,
    },
    utils::{html::clean_html, jwt::Claims},
};

const COMMENT_SELECT: &str = r#"
    SELECT
        c.id, c.question_id, c.user_id, u.username, c.content, c.points,
        c.created_at, c.updated_at, v.vote_type AS voted_by_me
    FROM comments c
    JOIN users u ON c.user_id = u.id
    LEFT JOIN comment_votes v ON v.comment_id = c.id AND v.user_id = $1
"#;

#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
    pub order: Option<String>,
}

/// Maps the client sort options onto a fixed ORDER BY clause.
fn order_clause(params: &CommentListParams) -> &'static str {
    let desc = !matches!(params.order.as_deref(), Some("asc"));
    match (params.order_by.as_deref(), desc) {
        (Some("points"), true) => "c.points DESC, c.created_at DESC",
        (Some("points"), false) => "c.points ASC, c.created_at ASC",
        (_, true) => "c.created_at DESC",
        (_, false) => "c.created_at ASC",
    }
}

/// Create a new comment on a question. Points start at 1.
pub async fn create_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user_id = claims.user_id()?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM questions WHERE id = $1)")
        .bind(question_id)
        .fetch_one(&pool)
        .await?;
    if !exists {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let new_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO comments (question_id, user_id, content, points)
        VALUES ($1, $2, $3, 1)
        RETURNING id
        "#,
    )
    .bind(question_id)
    .bind(user_id)
    .bind(clean_html(&payload.content))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create comment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let comment: CommentResponse = sqlx::query_as(&format!("{COMMENT_SELECT} WHERE c.id = $2"))
        .bind(user_id)
        .bind(new_id)
        .fetch_one(&pool)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// List all comments for a question with the caller's vote.
pub async fn list_comments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
    Query(params): Query<CommentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let comments: Vec<CommentResponse> = sqlx::query_as(&format!(
        "{COMMENT_SELECT} WHERE c.question_id = $2 ORDER BY {}",
        order_clause(&params)
    ))
    .bind(user_id)
    .bind(question_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(comments))
}

pub async fn get_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let comment: CommentResponse = sqlx::query_as(&format!("{COMMENT_SELECT} WHERE c.id = $2"))
        .bind(user_id)
        .bind(comment_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    Ok(Json(comment))
}

/// Author of a comment, or 404.
async fn comment_author(pool: &PgPool, comment_id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar("SELECT user_id FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Comment not found".to_string()))
}

/// Edit a comment. Author only.
pub async fn update_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<i64>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    if comment_author(&pool, comment_id).await? != user_id {
        tracing::warn!("User {} tried to edit comment {}", user_id, comment_id);
        return Err(AppError::Forbidden("You can only edit your own comments".to_string()));
    }

    sqlx::query("UPDATE comments SET content = $1, updated_at = NOW() WHERE id = $2")
        .bind(clean_html(&payload.content))
        .bind(comment_id)
        .execute(&pool)
        .await?;

    let comment: CommentResponse = sqlx::query_as(&format!("{COMMENT_SELECT} WHERE c.id = $2"))
        .bind(user_id)
        .bind(comment_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(comment))
}

/// Delete a comment. Author only; votes go with it.
pub async fn delete_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    if comment_author(&pool, comment_id).await? != user_id {
        tracing::warn!("User {} tried to delete comment {}", user_id, comment_id);
        return Err(AppError::Forbidden("You can only delete your own comments".to_string()));
    }

    let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND user_id = $2")
        .bind(comment_id)
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete comment: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Upvote, downvote or remove a vote on a comment.
///
/// Runs in one transaction with the vote row locked, so points always equal the
/// sum of the stored votes plus the initial 1.
pub async fn vote_comment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(comment_id): Path<i64>,
    Query(params): Query<VoteParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let action = params
        .vote_type
        .as_deref()
        .and_then(VoteAction::parse)
        .ok_or(AppError::BadRequest(
            "type must be 'upvote', 'downvote' or 'remove'".to_string(),
        ))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let author: i64 = sqlx::query_scalar("SELECT user_id FROM comments WHERE id = $1 FOR UPDATE")
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    if author == user_id {
        return Err(AppError::Forbidden("You cannot vote on your own comment".to_string()));
    }

    let existing: Option<String> = sqlx::query_scalar(
        "SELECT vote_type FROM comment_votes WHERE comment_id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(comment_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;
    let existing = existing.as_deref().and_then(VoteType::parse);

    let (next, delta) = transition(existing, action);

    match (existing, next) {
        (_, None) => {
            sqlx::query("DELETE FROM comment_votes WHERE comment_id = $1 AND user_id = $2")
                .bind(comment_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        (None, Some(vote)) => {
            sqlx::query("INSERT INTO comment_votes (comment_id, user_id, vote_type) VALUES ($1, $2, $3)")
                .bind(comment_id)
                .bind(user_id)
                .bind(vote.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        // Concurrent request for the same (comment, user) pair
                        return AppError::Conflict("Vote already registered".to_string());
                    }
                    AppError::InternalServerError(e.to_string())
                })?;
        }
        (Some(_), Some(vote)) => {
            sqlx::query("UPDATE comment_votes SET vote_type = $1 WHERE comment_id = $2 AND user_id = $3")
                .bind(vote.as_str())
                .bind(comment_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    let points: i32 = sqlx::query_scalar("UPDATE comments SET points = points + $1 WHERE id = $2 RETURNING points")
        .bind(delta)
        .bind(comment_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(json!({
        "id": comment_id,
        "points": points,
        "voted_by_me": next.map(|v| v.as_str()),
    })))
}
