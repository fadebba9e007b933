// src/handlers/profile.rs

use std::collections::HashMap;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, types::Json as SqlJson};

use crate::{
    error::AppError,
    handlers::questions::{question_keys, questions_by_id, user_progress},
    models::{
        comment::{LikedCommentResponse, UserCommentResponse},
        favorite::FavoriteResponse,
        question::QuestionResponse,
        user::{USER_COLUMNS, User},
    },
    scoring::{
        QuestionKey,
        progress::{Respostas, answer_pairs, referenced_ids, user_stats},
        tally::tally,
    },
    utils::jwt::Claims,
};

/// Get the current user's account.
pub async fn get_me(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let user: User = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Totals over every notebook the user has answered in.
pub async fn get_my_stats(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let progress = user_progress(&pool, user_id).await?;
    let maps: Vec<&Respostas> = progress.iter().map(|p| &p.respostas.0).collect();
    let keys = question_keys(&pool, &referenced_ids(maps.iter().copied())).await?;

    Ok(Json(user_stats(maps, &keys)))
}

/// Comments written by the current user, newest first.
pub async fn list_my_comments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let comments: Vec<UserCommentResponse> = sqlx::query_as(
        r#"
        SELECT c.id, c.question_id, c.content, c.points, c.created_at, q.materia, q.assunto
        FROM comments c
        JOIN questions q ON q.id = c.question_id
        WHERE c.user_id = $1
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list user comments: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(comments))
}

/// Comments the current user upvoted.
pub async fn list_liked_comments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let comments: Vec<LikedCommentResponse> = sqlx::query_as(
        r#"
        SELECT
            c.id AS comment_id, c.content, c.created_at, c.updated_at,
            q.id AS question_id, q.materia, q.assunto,
            u.username AS autor, u.id AS autor_id
        FROM comment_votes v
        JOIN comments c ON c.id = v.comment_id
        JOIN users u ON u.id = c.user_id
        JOIN questions q ON q.id = c.question_id
        WHERE v.user_id = $1 AND v.vote_type = 'upvote'
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(comments))
}

/// Questions answered wrong inside notebooks, one entry per (notebook, question),
/// shaped like favorites so the client can reuse its list view.
pub async fn list_wrong_questions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let rows: Vec<(i64, String, SqlJson<Respostas>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT p.notebook_id, n.nome, p.respostas, p.updated_at
        FROM notebook_progress p
        JOIN notebooks n ON n.id = p.notebook_id
        WHERE p.user_id = $1
        ORDER BY p.updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let ids = referenced_ids(rows.iter().map(|(_, _, respostas, _)| &respostas.0));
    let questions = questions_by_id(&pool, &ids).await?;
    let keys: HashMap<i64, QuestionKey> =
        questions.iter().map(|(id, q)| (*id, q.scoring_key())).collect();

    let mut wrong = Vec::new();
    for (notebook_id, notebook_name, respostas, updated_at) in rows {
        let scored = tally(&answer_pairs(&respostas.0), &keys);
        for item in scored.items.iter().filter(|item| !item.is_correct) {
            let Some(question) = questions.get(&item.question_id) else {
                continue;
            };
            wrong.push(FavoriteResponse {
                id: 0,
                user_id,
                question_id: item.question_id,
                notebook_id,
                favorited_at: updated_at,
                notebook_name: Some(notebook_name.clone()),
                question: Some(QuestionResponse::from(question.clone())),
            });
        }
    }

    Ok(Json(wrong))
}
