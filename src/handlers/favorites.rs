// src/handlers/favorites.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::{AppError, conflict_on_unique},
    handlers::{notebooks::owned_notebook, questions::questions_by_id},
    models::{
        favorite::{FavoriteRequest, FavoriteResponse, FavoriteRow},
        question::QuestionResponse,
    },
    utils::jwt::Claims,
};

const FAVORITE_SELECT: &str = r#"
    SELECT f.id, f.user_id, f.question_id, f.notebook_id, f.favorited_at, n.nome AS notebook_name
    FROM favorite_questions f
    JOIN notebooks n ON n.id = f.notebook_id
"#;

/// Attaches the full question to each favorite row.
async fn with_questions(pool: &PgPool, rows: Vec<FavoriteRow>) -> Result<Vec<FavoriteResponse>, AppError> {
    let ids: Vec<i64> = rows.iter().map(|r| r.question_id).collect();
    let questions = questions_by_id(pool, &ids).await?;

    // The same question may be favorited in several notebooks.
    Ok(rows
        .into_iter()
        .map(|row| {
            let question = questions
                .get(&row.question_id)
                .cloned()
                .map(|q| QuestionResponse::new(q, true));
            FavoriteResponse::from_row(row, question)
        })
        .collect())
}

/// Favorites a question inside one of the user's notebooks.
pub async fn add_favorite(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<FavoriteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    owned_notebook(&pool, payload.notebook_id, user_id).await?;

    let question_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM questions WHERE id = $1)")
            .bind(payload.question_id)
            .fetch_one(&pool)
            .await?;
    if !question_exists {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    let favorite_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO favorite_questions (user_id, question_id, notebook_id)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(payload.question_id)
    .bind(payload.notebook_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Question already favorited in this notebook"))?;

    let row: FavoriteRow = sqlx::query_as(&format!("{FAVORITE_SELECT} WHERE f.id = $1"))
        .bind(favorite_id)
        .fetch_one(&pool)
        .await?;

    let favorite = with_questions(&pool, vec![row])
        .await?
        .into_iter()
        .next()
        .ok_or(AppError::NotFound("Favorite not found".to_string()))?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove_favorite(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((question_id, notebook_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let result = sqlx::query(
        "DELETE FROM favorite_questions WHERE user_id = $1 AND question_id = $2 AND notebook_id = $3",
    )
    .bind(user_id)
    .bind(question_id)
    .bind(notebook_id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Favorite not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Own favorites, newest first, with the question and the notebook name.
pub async fn list_favorites(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let rows: Vec<FavoriteRow> = sqlx::query_as(&format!(
        "{FAVORITE_SELECT} WHERE f.user_id = $1 ORDER BY f.favorited_at DESC, f.id DESC"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list favorites: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(with_questions(&pool, rows).await?))
}
