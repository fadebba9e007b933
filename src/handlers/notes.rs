// src/handlers/notes.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::note::{NoteRequest, NoteResponse, NoteUpdateRequest},
    utils::{html::clean_html, jwt::Claims},
};

const NOTE_SELECT: &str = r#"
    SELECT n.id, n.user_id, n.question_id, n.content, n.created_at, n.updated_at,
           q.materia, q.assunto
    FROM question_notes n
    LEFT JOIN questions q ON q.id = n.question_id
"#;

async fn note_by_id(pool: &PgPool, note_id: i64, user_id: i64) -> Result<NoteResponse, AppError> {
    let note: NoteResponse = sqlx::query_as(&format!(
        "{NOTE_SELECT} WHERE n.id = $1 AND n.user_id = $2"
    ))
    .bind(note_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Note not found".to_string()))?;

    Ok(note.titled())
}

/// Every note of the current user, most recently touched first.
pub async fn my_notes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let notes: Vec<NoteResponse> = sqlx::query_as(&format!(
        "{NOTE_SELECT} WHERE n.user_id = $1 ORDER BY COALESCE(n.updated_at, n.created_at) DESC"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list notes: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(notes.into_iter().map(NoteResponse::titled).collect::<Vec<_>>()))
}

pub async fn note_detail(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(note_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(note_by_id(&pool, note_id, user_id).await?))
}

/// The current user's note on a question.
pub async fn note_for_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let note: NoteResponse = sqlx::query_as(&format!(
        "{NOTE_SELECT} WHERE n.user_id = $1 AND n.question_id = $2"
    ))
    .bind(user_id)
    .bind(question_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Note not found".to_string()))?;

    Ok(Json(note.titled()))
}

/// Creates the note for a question, or overwrites its content.
pub async fn upsert_note(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<NoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let note_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO question_notes (user_id, question_id, content)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, question_id) DO UPDATE SET
            content = EXCLUDED.content,
            updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(payload.question_id)
    .bind(clean_html(&payload.content))
    .fetch_one(&pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::NotFound("Question not found".to_string())
        }
        _ => {
            tracing::error!("Failed to save note: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok(Json(note_by_id(&pool, note_id, user_id).await?))
}

/// Updates the content of the given note.
pub async fn update_note(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(note_id): Path<i64>,
    Json(payload): Json<NoteUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let result = sqlx::query(
        "UPDATE question_notes SET content = $1, updated_at = NOW() WHERE id = $2 AND user_id = $3",
    )
    .bind(clean_html(&payload.content))
    .bind(note_id)
    .bind(user_id)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Note not found".to_string()));
    }

    Ok(Json(note_by_id(&pool, note_id, user_id).await?))
}

pub async fn delete_note(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(note_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let result = sqlx::query("DELETE FROM question_notes WHERE id = $1 AND user_id = $2")
        .bind(note_id)
        .bind(user_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Note not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
