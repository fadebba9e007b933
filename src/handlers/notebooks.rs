// src/handlers/notebooks.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::questions::{
        favorited_ids, question_keys, questions_by_id, record_attempt, user_progress,
    },
    models::{
        notebook::{
            CreateNotebookRequest, Notebook, NotebookOverview, NotebookProgress, ProgressRow,
            RegisterAnswerRequest, RenameNotebookRequest, ResolveData,
        },
        question::QuestionResponse,
    },
    scoring::progress::{Respostas, referenced_ids, summarize_progress},
    utils::jwt::Claims,
};

const NOTEBOOK_COLUMNS: &str = "id, nome, user_id, questoes_ids, filtros, pai_id";

/// Loads a notebook owned by `user_id`. Someone else's notebook is reported as missing.
pub(crate) async fn owned_notebook(
    pool: &PgPool,
    notebook_id: i64,
    user_id: i64,
) -> Result<Notebook, AppError> {
    sqlx::query_as(&format!(
        "SELECT {NOTEBOOK_COLUMNS} FROM notebooks WHERE id = $1 AND user_id = $2"
    ))
    .bind(notebook_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Notebook not found".to_string()))
}

async fn load_progress(pool: &PgPool, notebook_id: i64) -> Result<Option<ProgressRow>, AppError> {
    let row = sqlx::query_as::<_, ProgressRow>(
        "SELECT notebook_id, current_index, respostas FROM notebook_progress WHERE notebook_id = $1",
    )
    .bind(notebook_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Create a notebook for the current user.
pub async fn create_notebook(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateNotebookRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    if let Some(parent) = payload.pai_id {
        owned_notebook(&pool, parent, user_id).await?;
    }

    let notebook: Notebook = sqlx::query_as(&format!(
        r#"
        INSERT INTO notebooks (nome, user_id, questoes_ids, filtros, pai_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {NOTEBOOK_COLUMNS}
        "#
    ))
    .bind(payload.nome.trim())
    .bind(user_id)
    .bind(SqlJson(&payload.questoes_ids))
    .bind(SqlJson(&payload.filtros))
    .bind(payload.pai_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create notebook: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(notebook)))
}

/// Own notebooks, each with its progress recomputed against the current answer keys.
pub async fn list_notebooks(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let notebooks: Vec<Notebook> = sqlx::query_as(&format!(
        "SELECT {NOTEBOOK_COLUMNS} FROM notebooks WHERE user_id = $1 ORDER BY id"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let progress = user_progress(&pool, user_id).await?;
    let keys = question_keys(&pool, &referenced_ids(progress.iter().map(|p| &p.respostas.0))).await?;
    let empty = Respostas::new();

    let overview: Vec<NotebookOverview> = notebooks
        .into_iter()
        .map(|notebook| {
            let respostas = progress
                .iter()
                .find(|p| p.notebook_id == notebook.id)
                .map_or(&empty, |p| &p.respostas.0);
            let summary = summarize_progress(respostas, &keys);
            NotebookOverview {
                total_questoes: notebook.questoes_ids.len() as i32,
                respondidas: summary.respondidas,
                acertos: summary.acertos,
                notebook,
            }
        })
        .collect();

    Ok(Json(overview))
}

/// Everything the solving screen needs: name, questions in notebook order and the saved progress.
pub async fn resolve_data(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notebook_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let notebook = owned_notebook(&pool, notebook_id, user_id).await?;

    let by_id = questions_by_id(&pool, &notebook.questoes_ids).await?;
    let favorites = favorited_ids(&pool, user_id).await?;

    // Deleted questions drop out; repeated ids repeat.
    let questoes: Vec<QuestionResponse> = notebook
        .questoes_ids
        .iter()
        .filter_map(|id| by_id.get(id))
        .map(|q| QuestionResponse::new(q.clone(), favorites.contains(&q.id)))
        .collect();

    let progresso = load_progress(&pool, notebook_id)
        .await?
        .map(NotebookProgress::from)
        .unwrap_or_default();

    Ok(Json(ResolveData {
        nome: notebook.nome,
        questoes,
        progresso,
    }))
}

pub async fn get_progress(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notebook_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    owned_notebook(&pool, notebook_id, user_id).await?;

    let progress = load_progress(&pool, notebook_id)
        .await?
        .map(NotebookProgress::from)
        .unwrap_or_default();

    Ok(Json(progress))
}

/// Replaces the cursor and the answers map of a notebook.
pub async fn save_progress(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notebook_id): Path<i64>,
    Json(payload): Json<NotebookProgress>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    owned_notebook(&pool, notebook_id, user_id).await?;

    if payload.index < 0 {
        return Err(AppError::BadRequest("index must not be negative".to_string()));
    }

    let row: ProgressRow = sqlx::query_as(
        r#"
        INSERT INTO notebook_progress (notebook_id, user_id, current_index, respostas, updated_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (notebook_id) DO UPDATE SET
            current_index = EXCLUDED.current_index,
            respostas = EXCLUDED.respostas,
            updated_at = NOW()
        RETURNING notebook_id, current_index, respostas
        "#,
    )
    .bind(notebook_id)
    .bind(user_id)
    .bind(payload.index)
    .bind(SqlJson(&payload.respostas))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save progress for notebook {}: {:?}", notebook_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(NotebookProgress::from(row)))
}

/// Registers one answer given inside a notebook in the global question counters.
pub async fn register_answer(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notebook_id): Path<i64>,
    Json(payload): Json<RegisterAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let notebook = owned_notebook(&pool, notebook_id, user_id).await?;

    if !notebook.questoes_ids.contains(&payload.questao_id) {
        return Err(AppError::BadRequest(format!(
            "Question {} is not part of this notebook",
            payload.questao_id
        )));
    }

    let stats = record_attempt(&pool, payload.questao_id, payload.acertou).await?;
    Ok(Json(stats))
}

pub async fn rename_notebook(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notebook_id): Path<i64>,
    Json(payload): Json<RenameNotebookRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let notebook: Notebook = sqlx::query_as(&format!(
        "UPDATE notebooks SET nome = $1 WHERE id = $2 AND user_id = $3 RETURNING {NOTEBOOK_COLUMNS}"
    ))
    .bind(payload.nome.trim())
    .bind(notebook_id)
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Notebook not found".to_string()))?;

    Ok(Json(notebook))
}

/// Deletes a notebook. Progress and favorites go with it.
pub async fn delete_notebook(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(notebook_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let result = sqlx::query("DELETE FROM notebooks WHERE id = $1 AND user_id = $2")
        .bind(notebook_id)
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete notebook: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Notebook not found".to_string()));
    }

    tracing::info!("User {} deleted notebook {}", user_id, notebook_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Creates a notebook and answers with `{message, notebook_id}`.
pub(crate) async fn insert_generated_notebook(
    pool: &PgPool,
    user_id: i64,
    nome: &str,
    questoes_ids: &[i64],
    filtros: serde_json::Value,
) -> Result<serde_json::Value, AppError> {
    let notebook_id: i64 = sqlx::query_scalar(
        "INSERT INTO notebooks (nome, user_id, questoes_ids, filtros) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(nome)
    .bind(user_id)
    .bind(SqlJson(questoes_ids))
    .bind(SqlJson(filtros))
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create generated notebook: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(json!({
        "message": "Caderno criado com sucesso",
        "notebook_id": notebook_id,
    }))
}
