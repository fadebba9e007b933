// src/handlers/questions.rs

use std::collections::{HashMap, HashSet};

use axum::{
    Extension, Json,
    extract::{Path, Query, RawQuery, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::{
    config::{SEARCH_DEFAULT_LIMIT, SEARCH_PREVIEW_LIMIT},
    error::AppError,
    models::{
        filters::QuestionFilters,
        notebook::ProgressRow,
        question::{
            DISTINCT_FIELDS, QUESTION_COLUMNS, Question, QuestionKeyRow, QuestionResponse,
            QuestionStatistics, SearchParams, StatisticsUpdateRequest,
        },
    },
    scoring::{QuestionKey, progress::attempts_on},
    utils::jwt::Claims,
};

/// Scoring keys for the given ids. Unknown ids are simply absent from the map.
pub(crate) async fn question_keys<'e, E>(
    executor: E,
    ids: &[i64],
) -> Result<HashMap<i64, QuestionKey>, AppError>
where
    E: PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<QuestionKeyRow> = sqlx::query_as(
        "SELECT id, materia, assunto, gabarito, tipo FROM questions WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load answer keys: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(rows.into_iter().map(QuestionKeyRow::into_entry).collect())
}

/// Full question rows for the given ids, keyed by id.
pub(crate) async fn questions_by_id<'e, E>(
    executor: E,
    ids: &[i64],
) -> Result<HashMap<i64, Question>, AppError>
where
    E: PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<Question> = sqlx::query_as(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|q| (q.id, q)).collect())
}

/// Ids of questions the user has favorited in any notebook.
pub(crate) async fn favorited_ids(pool: &PgPool, user_id: i64) -> Result<HashSet<i64>, AppError> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT DISTINCT question_id FROM favorite_questions WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
    Ok(ids.into_iter().collect())
}

/// Every saved notebook map of a user.
pub(crate) async fn user_progress(pool: &PgPool, user_id: i64) -> Result<Vec<ProgressRow>, AppError> {
    let rows = sqlx::query_as::<_, ProgressRow>(
        "SELECT notebook_id, current_index, respostas FROM notebook_progress WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load notebook progress: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;
    Ok(rows)
}

/// Lists questions with single- or multi-valued filters and `skip`/`limit`.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let (filters, page) = QuestionFilters::from_query(raw.as_deref())?;

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE TRUE"));
    filters.push_conditions(&mut builder);
    builder.push(" ORDER BY id OFFSET ");
    builder.push_bind(page.skip);
    builder.push(" LIMIT ");
    builder.push_bind(page.limit);

    let questions: Vec<Question> = builder.build_query_as().fetch_all(&pool).await.map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let favorites = favorited_ids(&pool, user_id).await?;
    let response: Vec<QuestionResponse> = questions
        .into_iter()
        .map(|q| {
            let fav = favorites.contains(&q.id);
            QuestionResponse::new(q, fav)
        })
        .collect();

    Ok(Json(response))
}

/// Digits search by id, text searches the statement, empty returns the first page.
pub async fn search_questions(
    State(pool): State<PgPool>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.query.unwrap_or_default();
    let query = query.trim();

    let questions: Vec<Question> = if query.is_empty() {
        sqlx::query_as(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id LIMIT $1"
        ))
        .bind(SEARCH_DEFAULT_LIMIT)
        .fetch_all(&pool)
        .await?
    } else if let Ok(id) = query.parse::<i64>() {
        sqlx::query_as(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"))
            .bind(id)
            .fetch_all(&pool)
            .await?
    } else {
        sqlx::query_as(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE enunciado ILIKE $1 ORDER BY id"
        ))
        .bind(format!("%{}%", query))
        .fetch_all(&pool)
        .await?
    };

    let response: Vec<QuestionResponse> = questions.into_iter().map(QuestionResponse::from).collect();
    Ok(Json(response))
}

/// `{count, ids}` for a filter set. A non-empty `search` short-circuits the filters.
pub async fn count_filtered(
    State(pool): State<PgPool>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let search = raw.as_deref().and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, v)| k == "search" && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    });

    let ids: Vec<i64> = if let Some(search) = search {
        if let Ok(id) = search.parse::<i64>() {
            sqlx::query_scalar("SELECT id FROM questions WHERE id = $1")
                .bind(id)
                .fetch_all(&pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT id FROM questions WHERE enunciado ILIKE $1 ORDER BY id LIMIT $2")
                .bind(format!("%{}%", search))
                .bind(SEARCH_PREVIEW_LIMIT)
                .fetch_all(&pool)
                .await?
        }
    } else {
        let (filters, _) = QuestionFilters::from_query(raw.as_deref())?;
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id FROM questions WHERE TRUE");
        filters.push_conditions(&mut builder);
        builder.push(" ORDER BY id");
        builder.build_query_scalar::<i64>().fetch_all(&pool).await?
    };

    Ok(Json(json!({ "count": ids.len(), "ids": ids })))
}

/// Sorted distinct values of an allow-listed column.
pub async fn distinct_field_values(
    State(pool): State<PgPool>,
    Path(field_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let column = DISTINCT_FIELDS
        .iter()
        .find(|c| **c == field_name)
        .ok_or_else(|| AppError::BadRequest(format!("Field '{}' cannot be listed", field_name)))?;

    let values: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT DISTINCT {column}::TEXT FROM questions WHERE {column} IS NOT NULL ORDER BY 1"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list values of {}: {:?}", column, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(values))
}

pub async fn get_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let question: Question = sqlx::query_as(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
    ))
    .bind(question_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let is_favorited: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM favorite_questions WHERE user_id = $1 AND question_id = $2)",
    )
    .bind(user_id)
    .bind(question_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(QuestionResponse::new(question, is_favorited)))
}

async fn load_statistics(pool: &PgPool, question_id: i64) -> Result<QuestionStatistics, AppError> {
    let stats: Option<QuestionStatistics> = sqlx::query_as(
        "SELECT question_id, total_attempts, correct_attempts FROM question_statistics WHERE question_id = $1",
    )
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    Ok(stats.unwrap_or(QuestionStatistics {
        question_id,
        total_attempts: 0,
        correct_attempts: 0,
    }))
}

/// Increments the global counters of a question.
pub(crate) async fn record_attempt<'e, E>(
    executor: E,
    question_id: i64,
    is_correct: bool,
) -> Result<QuestionStatistics, AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as(
        r#"
        INSERT INTO question_statistics (question_id, total_attempts, correct_attempts)
        VALUES ($1, 1, $2)
        ON CONFLICT (question_id) DO UPDATE SET
            total_attempts = question_statistics.total_attempts + 1,
            correct_attempts = question_statistics.correct_attempts + EXCLUDED.correct_attempts
        RETURNING question_id, total_attempts, correct_attempts
        "#,
    )
    .bind(question_id)
    .bind(i32::from(is_correct))
    .fetch_one(executor)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::NotFound("Question not found".to_string())
        }
        _ => {
            tracing::error!("Failed to update question statistics: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })
}

/// Global attempt counters, zeros when nobody answered yet.
pub async fn get_statistics(
    State(pool): State<PgPool>,
    Path(question_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_statistics(&pool, question_id).await?))
}

pub async fn update_statistics(
    State(pool): State<PgPool>,
    Path(question_id): Path<i64>,
    Json(payload): Json<StatisticsUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let stats = record_attempt(&pool, question_id, payload.is_correct).await?;
    Ok(Json(stats))
}

/// Global counters split into the current user's notebook answers and everyone else's.
pub async fn split_statistics(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let total = load_statistics(&pool, question_id).await?;
    let keys = question_keys(&pool, &[question_id]).await?;
    let progress = user_progress(&pool, user_id).await?;

    let usuario = attempts_on(
        progress.iter().map(|p| &p.respostas.0),
        question_id,
        keys.get(&question_id),
    );

    Ok(Json(json!({
        "total": {
            "tentativas": total.total_attempts,
            "acertos": total.correct_attempts,
        },
        "usuario": usuario,
        "outros": {
            "tentativas": (total.total_attempts - usuario.tentativas).max(0),
            "acertos": (total.correct_attempts - usuario.acertos).max(0),
        },
    })))
}
