// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder, postgres::PgArguments, query::QueryAs};
use validator::Validate;

use crate::{
    error::{AppError, conflict_on_unique},
    models::{
        question::{QUESTION_COLUMNS, Question, QuestionPayload, QuestionResponse, QuestionStatusRequest},
        theory::{Theory, TheoryRequest},
        user::{ROLE_COMUM, USER_COLUMNS, User},
    },
    utils::{html::clean_html, jwt::Claims},
};

/// Lists accounts waiting for approval.
/// Admin only.
pub async fn list_pending_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<User> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE is_active = FALSE AND role = $1 ORDER BY created_at"
    ))
    .bind(ROLE_COMUM)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list pending users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

async fn set_active(pool: &PgPool, user_id: i64, active: bool) -> Result<User, AppError> {
    sqlx::query_as(&format!(
        "UPDATE users SET is_active = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
    ))
    .bind(active)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Activates an account.
/// Admin only.
pub async fn approve_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = set_active(&pool, user_id, true).await?;
    tracing::info!("Admin {} approved user {}", claims.username, user.username);
    Ok(Json(user))
}

/// Deactivates an account.
/// Admin only.
pub async fn reject_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = set_active(&pool, user_id, false).await?;
    tracing::info!("Admin {} rejected user {}", claims.username, user.username);
    Ok(Json(user))
}

/// Binds the payload columns in the order used by the insert and update statements ($1..$21).
fn bind_question<'q>(
    query: QueryAs<'q, Postgres, Question, PgArguments>,
    payload: &'q QuestionPayload,
) -> QueryAs<'q, Postgres, Question, PgArguments> {
    query
        .bind(&payload.enunciado)
        .bind(&payload.item_a)
        .bind(&payload.item_b)
        .bind(&payload.item_c)
        .bind(&payload.item_d)
        .bind(&payload.item_e)
        .bind(payload.materia.trim())
        .bind(payload.assunto.trim())
        .bind(payload.banca.trim())
        .bind(&payload.orgao)
        .bind(&payload.cargo)
        .bind(payload.ano)
        .bind(&payload.escolaridade)
        .bind(&payload.dificuldade)
        .bind(&payload.regiao)
        .bind(payload.gabarito.trim())
        .bind(&payload.informacoes)
        .bind(&payload.comentario_professor)
        .bind(&payload.tipo)
        .bind(payload.is_anulada)
        .bind(payload.is_desatualizada)
}

/// Adds a question to the bank.
/// Admin only.
pub async fn create_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sql = format!(
        r#"
        INSERT INTO questions (
            enunciado, item_a, item_b, item_c, item_d, item_e,
            materia, assunto, banca, orgao, cargo, ano, escolaridade, dificuldade, regiao,
            gabarito, informacoes, comentario_professor, tipo, is_anulada, is_desatualizada
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
        RETURNING {QUESTION_COLUMNS}
        "#
    );

    let question = bind_question(sqlx::query_as(&sql), &payload)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    tracing::info!("Admin {} created question {}", claims.username, question.id);
    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

/// Replaces every field of a question.
/// Admin only.
pub async fn replace_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
    Json(payload): Json<QuestionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let sql = format!(
        r#"
        UPDATE questions SET
            enunciado = $1, item_a = $2, item_b = $3, item_c = $4, item_d = $5, item_e = $6,
            materia = $7, assunto = $8, banca = $9, orgao = $10, cargo = $11, ano = $12,
            escolaridade = $13, dificuldade = $14, regiao = $15, gabarito = $16,
            informacoes = $17, comentario_professor = $18, tipo = $19,
            is_anulada = $20, is_desatualizada = $21
        WHERE id = $22
        RETURNING {QUESTION_COLUMNS}
        "#
    );

    let question = bind_question(sqlx::query_as(&sql), &payload)
        .bind(question_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    tracing::info!("Admin {} replaced question {}", claims.username, question_id);
    Ok(Json(QuestionResponse::from(question)))
}

/// Flags a question as annulled and/or outdated.
/// Admin only.
pub async fn update_question_status(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
    Json(payload): Json<QuestionStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.is_anulada.is_none() && payload.is_desatualizada.is_none() {
        return Err(AppError::BadRequest(
            "Provide is_anulada and/or is_desatualizada".to_string(),
        ));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut set = builder.separated(", ");
    if let Some(anulada) = payload.is_anulada {
        set.push("is_anulada = ").push_bind_unseparated(anulada);
    }
    if let Some(desatualizada) = payload.is_desatualizada {
        set.push("is_desatualizada = ").push_bind_unseparated(desatualizada);
    }
    builder.push(" WHERE id = ").push_bind(question_id);
    builder.push(format!(" RETURNING {QUESTION_COLUMNS}"));

    let question: Question = builder
        .build_query_as()
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    tracing::info!(
        "Admin {} set status of question {} (anulada={}, desatualizada={})",
        claims.username,
        question_id,
        question.is_anulada,
        question.is_desatualizada
    );
    Ok(Json(QuestionResponse::from(question)))
}

/// Deletes a question. Statistics, favorites, notes and comments cascade.
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(question_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    tracing::info!("Admin {} deleted question {}", claims.username, question_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Creates the article for (materia, assunto), or replaces its content.
/// Admin only.
pub async fn upsert_theory(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<TheoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let theory: Theory = sqlx::query_as(
        r#"
        INSERT INTO theories (materia, assunto, content)
        VALUES ($1, $2, $3)
        ON CONFLICT (materia, assunto) DO UPDATE SET content = EXCLUDED.content
        RETURNING id, materia, assunto, content
        "#,
    )
    .bind(payload.materia.trim())
    .bind(payload.assunto.trim())
    .bind(clean_html(&payload.content))
    .fetch_one(&pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Theory already exists"))?;

    tracing::info!(
        "Admin {} saved theory {} / {}",
        claims.username,
        theory.materia,
        theory.assunto
    );
    Ok(Json(theory))
}

/// Admin only.
pub async fn delete_theory(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((materia, assunto)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query(
        "DELETE FROM theories WHERE LOWER(TRIM(materia)) = LOWER(TRIM($1)) AND LOWER(TRIM(assunto)) = LOWER(TRIM($2))",
    )
    .bind(&materia)
    .bind(&assunto)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Theory not found".to_string()));
    }

    tracing::info!("Admin {} deleted theory {} / {}", claims.username, materia, assunto);
    Ok(StatusCode::NO_CONTENT)
}
