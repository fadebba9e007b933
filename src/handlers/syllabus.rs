// src/handlers/syllabus.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::notebooks::insert_generated_notebook,
    models::syllabus::{
        CreateSyllabusRequest, GenerateNotebookParams, SYLLABUS_COLUMNS, SyllabusResponse,
        UpdateSyllabusRequest, VerticalizedSyllabus, topic_search_terms,
    },
    utils::jwt::Claims,
};

/// Loads a syllabus owned by `user_id`; anything else is 404.
pub(crate) async fn owned_syllabus(
    pool: &PgPool,
    syllabus_id: i64,
    user_id: i64,
) -> Result<VerticalizedSyllabus, AppError> {
    sqlx::query_as(&format!(
        "SELECT {SYLLABUS_COLUMNS} FROM verticalized_syllabi WHERE id = $1 AND user_id = $2"
    ))
    .bind(syllabus_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Syllabus not found".to_string()))
}

pub async fn create_syllabus(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSyllabusRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let syllabus: VerticalizedSyllabus = sqlx::query_as(&format!(
        r#"
        INSERT INTO verticalized_syllabi (user_id, nome, disciplina, conteudo, marcacoes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {SYLLABUS_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(payload.nome.trim())
    .bind(payload.disciplina.trim())
    .bind(SqlJson(&payload.conteudo))
    .bind(SqlJson(&payload.marcacoes))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create syllabus: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(SyllabusResponse::from(syllabus))))
}

pub async fn list_syllabi(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let syllabi: Vec<VerticalizedSyllabus> = sqlx::query_as(&format!(
        "SELECT {SYLLABUS_COLUMNS} FROM verticalized_syllabi WHERE user_id = $1 ORDER BY criado_em DESC"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(syllabi.into_iter().map(SyllabusResponse::from).collect::<Vec<_>>()))
}

pub async fn get_syllabus(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(syllabus_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let syllabus = owned_syllabus(&pool, syllabus_id, user_id).await?;
    Ok(Json(SyllabusResponse::from(syllabus)))
}

/// Partial update: only the fields present in the body change.
pub async fn update_syllabus(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(syllabus_id): Path<i64>,
    Json(payload): Json<UpdateSyllabusRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    if payload.is_empty() {
        let syllabus = owned_syllabus(&pool, syllabus_id, user_id).await?;
        return Ok(Json(SyllabusResponse::from(syllabus)));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE verticalized_syllabi SET ");
    let mut set = builder.separated(", ");
    if let Some(nome) = &payload.nome {
        set.push("nome = ").push_bind_unseparated(nome.trim().to_string());
    }
    if let Some(disciplina) = &payload.disciplina {
        set.push("disciplina = ").push_bind_unseparated(disciplina.trim().to_string());
    }
    if let Some(conteudo) = payload.conteudo {
        set.push("conteudo = ").push_bind_unseparated(SqlJson(conteudo));
    }
    if let Some(marcacoes) = payload.marcacoes {
        set.push("marcacoes = ").push_bind_unseparated(SqlJson(marcacoes));
    }
    builder.push(" WHERE id = ").push_bind(syllabus_id);
    builder.push(" AND user_id = ").push_bind(user_id);
    builder.push(format!(" RETURNING {SYLLABUS_COLUMNS}"));

    let syllabus: VerticalizedSyllabus = builder
        .build_query_as()
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Syllabus not found".to_string()))?;

    Ok(Json(SyllabusResponse::from(syllabus)))
}

/// Deletes a syllabus and its calendar.
pub async fn delete_syllabus(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(syllabus_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let result = sqlx::query("DELETE FROM verticalized_syllabi WHERE id = $1 AND user_id = $2")
        .bind(syllabus_id)
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete syllabus: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Syllabus not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Builds a notebook with every question whose subject matches a syllabus subject
/// or whose topic contains one of the syllabus topic words. `banca` narrows the match.
pub async fn generate_notebook(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(syllabus_id): Path<i64>,
    Query(params): Query<GenerateNotebookParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let syllabus = owned_syllabus(&pool, syllabus_id, user_id).await?;

    let materias: Vec<String> = syllabus.conteudo.keys().cloned().collect();
    let termos = topic_search_terms(&syllabus.conteudo);

    if materias.is_empty() && termos.is_empty() {
        return Err(AppError::BadRequest(
            "Syllabus has no subjects or topics to search for".to_string(),
        ));
    }

    let materia_patterns: Vec<String> = materias.iter().map(|m| format!("%{}%", m)).collect();
    let termo_patterns: Vec<String> = termos.iter().map(|t| format!("%{}%", t)).collect();

    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT id FROM questions WHERE (materia ILIKE ANY(");
    builder.push_bind(materia_patterns);
    builder.push(") OR assunto ILIKE ANY(");
    builder.push_bind(termo_patterns);
    builder.push("))");
    if let Some(banca) = params.banca.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        builder.push(" AND banca = ").push_bind(banca.to_string());
    }
    builder.push(" ORDER BY id");

    let questoes_ids: Vec<i64> = builder.build_query_scalar::<i64>().fetch_all(&pool).await?;

    if questoes_ids.is_empty() {
        return Err(AppError::NotFound(
            "No questions match the subjects of this syllabus".to_string(),
        ));
    }

    let response = insert_generated_notebook(
        &pool,
        user_id,
        &format!("Caderno - {}", syllabus.nome),
        &questoes_ids,
        json!({ "edital_id": syllabus.id, "materias": materias }),
    )
    .await?;

    tracing::info!(
        "User {} generated a notebook with {} questions from syllabus {}",
        claims.username,
        questoes_ids.len(),
        syllabus_id
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// Subject names of a syllabus, sorted.
pub async fn syllabus_subjects(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(edital_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let syllabus = owned_syllabus(&pool, edital_id, user_id).await?;

    let materias: Vec<String> = syllabus.conteudo.keys().cloned().collect();
    if materias.is_empty() {
        return Err(AppError::NotFound("Syllabus has no subjects".to_string()));
    }

    Ok(Json(materias))
}
