// src/handlers/study_plan.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::DEFAULT_WEEKLY_HOURS,
    error::AppError,
    handlers::syllabus::owned_syllabus,
    models::{
        calendar::{CALENDAR_COLUMNS, CalendarRequest, CalendarResponse, StudyCalendar, StudyPlanParams},
        syllabus::{SYLLABUS_COLUMNS, SyllabusResponse, VerticalizedSyllabus},
    },
    scoring::study_hours::{SubjectLoad, suggest_hours},
    utils::jwt::Claims,
};

fn calendar_response(calendar: StudyCalendar, syllabus: VerticalizedSyllabus) -> CalendarResponse {
    CalendarResponse {
        calendar,
        titulo_edital: syllabus.nome.clone(),
        edital: SyllabusResponse::from(syllabus),
    }
}

/// Syllabi of the current user that already have a calendar.
pub async fn planned_syllabi(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let syllabi: Vec<VerticalizedSyllabus> = sqlx::query_as(&format!(
        r#"
        SELECT {SYLLABUS_COLUMNS} FROM verticalized_syllabi s
        WHERE s.user_id = $1
          AND EXISTS (SELECT 1 FROM study_calendar c WHERE c.edital_id = s.id AND c.user_id = $1)
        ORDER BY s.criado_em DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(syllabi.into_iter().map(SyllabusResponse::from).collect::<Vec<_>>()))
}

/// Weekly hours per subject, weighted by topic count plus the board's question count.
pub async fn suggest_study_hours(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(edital_id): Path<i64>,
    Query(params): Query<StudyPlanParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let horas_semana = params.horas_semana.unwrap_or(DEFAULT_WEEKLY_HOURS);
    if horas_semana <= 0 {
        return Err(AppError::BadRequest("horas_semana must be positive".to_string()));
    }

    let syllabus = owned_syllabus(&pool, edital_id, user_id).await?;
    let materias: Vec<String> = syllabus.conteudo.keys().cloned().collect();

    let per_subject: HashMap<String, i64> = match params
        .banca
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
    {
        Some(banca) => {
            let rows: Vec<(String, i64)> = sqlx::query_as(
                r#"
                SELECT materia, COUNT(*) FROM questions
                WHERE banca = $1 AND materia = ANY($2)
                GROUP BY materia
                "#,
            )
            .bind(banca)
            .bind(&materias)
            .fetch_all(&pool)
            .await?;
            rows.into_iter().collect()
        }
        None => HashMap::new(),
    };

    let loads: Vec<SubjectLoad> = syllabus
        .conteudo
        .iter()
        .map(|(materia, topicos)| SubjectLoad {
            materia: materia.clone(),
            topicos: topicos.len() as i64,
            questoes_banca: per_subject.get(materia).copied().unwrap_or(0),
        })
        .collect();

    Ok(Json(json!({
        "sugestoes": suggest_hours(&loads, horas_semana as f64),
    })))
}

/// Every calendar of the current user with its syllabus.
pub async fn list_calendars(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let calendars: Vec<StudyCalendar> = sqlx::query_as(&format!(
        "SELECT {CALENDAR_COLUMNS} FROM study_calendar WHERE user_id = $1 ORDER BY updated_at DESC"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let syllabi: Vec<VerticalizedSyllabus> = sqlx::query_as(&format!(
        "SELECT {SYLLABUS_COLUMNS} FROM verticalized_syllabi WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_all(&pool)
    .await?;
    let mut syllabi: HashMap<i64, VerticalizedSyllabus> =
        syllabi.into_iter().map(|s| (s.id, s)).collect();

    let response: Vec<CalendarResponse> = calendars
        .into_iter()
        .filter_map(|calendar| {
            let syllabus = syllabi.remove(&calendar.edital_id)?;
            Some(calendar_response(calendar, syllabus))
        })
        .collect();

    Ok(Json(response))
}

pub async fn get_calendar(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(edital_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let syllabus = owned_syllabus(&pool, edital_id, user_id).await?;

    let calendar: StudyCalendar = sqlx::query_as(&format!(
        "SELECT {CALENDAR_COLUMNS} FROM study_calendar WHERE user_id = $1 AND edital_id = $2"
    ))
    .bind(user_id)
    .bind(edital_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Study calendar not found".to_string()))?;

    Ok(Json(calendar_response(calendar, syllabus)))
}

/// Creates the calendar of a syllabus or replaces its content.
pub async fn save_calendar(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(edital_id): Path<i64>,
    Json(payload): Json<CalendarRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;
    let syllabus = owned_syllabus(&pool, edital_id, user_id).await?;

    let calendar: StudyCalendar = sqlx::query_as(&format!(
        r#"
        INSERT INTO study_calendar (user_id, edital_id, data, data_inicio, data_fim)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, edital_id) DO UPDATE SET
            data = EXCLUDED.data,
            data_inicio = EXCLUDED.data_inicio,
            data_fim = EXCLUDED.data_fim,
            updated_at = NOW()
        RETURNING {CALENDAR_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(edital_id)
    .bind(SqlJson(&payload.data))
    .bind(payload.data_inicio)
    .bind(payload.data_fim)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save study calendar: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(calendar_response(calendar, syllabus)))
}
