// src/handlers/simulados.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::questions::questions_by_id,
    models::{
        filters::QuestionFilters,
        question::{QUESTION_COLUMNS, Question},
        simulado::{
            QuestaoFeedback, QuestaoSimulado, ResultadoSimulado, SIMULADO_COLUMNS, STATUS_CRIADO,
            STATUS_FINALIZADO, Simulado, SimuladoConfig, SimuladoCreated, SimuladoOverview,
            SubmitRequest,
        },
    },
    scoring::{
        QuestionKey,
        history::{SimuladoSnapshot, summarize},
        tally::{is_basic_subject, tally},
    },
    utils::{html::strip_p_tags, jwt::Claims},
};

fn tipo_label(materia: &str) -> &'static str {
    if is_basic_subject(materia) { "basico" } else { "especifico" }
}

fn to_questao(question: &Question) -> QuestaoSimulado {
    QuestaoSimulado {
        id: question.id,
        content: strip_p_tags(&question.enunciado),
        alternativas: question.alternatives(),
        correct_alternative_id: question.answer_key().map(|k| k.option_id()),
        materia: question.materia.clone(),
        assunto: question.assunto.clone(),
        tipo: tipo_label(&question.materia),
    }
}

/// Builds a simulado: for every subject block, draws `quantidade_total` random questions
/// matching its filters. A question is never drawn twice in the same simulado.
pub async fn generate_simulado(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SimuladoConfig>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let mut selected: Vec<Question> = Vec::new();

    for config in &payload.materias_config {
        let assuntos = config.assuntos.iter().map(|a| a.assunto.trim().to_string()).collect();
        let filters = config
            .additional_filters
            .clone()
            .unwrap_or_default()
            .into_filters(config.materia.trim(), assuntos);

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE TRUE"));
        filters.push_conditions(&mut builder);
        if !selected.is_empty() {
            builder.push(" AND id <> ALL(");
            builder.push_bind(selected.iter().map(|q| q.id).collect::<Vec<i64>>());
            builder.push(")");
        }
        builder.push(" ORDER BY RANDOM() LIMIT ");
        builder.push_bind(config.quantidade_total);

        let drawn: Vec<Question> = builder.build_query_as().fetch_all(&pool).await.map_err(|e| {
            tracing::error!("Failed to draw questions for {}: {:?}", config.materia, e);
            AppError::InternalServerError(e.to_string())
        })?;

        if (drawn.len() as i64) < config.quantidade_total {
            return Err(AppError::BadRequest(format!(
                "Not enough questions for {} ({} available, {} requested)",
                config.materia,
                drawn.len(),
                config.quantidade_total
            )));
        }
        selected.extend(drawn);
    }

    let questoes_ids: Vec<i64> = selected.iter().map(|q| q.id).collect();

    let simulado_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO simulados (user_id, status, tempo_limite, total_questoes, questoes_ids)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(STATUS_CRIADO)
    .bind(payload.tempo_limite_minutos * 60)
    .bind(questoes_ids.len() as i32)
    .bind(SqlJson(&questoes_ids))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create simulado: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(
        "User {} generated simulado {} with {} questions",
        claims.username,
        simulado_id,
        questoes_ids.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(SimuladoCreated {
            id: simulado_id,
            questoes: selected.iter().map(to_questao).collect(),
            tempo_limite_minutos: payload.tempo_limite_minutos,
            status: STATUS_CRIADO,
        }),
    ))
}

/// Scores a simulado exactly once and stores the result.
///
/// Every question of the simulado is compared; a question without a submitted answer
/// counts as wrong, answers for questions outside the simulado are ignored, and questions
/// deleted since generation are skipped.
pub async fn submit_simulado(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(simulado_id): Path<i64>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let simulado: Simulado = sqlx::query_as(&format!(
        "SELECT {SIMULADO_COLUMNS} FROM simulados WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(simulado_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Simulado not found".to_string()))?;

    if simulado.is_finalizado() {
        return Err(AppError::BadRequest("Simulado already submitted".to_string()));
    }

    let submitted: HashMap<i64, Option<i32>> = payload
        .answers
        .iter()
        .map(|a| (a.question_id, a.selected_alternative_id))
        .collect();

    let pairs: Vec<(i64, Option<i32>)> = simulado
        .questoes_ids
        .iter()
        .map(|id| (*id, submitted.get(id).copied().flatten()))
        .collect();

    let questions = questions_by_id(&mut *tx, &simulado.questoes_ids).await?;
    let keys: HashMap<i64, QuestionKey> = questions
        .iter()
        .map(|(id, q)| (*id, q.scoring_key()))
        .collect();

    let scored = tally(&pairs, &keys);
    let percentual = scored.percentual();

    let feedback: Vec<QuestaoFeedback> = scored
        .items
        .iter()
        .filter_map(|item| {
            let question = questions.get(&item.question_id)?;
            Some(QuestaoFeedback {
                question_id: item.question_id,
                is_correct: item.is_correct,
                selected_alternative_id: (item.selected >= 0).then_some(item.selected),
                correct_alternative_id: question.answer_key().map(|k| k.option_id()),
                content: strip_p_tags(&question.enunciado),
                alternatives: question.alternatives(),
            })
        })
        .collect();

    sqlx::query(
        r#"
        UPDATE simulados SET
            status = $1,
            data_submissao = NOW(),
            tempo_utilizado = $2,
            acertos_total = $3,
            erros_total = $4,
            percentual_acerto = $5,
            acertos_basicos = $6,
            erros_basicos = $7,
            acertos_especificos = $8,
            erros_especificos = $9,
            acertos_por_materia = $10,
            erros_por_materia = $11,
            acertos_por_assunto = $12,
            erros_por_assunto = $13,
            respostas_usuario = $14
        WHERE id = $15
        "#,
    )
    .bind(STATUS_FINALIZADO)
    .bind(payload.time_taken_seconds)
    .bind(scored.acertos)
    .bind(scored.erros)
    .bind(percentual)
    .bind(scored.acertos_basicos)
    .bind(scored.erros_basicos)
    .bind(scored.acertos_especificos)
    .bind(scored.erros_especificos)
    .bind(SqlJson(&scored.acertos_por_materia))
    .bind(SqlJson(&scored.erros_por_materia))
    .bind(SqlJson(&scored.acertos_por_assunto))
    .bind(SqlJson(&scored.erros_por_assunto))
    .bind(SqlJson(&payload.answers))
    .bind(simulado_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store result of simulado {}: {:?}", simulado_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    if !scored.items.is_empty() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO respostas_simulado \
             (simulado_id, question_id, selected_alternative_id, correct_alternative_id, is_correct, materia, tipo) ",
        );
        builder.push_values(&scored.items, |mut row, item| {
            let correct = questions
                .get(&item.question_id)
                .and_then(Question::answer_key)
                .map(|k| k.option_id());
            row.push_bind(simulado_id)
                .push_bind(item.question_id)
                .push_bind(item.selected)
                .push_bind(correct)
                .push_bind(item.is_correct)
                .push_bind(item.materia.clone())
                .push_bind(tipo_label(&item.materia));
        });
        builder.build().execute(&mut *tx).await?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    tracing::info!(
        "User {} submitted simulado {}: {}/{} correct",
        claims.username,
        simulado_id,
        scored.acertos,
        scored.compared
    );

    Ok(Json(ResultadoSimulado {
        simulado_id,
        tempo_limite: simulado.tempo_limite,
        tempo_utilizado: payload.time_taken_seconds,
        acertos_total: scored.acertos,
        erros_total: scored.erros,
        percentual_acerto: percentual,
        feedback_questoes: feedback,
        acertos_basicos: scored.acertos_basicos,
        erros_basicos: scored.erros_basicos,
        acertos_especificos: scored.acertos_especificos,
        erros_especificos: scored.erros_especificos,
        acertos_por_materia: scored.acertos_por_materia,
        erros_por_materia: scored.erros_por_materia,
        acertos_por_assunto: scored.acertos_por_assunto,
        erros_por_assunto: scored.erros_por_assunto,
    }))
}

pub async fn list_simulados(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let simulados: Vec<SimuladoOverview> = sqlx::query_as(
        r#"
        SELECT id, status, data_realizacao, data_submissao, tempo_limite, tempo_utilizado,
               total_questoes, acertos_total, erros_total, percentual_acerto
        FROM simulados
        WHERE user_id = $1
        ORDER BY data_realizacao DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list simulados: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(simulados))
}

/// Dashboard over the stored results of finalized simulados.
pub async fn simulado_statistics(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let simulados: Vec<Simulado> = sqlx::query_as(&format!(
        "SELECT {SIMULADO_COLUMNS} FROM simulados WHERE user_id = $1 AND status = $2"
    ))
    .bind(user_id)
    .bind(STATUS_FINALIZADO)
    .fetch_all(&pool)
    .await?;

    let snapshots: Vec<SimuladoSnapshot> = simulados.iter().map(SimuladoSnapshot::from).collect();
    Ok(Json(summarize(&snapshots)))
}

/// `{total_questoes}` available for a filter set. List filters may repeat.
pub async fn count_questions(
    State(pool): State<PgPool>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let (filters, _) = QuestionFilters::from_query(raw.as_deref())?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM questions WHERE TRUE");
    filters.push_conditions(&mut builder);
    let total: i64 = builder.build_query_scalar::<i64>().fetch_one(&pool).await?;

    Ok(Json(json!({ "total_questoes": total })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_subjects_are_labelled_basico() {
        assert_eq!(tipo_label("Português"), "basico");
        assert_eq!(tipo_label("Direito Constitucional"), "basico");
        assert_eq!(tipo_label("Direito Tributário"), "especifico");
        assert_eq!(tipo_label("português"), "especifico");
    }
}
