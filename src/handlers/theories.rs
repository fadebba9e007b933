// src/handlers/theories.rs

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::theory::{Theory, TheoryLookup, group_metadata},
};

/// Without `materia` and `assunto` this lists the available articles grouped by subject.
/// With both it returns the matching article, compared trimmed and case-insensitively.
pub async fn get_theories(
    State(pool): State<PgPool>,
    Query(params): Query<TheoryLookup>,
) -> Result<Response, AppError> {
    match (params.materia.as_deref(), params.assunto.as_deref()) {
        (Some(materia), Some(assunto)) => {
            let theory = find_theory(&pool, materia, assunto).await?;
            Ok(Json(theory).into_response())
        }
        (None, None) => {
            let pairs: Vec<(String, String)> =
                sqlx::query_as("SELECT materia, assunto FROM theories ORDER BY materia, assunto")
                    .fetch_all(&pool)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to list theories: {:?}", e);
                        AppError::InternalServerError(e.to_string())
                    })?;
            Ok(Json(group_metadata(pairs)).into_response())
        }
        _ => Err(AppError::BadRequest(
            "materia and assunto must be given together".to_string(),
        )),
    }
}

async fn find_theory(pool: &PgPool, materia: &str, assunto: &str) -> Result<Theory, AppError> {
    sqlx::query_as(
        r#"
        SELECT id, materia, assunto, content
        FROM theories
        WHERE LOWER(TRIM(materia)) = LOWER(TRIM($1))
          AND LOWER(TRIM(assunto)) = LOWER(TRIM($2))
        LIMIT 1
        "#,
    )
    .bind(materia)
    .bind(assunto)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Theory not found".to_string()))
}
