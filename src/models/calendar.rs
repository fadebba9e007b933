// src/models/calendar.rs

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::{Validate, ValidationError};

use crate::models::syllabus::SyllabusResponse;

/// weekday name → ordered study blocks.
pub type Agenda = BTreeMap<String, Vec<StudyBlock>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_block_times"))]
pub struct StudyBlock {
    #[validate(length(min = 1, max = 200))]
    pub materia: String,
    /// "HH:MM"
    pub inicio: String,
    /// "HH:MM"
    pub fim: String,
    #[serde(default)]
    pub comentario: Option<String>,
}

fn parse_hhmm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

fn validate_block_times(block: &StudyBlock) -> Result<(), ValidationError> {
    match (parse_hhmm(&block.inicio), parse_hhmm(&block.fim)) {
        (Some(inicio), Some(fim)) if inicio < fim => Ok(()),
        (Some(_), Some(_)) => Err(ValidationError::new("horario")
            .with_message("inicio must be before fim".into())),
        _ => Err(ValidationError::new("horario").with_message("times must use HH:MM".into())),
    }
}

fn validate_period(request: &CalendarRequest) -> Result<(), ValidationError> {
    match (request.data_inicio, request.data_fim) {
        (Some(inicio), Some(fim)) if inicio > fim => Err(ValidationError::new("periodo")
            .with_message("data_inicio must not be after data_fim".into())),
        _ => Ok(()),
    }
}

fn validate_agenda(agenda: &Agenda) -> Result<(), ValidationError> {
    for blocks in agenda.values() {
        for block in blocks {
            if block.validate().is_err() {
                return Err(ValidationError::new("bloco").with_message(
                    format!("invalid study block for {}", block.materia).into(),
                ));
            }
        }
    }
    Ok(())
}

/// Create-or-update body for a syllabus calendar.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_period"))]
pub struct CalendarRequest {
    #[validate(custom(function = "validate_agenda"))]
    pub data: Agenda,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

/// Represents the 'study_calendar' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudyCalendar {
    pub id: i64,
    pub user_id: i64,
    pub edital_id: i64,
    pub data: Json<Agenda>,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub criado_em: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const CALENDAR_COLUMNS: &str =
    "id, user_id, edital_id, data, data_inicio, data_fim, criado_em, updated_at";

/// Calendar with its syllabus attached.
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    #[serde(flatten)]
    pub calendar: StudyCalendar,
    pub titulo_edital: String,
    pub edital: SyllabusResponse,
}

#[derive(Debug, Deserialize)]
pub struct StudyPlanParams {
    pub banca: Option<String>,
    pub horas_semana: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(inicio: &str, fim: &str) -> StudyBlock {
        StudyBlock {
            materia: "Português".into(),
            inicio: inicio.into(),
            fim: fim.into(),
            comentario: None,
        }
    }

    #[test]
    fn block_times_must_be_ordered_hh_mm() {
        assert!(block("08:00", "09:30").validate().is_ok());
        assert!(block("10:00", "09:00").validate().is_err());
        assert!(block("8h", "9h").validate().is_err());
        assert!(block("25:00", "26:00").validate().is_err());
    }

    #[test]
    fn period_must_not_be_inverted() {
        let request: CalendarRequest = serde_json::from_value(serde_json::json!({
            "data": {"segunda": [{"materia": "RLM", "inicio": "07:00", "fim": "08:00"}]},
            "data_inicio": "2024-06-10",
            "data_fim": "2024-06-01"
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn invalid_block_inside_agenda_is_rejected() {
        let request: CalendarRequest = serde_json::from_value(serde_json::json!({
            "data": {"terca": [{"materia": "RLM", "inicio": "09:00", "fim": "08:00"}]}
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn valid_calendar_passes() {
        let request: CalendarRequest = serde_json::from_value(serde_json::json!({
            "data": {
                "segunda": [
                    {"materia": "RLM", "inicio": "07:00", "fim": "08:00", "comentario": "lista 3"},
                    {"materia": "Português", "inicio": "19:00", "fim": "20:30"}
                ]
            },
            "data_inicio": "2024-06-01",
            "data_fim": "2024-08-01"
        }))
        .unwrap();
        assert!(request.validate().is_ok());
    }
}
