// src/models/simulado.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::{
    models::filters::AdditionalFilters,
    scoring::{Alternative, history::SimuladoSnapshot},
};

pub const STATUS_CRIADO: &str = "criado";
pub const STATUS_FINALIZADO: &str = "finalizado";

pub type ScoreMap = BTreeMap<String, i32>;

/// Column list matching `Simulado`'s `FromRow` layout.
pub const SIMULADO_COLUMNS: &str = "id, user_id, status, data_realizacao, data_submissao, \
    tempo_limite, tempo_utilizado, total_questoes, questoes_ids, acertos_total, erros_total, \
    percentual_acerto, acertos_basicos, erros_basicos, acertos_especificos, erros_especificos, \
    acertos_por_materia, erros_por_materia, acertos_por_assunto, erros_por_assunto, respostas_usuario";

/// Represents the 'simulados' table. Score fields are zero until submission,
/// then written once.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Simulado {
    pub id: i64,
    pub user_id: i64,
    pub status: String,
    pub data_realizacao: DateTime<Utc>,
    pub data_submissao: Option<DateTime<Utc>>,
    /// Seconds.
    pub tempo_limite: i32,
    /// Seconds.
    pub tempo_utilizado: i32,
    pub total_questoes: i32,
    pub questoes_ids: Json<Vec<i64>>,
    pub acertos_total: i32,
    pub erros_total: i32,
    pub percentual_acerto: f64,
    pub acertos_basicos: i32,
    pub erros_basicos: i32,
    pub acertos_especificos: i32,
    pub erros_especificos: i32,
    pub acertos_por_materia: Json<ScoreMap>,
    pub erros_por_materia: Json<ScoreMap>,
    pub acertos_por_assunto: Json<ScoreMap>,
    pub erros_por_assunto: Json<ScoreMap>,
    pub respostas_usuario: Json<Vec<SubmittedAnswer>>,
}

impl Simulado {
    pub fn is_finalizado(&self) -> bool {
        self.status == STATUS_FINALIZADO
    }
}

impl From<&Simulado> for SimuladoSnapshot {
    fn from(s: &Simulado) -> Self {
        SimuladoSnapshot {
            id: s.id,
            finalizado: s.is_finalizado(),
            data_realizacao: s.data_realizacao,
            total_questoes: s.total_questoes,
            acertos_total: s.acertos_total,
            erros_total: s.erros_total,
            percentual_acerto: s.percentual_acerto,
            tempo_utilizado: s.tempo_utilizado,
            acertos_basicos: s.acertos_basicos,
            erros_basicos: s.erros_basicos,
            acertos_especificos: s.acertos_especificos,
            erros_especificos: s.erros_especificos,
            acertos_por_materia: s.acertos_por_materia.0.clone(),
            erros_por_materia: s.erros_por_materia.0.clone(),
        }
    }
}

/// Row for the simulado list.
#[derive(Debug, Serialize, FromRow)]
pub struct SimuladoOverview {
    pub id: i64,
    pub status: String,
    pub data_realizacao: DateTime<Utc>,
    pub data_submissao: Option<DateTime<Utc>>,
    pub tempo_limite: i32,
    pub tempo_utilizado: i32,
    pub total_questoes: i32,
    pub acertos_total: i32,
    pub erros_total: i32,
    pub percentual_acerto: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssuntoItem {
    #[validate(length(min = 1))]
    pub assunto: String,
}

/// Per-subject block of a simulado configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MateriaConfig {
    #[validate(length(min = 1))]
    pub materia: String,
    /// Client-side label ('basico' / 'especifico'); the server classifies by subject.
    #[serde(default)]
    pub tipo: Option<String>,
    #[validate(range(min = 1, max = 200))]
    pub quantidade_total: i64,
    #[serde(default)]
    #[validate(nested)]
    pub assuntos: Vec<AssuntoItem>,
    #[serde(default)]
    pub additional_filters: Option<AdditionalFilters>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SimuladoConfig {
    #[validate(range(min = 1, max = 1440))]
    pub tempo_limite_minutos: i32,
    #[validate(length(min = 1, message = "At least one subject is required."), nested)]
    pub materias_config: Vec<MateriaConfig>,
}

/// One generated question as sent to the client.
#[derive(Debug, Serialize)]
pub struct QuestaoSimulado {
    pub id: i64,
    pub content: String,
    pub alternativas: Vec<Alternative>,
    /// 1-based alternative id (Certo = 1, Errado = 0).
    pub correct_alternative_id: Option<i32>,
    pub materia: String,
    pub assunto: String,
    /// 'basico' or 'especifico'.
    pub tipo: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SimuladoCreated {
    pub id: i64,
    pub questoes: Vec<QuestaoSimulado>,
    pub tempo_limite_minutos: i32,
    pub status: &'static str,
}

/// One submitted answer. `selected_alternative_id` is the 0-based selection index, -1 if unanswered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub selected_alternative_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub time_taken_seconds: i32,
}

#[derive(Debug, Serialize)]
pub struct QuestaoFeedback {
    pub question_id: i64,
    pub is_correct: bool,
    /// 0-based, as submitted.
    pub selected_alternative_id: Option<i32>,
    /// 1-based alternative id.
    pub correct_alternative_id: Option<i32>,
    pub content: String,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Serialize)]
pub struct ResultadoSimulado {
    pub simulado_id: i64,
    pub tempo_limite: i32,
    pub tempo_utilizado: i32,
    pub acertos_total: i32,
    pub erros_total: i32,
    pub percentual_acerto: f64,
    pub feedback_questoes: Vec<QuestaoFeedback>,
    pub acertos_basicos: i32,
    pub erros_basicos: i32,
    pub acertos_especificos: i32,
    pub erros_especificos: i32,
    pub acertos_por_materia: ScoreMap,
    pub erros_por_materia: ScoreMap,
    pub acertos_por_assunto: ScoreMap,
    pub erros_por_assunto: ScoreMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_requires_positive_quantities() {
        let config: SimuladoConfig = serde_json::from_value(serde_json::json!({
            "tempo_limite_minutos": 60,
            "materias_config": [{
                "materia": "Português",
                "tipo": "basico",
                "quantidade_total": 0,
                "assuntos": [{"assunto": "Crase"}]
            }]
        }))
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_accepts_additional_filters() {
        let config: SimuladoConfig = serde_json::from_value(serde_json::json!({
            "tempo_limite_minutos": 90,
            "materias_config": [{
                "materia": "RLM",
                "quantidade_total": 5,
                "assuntos": [],
                "additional_filters": {"banca": ["FGV"], "ano": ["2023"]}
            }]
        }))
        .unwrap();
        assert!(config.validate().is_ok());
        let extra = config.materias_config[0].additional_filters.clone().unwrap();
        assert_eq!(extra.banca, ["FGV"]);
        assert_eq!(extra.ano, [2023]);
    }

    #[test]
    fn invalid_subject_block_is_reported_under_its_list() {
        let config: SimuladoConfig = serde_json::from_value(serde_json::json!({
            "tempo_limite_minutos": 30,
            "materias_config": [
                {"materia": "Português", "quantidade_total": 10},
                {"materia": "", "quantidade_total": 5, "assuntos": [{"assunto": ""}]}
            ]
        }))
        .unwrap();

        let errors = config.validate().unwrap_err();
        assert!(errors.errors().contains_key("materias_config"));
    }

    #[test]
    fn empty_config_is_rejected() {
        let config: SimuladoConfig =
            serde_json::from_str(r#"{"tempo_limite_minutos": 30, "materias_config": []}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn submitted_answers_allow_missing_selection() {
        let req: SubmitRequest = serde_json::from_str(
            r#"{"answers": [{"question_id": 1, "selected_alternative_id": -1}, {"question_id": 2, "selected_alternative_id": null}], "time_taken_seconds": 120}"#,
        )
        .unwrap();
        assert_eq!(req.answers[0].selected_alternative_id, Some(-1));
        assert_eq!(req.answers[1].selected_alternative_id, None);
    }
}
