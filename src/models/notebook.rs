// src/models/notebook.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::{
    models::question::QuestionResponse,
    scoring::progress::Respostas,
};

/// Opaque snapshot of the filters a notebook was built from.
pub type Filtros = serde_json::Map<String, serde_json::Value>;

/// Represents the 'notebooks' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notebook {
    pub id: i64,
    pub nome: String,
    pub user_id: i64,
    /// Ordered; duplicates allowed.
    pub questoes_ids: Json<Vec<i64>>,
    pub filtros: Json<Filtros>,
    #[serde(rename = "paiId")]
    pub pai_id: Option<i64>,
}

/// Notebook row with its progress summary, for the listing.
#[derive(Debug, Serialize)]
pub struct NotebookOverview {
    #[serde(flatten)]
    pub notebook: Notebook,
    pub total_questoes: i32,
    pub respondidas: i32,
    pub acertos: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotebookRequest {
    #[validate(length(min = 1, max = 200, message = "nome must be between 1 and 200 characters."))]
    pub nome: String,
    #[serde(default)]
    pub questoes_ids: Vec<i64>,
    #[serde(default)]
    pub filtros: Filtros,
    #[serde(rename = "paiId", alias = "pai_id", default)]
    pub pai_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameNotebookRequest {
    #[validate(length(min = 1, max = 200, message = "nome must be between 1 and 200 characters."))]
    pub nome: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProgressRow {
    pub notebook_id: i64,
    pub current_index: i32,
    pub respostas: Json<Respostas>,
}

/// Progress as exchanged with clients. The cursor column is `current_index` in storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotebookProgress {
    #[serde(default)]
    pub index: i32,
    #[serde(default)]
    pub respostas: Respostas,
}

impl From<ProgressRow> for NotebookProgress {
    fn from(row: ProgressRow) -> Self {
        Self {
            index: row.current_index,
            respostas: row.respostas.0,
        }
    }
}

/// `{questaoId, acertou}` posted when a user answers inside a notebook.
#[derive(Debug, Deserialize)]
pub struct RegisterAnswerRequest {
    #[serde(rename = "questaoId", alias = "questao_id")]
    pub questao_id: i64,
    pub acertou: bool,
}

#[derive(Debug, Serialize)]
pub struct ResolveData {
    pub nome: String,
    pub questoes: Vec<QuestionResponse>,
    pub progresso: NotebookProgress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_defaults_when_fields_missing() {
        let progress: NotebookProgress = serde_json::from_str("{}").unwrap();
        assert_eq!(progress, NotebookProgress::default());
    }

    #[test]
    fn progress_serializes_cursor_as_index() {
        let row = ProgressRow {
            notebook_id: 1,
            current_index: 4,
            respostas: Json(Respostas::from([("12".to_string(), 2)])),
        };
        let json = serde_json::to_value(NotebookProgress::from(row)).unwrap();
        assert_eq!(json["index"], 4);
        assert_eq!(json["respostas"]["12"], 2);
    }

    #[test]
    fn create_request_accepts_parent_alias() {
        let req: CreateNotebookRequest =
            serde_json::from_str(r#"{"nome": "Revisão", "paiId": 3, "questoes_ids": [5, 5, 9]}"#).unwrap();
        assert_eq!(req.pai_id, Some(3));
        assert_eq!(req.questoes_ids, [5, 5, 9]);
        assert!(req.filtros.is_empty());
    }

    #[test]
    fn notebook_serializes_parent_as_pai_id() {
        let notebook = Notebook {
            id: 1,
            nome: "x".into(),
            user_id: 2,
            questoes_ids: Json(vec![1, 2]),
            filtros: Json(Filtros::new()),
            pai_id: None,
        };
        let json = serde_json::to_value(&notebook).unwrap();
        assert!(json.get("paiId").is_some());
        assert_eq!(json["questoes_ids"], serde_json::json!([1, 2]));
    }
}
