// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::scoring::{
    Alternative, AnswerKey, QuestionKey, QuestionKind, answer_key::is_valid_gabarito,
    format_alternatives,
};

/// Column list matching `Question`'s `FromRow` layout.
pub const QUESTION_COLUMNS: &str = "id, enunciado, item_a, item_b, item_c, item_d, item_e, \
    materia, assunto, banca, orgao, cargo, ano, escolaridade, dificuldade, regiao, gabarito, \
    informacoes, comentario_professor, tipo, is_anulada, is_desatualizada";

/// Columns a client may ask distinct values for via `/api/questions/fields/{field_name}`.
pub const DISTINCT_FIELDS: [&str; 9] = [
    "materia",
    "assunto",
    "banca",
    "orgao",
    "cargo",
    "ano",
    "escolaridade",
    "dificuldade",
    "regiao",
];

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub enunciado: String,
    pub item_a: Option<String>,
    pub item_b: Option<String>,
    pub item_c: Option<String>,
    pub item_d: Option<String>,
    pub item_e: Option<String>,
    pub materia: String,
    pub assunto: String,
    pub banca: String,
    pub orgao: Option<String>,
    pub cargo: Option<String>,
    pub ano: Option<i32>,
    pub escolaridade: Option<String>,
    pub dificuldade: Option<String>,
    pub regiao: Option<String>,
    pub gabarito: String,
    pub informacoes: Option<String>,
    #[serde(rename = "comentarioProfessor")]
    pub comentario_professor: Option<String>,
    /// 'multipla' or 'certo_errado'.
    pub tipo: String,
    pub is_anulada: bool,
    pub is_desatualizada: bool,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        QuestionKind::parse(&self.tipo).unwrap_or_default()
    }

    pub fn answer_key(&self) -> Option<AnswerKey> {
        AnswerKey::for_question(&self.gabarito, self.kind())
    }

    pub fn items(&self) -> [Option<&str>; 5] {
        [
            self.item_a.as_deref(),
            self.item_b.as_deref(),
            self.item_c.as_deref(),
            self.item_d.as_deref(),
            self.item_e.as_deref(),
        ]
    }

    pub fn alternatives(&self) -> Vec<Alternative> {
        format_alternatives(self.items())
    }

    pub fn scoring_key(&self) -> QuestionKey {
        QuestionKey::new(&self.materia, &self.assunto, &self.gabarito, &self.tipo)
    }
}

/// Row shape used when only the scoring data of a question is needed.
#[derive(Debug, FromRow)]
pub struct QuestionKeyRow {
    pub id: i64,
    pub materia: String,
    pub assunto: String,
    pub gabarito: String,
    pub tipo: String,
}

impl QuestionKeyRow {
    pub fn into_entry(self) -> (i64, QuestionKey) {
        let key = QuestionKey::new(&self.materia, &self.assunto, &self.gabarito, &self.tipo);
        (self.id, key)
    }
}

/// Question as served to clients: the stored row plus derived fields.
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    #[serde(flatten)]
    pub question: Question,
    pub alternativas: Vec<Alternative>,
    /// 0-based selection index of the right answer.
    pub correta: Option<i32>,
    pub is_favorited: bool,
}

impl QuestionResponse {
    pub fn new(question: Question, is_favorited: bool) -> Self {
        let alternativas = question.alternatives();
        let correta = question.answer_key().map(|k| k.selection_index());
        Self {
            question,
            alternativas,
            correta,
            is_favorited,
        }
    }
}

impl From<Question> for QuestionResponse {
    fn from(question: Question) -> Self {
        Self::new(question, false)
    }
}

fn validate_tipo(tipo: &str) -> Result<(), ValidationError> {
    if QuestionKind::parse(tipo).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("tipo").with_message("tipo must be 'multipla' or 'certo_errado'".into()))
    }
}

fn validate_gabarito(payload: &QuestionPayload) -> Result<(), ValidationError> {
    if is_valid_gabarito(&payload.gabarito, &payload.tipo) {
        Ok(())
    } else {
        Err(ValidationError::new("gabarito")
            .with_message("gabarito does not match the question type".into()))
    }
}

fn default_tipo() -> String {
    QuestionKind::Multipla.as_str().to_string()
}

/// DTO for creating or fully replacing a question. Admin only.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_gabarito"))]
pub struct QuestionPayload {
    #[validate(length(min = 1, message = "enunciado cannot be empty"))]
    pub enunciado: String,
    pub item_a: Option<String>,
    pub item_b: Option<String>,
    pub item_c: Option<String>,
    pub item_d: Option<String>,
    pub item_e: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub materia: String,
    #[validate(length(min = 1, max = 300))]
    pub assunto: String,
    #[validate(length(min = 1, max = 100))]
    pub banca: String,
    pub orgao: Option<String>,
    pub cargo: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub ano: Option<i32>,
    pub escolaridade: Option<String>,
    pub dificuldade: Option<String>,
    pub regiao: Option<String>,
    pub gabarito: String,
    pub informacoes: Option<String>,
    #[serde(rename = "comentarioProfessor", alias = "comentario_professor", default)]
    pub comentario_professor: Option<String>,
    #[serde(default = "default_tipo")]
    #[validate(custom(function = "validate_tipo"))]
    pub tipo: String,
    #[serde(default)]
    pub is_anulada: bool,
    #[serde(default)]
    pub is_desatualizada: bool,
}

/// DTO for flagging a question as annulled / outdated.
#[derive(Debug, Deserialize)]
pub struct QuestionStatusRequest {
    pub is_anulada: Option<bool>,
    pub is_desatualizada: Option<bool>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct QuestionStatistics {
    pub question_id: i64,
    pub total_attempts: i32,
    pub correct_attempts: i32,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsUpdateRequest {
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}
