// src/models/syllabus.rs

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// subject → ordered topics.
pub type Conteudo = BTreeMap<String, Vec<String>>;

/// subject → topic → progress flags.
pub type Marcacoes = BTreeMap<String, BTreeMap<String, MarcacaoTopico>>;

/// Short words skipped when turning topic titles into search terms.
const STOPWORDS: [&str; 7] = ["de", "da", "do", "e", "em", "para", "com"];

/// Study progress of one syllabus topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarcacaoTopico {
    pub completado: bool,
    pub lei_seca: bool,
    pub juris: bool,
    pub questoes: bool,
    pub revisoes: bool,
    pub revisao_numero: Option<i32>,
}

/// Represents the 'verticalized_syllabi' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VerticalizedSyllabus {
    pub id: i64,
    pub user_id: i64,
    pub nome: String,
    pub disciplina: String,
    pub conteudo: Json<Conteudo>,
    pub marcacoes: Json<Marcacoes>,
    pub criado_em: DateTime<Utc>,
}

pub const SYLLABUS_COLUMNS: &str = "id, user_id, nome, disciplina, conteudo, marcacoes, criado_em";

/// Syllabus as served to clients; `titulo` mirrors `nome`.
#[derive(Debug, Clone, Serialize)]
pub struct SyllabusResponse {
    #[serde(flatten)]
    pub syllabus: VerticalizedSyllabus,
    pub titulo: String,
}

impl From<VerticalizedSyllabus> for SyllabusResponse {
    fn from(syllabus: VerticalizedSyllabus) -> Self {
        let titulo = syllabus.nome.clone();
        Self { syllabus, titulo }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSyllabusRequest {
    #[validate(length(min = 1, max = 200))]
    pub nome: String,
    #[validate(length(min = 1, max = 200))]
    pub disciplina: String,
    #[serde(default)]
    pub conteudo: Conteudo,
    #[serde(default)]
    pub marcacoes: Marcacoes,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSyllabusRequest {
    #[validate(length(min = 1, max = 200))]
    pub nome: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub disciplina: Option<String>,
    pub conteudo: Option<Conteudo>,
    pub marcacoes: Option<Marcacoes>,
}

impl UpdateSyllabusRequest {
    pub fn is_empty(&self) -> bool {
        self.nome.is_none()
            && self.disciplina.is_none()
            && self.conteudo.is_none()
            && self.marcacoes.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateNotebookParams {
    pub banca: Option<String>,
}

/// Search terms derived from topic titles: split on `,` and `;`, then keep words longer
/// than two characters that are not stopwords. Deduplicated, case preserved.
pub fn topic_search_terms(conteudo: &Conteudo) -> Vec<String> {
    let mut terms = BTreeSet::new();

    for topic in conteudo.values().flatten() {
        for part in topic.split([',', ';']).map(str::trim).filter(|p| !p.is_empty()) {
            for word in part.split_whitespace() {
                let lower = word.to_lowercase();
                if word.chars().count() > 2 && !STOPWORDS.contains(&lower.as_str()) {
                    terms.insert(word.to_string());
                }
            }
        }
    }

    terms.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marcacao_uses_camel_case_and_defaults() {
        let m: MarcacaoTopico = serde_json::from_str(r#"{"leiSeca": true, "revisaoNumero": 2}"#).unwrap();
        assert!(m.lei_seca);
        assert!(!m.completado);
        assert_eq!(m.revisao_numero, Some(2));

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["leiSeca"], true);
        assert_eq!(json["revisaoNumero"], 2);
    }

    #[test]
    fn search_terms_drop_short_words_and_stopwords() {
        let conteudo = Conteudo::from([(
            "Direito Administrativo".to_string(),
            vec![
                "Atos administrativos; Poder de polícia".to_string(),
                "Licitações, Contratos para obras".to_string(),
            ],
        )]);

        let terms = topic_search_terms(&conteudo);
        assert_eq!(
            terms,
            ["Atos", "Contratos", "Licitações", "Poder", "administrativos", "obras", "polícia"]
        );
    }

    #[test]
    fn response_exposes_titulo() {
        let syllabus = VerticalizedSyllabus {
            id: 1,
            user_id: 2,
            nome: "TRF 2024".into(),
            disciplina: "Geral".into(),
            conteudo: Json(Conteudo::new()),
            marcacoes: Json(Marcacoes::new()),
            criado_em: Utc::now(),
        };
        let json = serde_json::to_value(SyllabusResponse::from(syllabus)).unwrap();
        assert_eq!(json["titulo"], "TRF 2024");
        assert_eq!(json["nome"], "TRF 2024");
    }
}
