// src/models/theory.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Theory {
    pub id: i64,
    pub materia: String,
    pub assunto: String,
    pub content: String,
}

/// Create-or-update body. (materia, assunto) identifies the article.
#[derive(Debug, Deserialize, Validate)]
pub struct TheoryRequest {
    #[validate(length(min = 1, max = 200))]
    pub materia: String,
    #[validate(length(min = 1, max = 300))]
    pub assunto: String,
    #[validate(length(min = 1, message = "content cannot be empty"))]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct TheoryLookup {
    pub materia: Option<String>,
    pub assunto: Option<String>,
}

/// One subject with the topics that have an article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TheoryMeta {
    pub materia: String,
    pub assuntos: Vec<String>,
}

/// Groups `(materia, assunto)` pairs by subject, topics sorted and deduplicated.
pub fn group_metadata(pairs: Vec<(String, String)>) -> Vec<TheoryMeta> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (materia, assunto) in pairs {
        grouped.entry(materia).or_default().push(assunto);
    }

    grouped
        .into_iter()
        .map(|(materia, mut assuntos)| {
            assuntos.sort();
            assuntos.dedup();
            TheoryMeta { materia, assuntos }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_is_grouped_and_sorted() {
        let meta = group_metadata(vec![
            ("RLM".into(), "Sequências".into()),
            ("Português".into(), "Crase".into()),
            ("RLM".into(), "Lógica".into()),
        ]);

        assert_eq!(
            meta,
            vec![
                TheoryMeta {
                    materia: "Português".into(),
                    assuntos: vec!["Crase".into()],
                },
                TheoryMeta {
                    materia: "RLM".into(),
                    assuntos: vec!["Lógica".into(), "Sequências".into()],
                },
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_metadata() {
        assert!(group_metadata(Vec::new()).is_empty());
    }
}
