// src/models/filters.rs

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::{
    config::{LIST_DEFAULT_LIMIT, LIST_MAX_LIMIT},
    error::AppError,
};

/// Question-bank filters. Every list is OR-ed inside and AND-ed with the others;
/// an empty list means "no restriction".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionFilters {
    pub materia: Option<String>,
    pub assuntos: Vec<String>,
    pub banca: Vec<String>,
    pub orgao: Vec<String>,
    pub cargo: Vec<String>,
    pub ano: Vec<i32>,
    pub escolaridade: Vec<String>,
    pub dificuldade: Vec<String>,
    pub regiao: Vec<String>,
    pub exclude_anuladas: bool,
    pub exclude_desatualizadas: bool,
}

/// `skip` / `limit` taken from the same query string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: LIST_DEFAULT_LIMIT,
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

impl QuestionFilters {
    /// Parses a raw query string. Repeated keys accumulate (`banca=A&banca=B`),
    /// so single-valued and list-valued endpoints share one parser.
    pub fn from_query(raw: Option<&str>) -> Result<(Self, Page), AppError> {
        let mut filters = Self::default();
        let mut page = Page::default();

        let Some(raw) = raw else {
            return Ok((filters, page));
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }

            match key.as_ref() {
                "materia" => filters.materia = Some(value),
                "assunto" | "assuntos" => filters.assuntos.push(value),
                "banca" => filters.banca.push(value),
                "orgao" => filters.orgao.push(value),
                "cargo" => filters.cargo.push(value),
                "escolaridade" => filters.escolaridade.push(value),
                "dificuldade" => filters.dificuldade.push(value),
                "regiao" => filters.regiao.push(value),
                "ano" => {
                    let year = value
                        .parse::<i32>()
                        .map_err(|_| AppError::BadRequest(format!("Invalid ano: {}", value)))?;
                    filters.ano.push(year);
                }
                "exclude_anuladas" => filters.exclude_anuladas = parse_bool(&value),
                "exclude_desatualizadas" => filters.exclude_desatualizadas = parse_bool(&value),
                "skip" => {
                    page.skip = value
                        .parse::<i64>()
                        .map_err(|_| AppError::BadRequest("Invalid skip".to_string()))?
                        .max(0);
                }
                "limit" => {
                    page.limit = value
                        .parse::<i64>()
                        .map_err(|_| AppError::BadRequest("Invalid limit".to_string()))?
                        .clamp(1, LIST_MAX_LIMIT);
                }
                _ => {}
            }
        }

        Ok((filters, page))
    }

    /// Appends ` AND ...` conditions. The builder must already contain a `WHERE` clause.
    pub fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(materia) = &self.materia {
            builder.push(" AND materia = ");
            builder.push_bind(materia.clone());
        }

        for (column, values) in [
            ("assunto", &self.assuntos),
            ("banca", &self.banca),
            ("orgao", &self.orgao),
            ("cargo", &self.cargo),
            ("escolaridade", &self.escolaridade),
            ("dificuldade", &self.dificuldade),
            ("regiao", &self.regiao),
        ] {
            if !values.is_empty() {
                builder.push(format!(" AND {} = ANY(", column));
                builder.push_bind(values.clone());
                builder.push(")");
            }
        }

        if !self.ano.is_empty() {
            builder.push(" AND ano = ANY(");
            builder.push_bind(self.ano.clone());
            builder.push(")");
        }

        if self.exclude_anuladas {
            builder.push(" AND is_anulada = FALSE");
        }
        if self.exclude_desatualizadas {
            builder.push(" AND is_desatualizada = FALSE");
        }
    }
}

/// Extra per-subject filters sent in a simulado configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalFilters {
    pub banca: Vec<String>,
    pub orgao: Vec<String>,
    pub cargo: Vec<String>,
    #[serde(deserialize_with = "deserialize_years")]
    pub ano: Vec<i32>,
    pub escolaridade: Vec<String>,
    pub dificuldade: Vec<String>,
    pub regiao: Vec<String>,
}

impl AdditionalFilters {
    pub fn into_filters(self, materia: &str, assuntos: Vec<String>) -> QuestionFilters {
        QuestionFilters {
            materia: Some(materia.to_string()),
            assuntos,
            banca: self.banca,
            orgao: self.orgao,
            cargo: self.cargo,
            ano: self.ano,
            escolaridade: self.escolaridade,
            dificuldade: self.dificuldade,
            regiao: self.regiao,
            exclude_anuladas: false,
            exclude_desatualizadas: false,
        }
    }
}

/// Years arrive as numbers or as numeric strings depending on the client.
fn deserialize_years<'de, D>(deserializer: D) -> Result<Vec<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Number(i32),
        Text(String),
    }

    let raw: Option<Vec<Year>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|year| match year {
            Year::Number(n) => Ok(n),
            Year::Text(s) => s
                .trim()
                .parse::<i32>()
                .map_err(|_| serde::de::Error::custom(format!("invalid year: {}", s))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_accumulate() {
        let (filters, _) =
            QuestionFilters::from_query(Some("banca=CESPE&banca=FCC&ano=2022&ano=2023&assunto=Crase"))
                .unwrap();
        assert_eq!(filters.banca, ["CESPE", "FCC"]);
        assert_eq!(filters.ano, [2022, 2023]);
        assert_eq!(filters.assuntos, ["Crase"]);
    }

    #[test]
    fn empty_values_and_unknown_keys_are_ignored() {
        let (filters, page) = QuestionFilters::from_query(Some("materia=&foo=bar&orgao=")).unwrap();
        assert_eq!(filters, QuestionFilters::default());
        assert_eq!(page, Page::default());
    }

    #[test]
    fn paging_is_clamped() {
        let (_, page) = QuestionFilters::from_query(Some("skip=-5&limit=100000")).unwrap();
        assert_eq!(page, Page { skip: 0, limit: LIST_MAX_LIMIT });
    }

    #[test]
    fn invalid_year_is_a_bad_request() {
        assert!(matches!(
            QuestionFilters::from_query(Some("ano=dois-mil")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn exclude_flags_parse_as_booleans() {
        let (filters, _) =
            QuestionFilters::from_query(Some("exclude_anuladas=true&exclude_desatualizadas=0")).unwrap();
        assert!(filters.exclude_anuladas);
        assert!(!filters.exclude_desatualizadas);
    }

    #[test]
    fn conditions_bind_every_active_filter() {
        let (filters, _) =
            QuestionFilters::from_query(Some("materia=RLM&banca=FGV&ano=2021&exclude_anuladas=true")).unwrap();
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM questions WHERE TRUE");
        filters.push_conditions(&mut builder);

        let sql = builder.sql();
        assert!(sql.contains("materia = $1"));
        assert!(sql.contains("banca = ANY($2)"));
        assert!(sql.contains("ano = ANY($3)"));
        assert!(sql.contains("is_anulada = FALSE"));
        assert!(!sql.contains("regiao"));
    }

    #[test]
    fn additional_filters_accept_mixed_year_types() {
        let extra: AdditionalFilters =
            serde_json::from_str(r#"{"banca": ["CESPE"], "ano": [2020, "2021"]}"#).unwrap();
        let filters = extra.into_filters("Português", vec!["Crase".into()]);
        assert_eq!(filters.ano, [2020, 2021]);
        assert_eq!(filters.materia.as_deref(), Some("Português"));
        assert!(filters.orgao.is_empty());
    }
}
