// src/scoring/study_hours.rs

use serde::Serialize;

use super::tally::round2;

/// Input row: one syllabus subject with its topic count and how many bank questions
/// the chosen exam board has for it.
#[derive(Debug, Clone)]
pub struct SubjectLoad {
    pub materia: String,
    pub topicos: i64,
    pub questoes_banca: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudySuggestion {
    pub materia: String,
    pub topicos: i64,
    pub questoes_banca: i64,
    pub peso: i64,
    pub horas_sugeridas: f64,
}

/// Splits `weekly_hours` across subjects in proportion to `topicos + questoes_banca`.
///
/// Output is sorted by descending weight; ties keep input order. When every weight is
/// zero all subjects get 0 hours.
///
/// Callers pass subjects from a `Conteudo` map, so tied subjects come out in
/// alphabetical order of the subject name.
pub fn suggest_hours(subjects: &[SubjectLoad], weekly_hours: f64) -> Vec<StudySuggestion> {
    let total: i64 = subjects.iter().map(|s| s.topicos + s.questoes_banca).sum();

    let mut suggestions: Vec<StudySuggestion> = subjects
        .iter()
        .map(|s| {
            let peso = s.topicos + s.questoes_banca;
            let horas_sugeridas = if total > 0 {
                round2(peso as f64 / total as f64 * weekly_hours)
            } else {
                0.0
            };
            StudySuggestion {
                materia: s.materia.clone(),
                topicos: s.topicos,
                questoes_banca: s.questoes_banca,
                peso,
                horas_sugeridas,
            }
        })
        .collect();

    suggestions.sort_by(|a, b| b.peso.cmp(&a.peso));
    suggestions
}
