// src/scoring/tally.rs

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::answer_key::{AnswerKey, QuestionKind};

/// Subjects counted as "basic" knowledge. Everything else is "specific". Exact match.
pub const BASIC_SUBJECTS: [&str; 6] = [
    "Português",
    "RLM",
    "Informática",
    "Ética",
    "Direito Administrativo",
    "Direito Constitucional",
];

pub fn is_basic_subject(materia: &str) -> bool {
    BASIC_SUBJECTS.contains(&materia)
}

/// The slice of a question record the aggregator needs.
#[derive(Debug, Clone)]
pub struct QuestionKey {
    pub materia: String,
    pub assunto: String,
    pub key: Option<AnswerKey>,
}

impl QuestionKey {
    pub fn new(materia: &str, assunto: &str, gabarito: &str, tipo: &str) -> Self {
        let kind = QuestionKind::parse(tipo).unwrap_or_default();
        Self {
            materia: materia.to_string(),
            assunto: assunto.to_string(),
            key: AnswerKey::for_question(gabarito, kind),
        }
    }

    /// Absent answers and unmapped keys are never correct.
    pub fn is_correct(&self, answer: Option<i32>) -> bool {
        match (self.key, answer) {
            (Some(key), Some(selected)) => key.matches(selected),
            _ => false,
        }
    }
}

/// Outcome for one compared question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    pub question_id: i64,
    /// Submitted 0-based index, -1 when unanswered.
    pub selected: i32,
    pub is_correct: bool,
    pub materia: String,
    pub assunto: String,
    pub basico: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub compared: i32,
    pub acertos: i32,
    pub erros: i32,
    pub acertos_basicos: i32,
    pub erros_basicos: i32,
    pub acertos_especificos: i32,
    pub erros_especificos: i32,
    pub acertos_por_materia: BTreeMap<String, i32>,
    pub erros_por_materia: BTreeMap<String, i32>,
    pub acertos_por_assunto: BTreeMap<String, i32>,
    pub erros_por_assunto: BTreeMap<String, i32>,
    pub items: Vec<ScoredItem>,
}

impl Tally {
    /// correct / compared × 100, or 0.0 when nothing was compared.
    pub fn percentual(&self) -> f64 {
        percentage(self.acertos, self.compared)
    }
}

pub fn percentage(correct: i32, total: i32) -> f64 {
    if total <= 0 {
        0.0
    } else {
        f64::from(correct) / f64::from(total) * 100.0
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scores `(question_id, selected_index)` pairs against the question records.
///
/// Answers for unknown questions are skipped. A `None` or negative answer is
/// compared and counted wrong.
pub fn tally(answers: &[(i64, Option<i32>)], questions: &HashMap<i64, QuestionKey>) -> Tally {
    let mut out = Tally::default();

    for &(question_id, answer) in answers {
        let Some(question) = questions.get(&question_id) else {
            continue;
        };

        let is_correct = question.is_correct(answer);
        let basico = is_basic_subject(&question.materia);

        out.compared += 1;

        let hit = i32::from(is_correct);
        let miss = i32::from(!is_correct);

        // Both maps get the key even when one side stays at zero.
        *out.acertos_por_materia.entry(question.materia.clone()).or_insert(0) += hit;
        *out.erros_por_materia.entry(question.materia.clone()).or_insert(0) += miss;
        *out.acertos_por_assunto.entry(question.assunto.clone()).or_insert(0) += hit;
        *out.erros_por_assunto.entry(question.assunto.clone()).or_insert(0) += miss;

        match (is_correct, basico) {
            (true, true) => out.acertos_basicos += 1,
            (true, false) => out.acertos_especificos += 1,
            (false, true) => out.erros_basicos += 1,
            (false, false) => out.erros_especificos += 1,
        }
        if is_correct {
            out.acertos += 1;
        }

        out.items.push(ScoredItem {
            question_id,
            selected: answer.unwrap_or(-1),
            is_correct,
            materia: question.materia.clone(),
            assunto: question.assunto.clone(),
            basico,
        });
    }

    out.erros = out.compared - out.acertos;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(entries: &[(i64, &str, &str, &str, &str)]) -> HashMap<i64, QuestionKey> {
        entries
            .iter()
            .map(|&(id, materia, assunto, gabarito, tipo)| {
                (id, QuestionKey::new(materia, assunto, gabarito, tipo))
            })
            .collect()
    }

    #[test]
    fn nothing_compared_gives_zero_percent() {
        let result = tally(&[], &HashMap::new());
        assert_eq!(result.compared, 0);
        assert_eq!(result.percentual(), 0.0);
    }

    #[test]
    fn multipla_and_certo_errado_are_scored_by_selection_index() {
        let questions = bank(&[
            (1, "Português", "Crase", "C", "multipla"),
            (2, "Direito Penal", "Dolo", "Errado", "certo_errado"),
        ]);

        let result = tally(&[(1, Some(2)), (2, Some(0))], &questions);
        assert_eq!(result.acertos, 2);
        assert_eq!(result.erros, 0);
        assert_eq!(result.percentual(), 100.0);
    }

    #[test]
    fn seven_of_ten_is_seventy_percent() {
        let entries: Vec<(i64, &str, &str, &str, &str)> = (1..=10)
            .map(|id| (id, "RLM", "Lógica", "A", "multipla"))
            .collect();
        let questions = bank(&entries);

        let answers: Vec<(i64, Option<i32>)> = (1..=10)
            .map(|id| (id, Some(if id <= 7 { 0 } else { 1 })))
            .collect();

        let result = tally(&answers, &questions);
        assert_eq!(result.acertos, 7);
        assert_eq!(result.erros, 3);
        assert_eq!(result.percentual(), 70.0);
    }

    #[test]
    fn unanswered_counts_as_wrong_and_missing_questions_are_skipped() {
        let questions = bank(&[
            (1, "Informática", "Redes", "B", "multipla"),
            (2, "Informática", "Redes", "B", "multipla"),
        ]);

        let result = tally(&[(1, None), (2, Some(-1)), (99, Some(1))], &questions);
        assert_eq!(result.compared, 2);
        assert_eq!(result.acertos + result.erros, result.compared);
        assert_eq!(result.erros, 2);
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].selected, -1);
    }

    #[test]
    fn unmapped_key_is_counted_wrong_not_an_error() {
        let questions = bank(&[
            (1, "Ética", "Conduta", "X", "multipla"),
            (2, "Ética", "Conduta", "A", "certo_errado"),
        ]);
        let result = tally(&[(1, Some(0)), (2, Some(0))], &questions);
        assert_eq!(result.acertos, 0);
        assert_eq!(result.erros, 2);
    }

    #[test]
    fn basic_and_specific_split_and_maps_get_keys_on_first_encounter() {
        let questions = bank(&[
            (1, "Português", "Crase", "A", "multipla"),
            (2, "Direito Tributário", "ICMS", "Certo", "certo_errado"),
            (3, "Direito Tributário", "IPI", "Certo", "certo_errado"),
        ]);

        let result = tally(&[(1, Some(0)), (2, Some(1)), (3, Some(0))], &questions);

        assert_eq!(result.acertos_basicos, 1);
        assert_eq!(result.erros_basicos, 0);
        assert_eq!(result.acertos_especificos, 1);
        assert_eq!(result.erros_especificos, 1);

        assert_eq!(result.erros_por_materia.get("Português"), Some(&0));
        assert_eq!(result.acertos_por_materia.get("Direito Tributário"), Some(&1));
        assert_eq!(result.erros_por_materia.get("Direito Tributário"), Some(&1));
        assert_eq!(result.acertos_por_assunto.get("IPI"), Some(&0));
        assert_eq!(result.erros_por_assunto.get("IPI"), Some(&1));
    }

    #[test]
    fn basic_subject_match_is_exact() {
        assert!(is_basic_subject("Direito Constitucional"));
        assert!(!is_basic_subject("português"));
        assert!(!is_basic_subject("Direito Civil"));
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(66.66666), 66.67);
        assert_eq!(round2(percentage(1, 3)), 33.33);
    }
}
