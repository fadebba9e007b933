// src/scoring/progress.rs

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::tally::{QuestionKey, percentage, round2, tally};

/// Saved notebook answers: question id (as text) → selected 0-based index.
pub type Respostas = BTreeMap<String, i32>;

/// Converts the saved map into scoring pairs. Keys that are not ids are dropped.
pub fn answer_pairs(respostas: &Respostas) -> Vec<(i64, Option<i32>)> {
    respostas
        .iter()
        .filter_map(|(key, value)| key.trim().parse::<i64>().ok().map(|id| (id, Some(*value))))
        .collect()
}

/// Question ids referenced by a set of saved maps, deduplicated.
pub fn referenced_ids<'a>(maps: impl IntoIterator<Item = &'a Respostas>) -> Vec<i64> {
    let mut ids: Vec<i64> = maps.into_iter().flat_map(answer_pairs).map(|(id, _)| id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub respondidas: i32,
    pub acertos: i32,
}

/// answered = every saved entry; correct = entries whose question still exists and matches.
pub fn summarize_progress(respostas: &Respostas, questions: &HashMap<i64, QuestionKey>) -> ProgressSummary {
    let scored = tally(&answer_pairs(respostas), questions);
    ProgressSummary {
        respondidas: respostas.len() as i32,
        acertos: scored.acertos,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    pub total_questoes_resolvidas: i32,
    pub total_acertos: i32,
    pub total_erros: i32,
    pub percentual_acerto_geral: f64,
    /// materia → assunto → correct answers.
    pub acertos_por_materia: BTreeMap<String, BTreeMap<String, i32>>,
    /// materia → assunto → wrong answers.
    pub erros_por_materia: BTreeMap<String, BTreeMap<String, i32>>,
}

/// Aggregates every saved notebook map of a user.
pub fn user_stats<'a>(
    progresses: impl IntoIterator<Item = &'a Respostas>,
    questions: &HashMap<i64, QuestionKey>,
) -> UserStats {
    let mut stats = UserStats::default();

    for respostas in progresses {
        stats.total_questoes_resolvidas += respostas.len() as i32;

        let scored = tally(&answer_pairs(respostas), questions);
        stats.total_acertos += scored.acertos;

        for item in &scored.items {
            let target = if item.is_correct {
                &mut stats.acertos_por_materia
            } else {
                &mut stats.erros_por_materia
            };
            *target
                .entry(item.materia.clone())
                .or_default()
                .entry(item.assunto.clone())
                .or_insert(0) += 1;
        }
    }

    stats.total_erros = stats.total_questoes_resolvidas - stats.total_acertos;
    stats.percentual_acerto_geral = round2(percentage(
        stats.total_acertos,
        stats.total_questoes_resolvidas,
    ));
    stats
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Attempts {
    pub tentativas: i32,
    pub acertos: i32,
}

/// How often one question appears in a user's saved maps, and how often it was right.
pub fn attempts_on<'a>(
    progresses: impl IntoIterator<Item = &'a Respostas>,
    question_id: i64,
    question: Option<&QuestionKey>,
) -> Attempts {
    let key = question_id.to_string();
    let mut out = Attempts::default();

    for respostas in progresses {
        if let Some(answer) = respostas.get(&key) {
            out.tentativas += 1;
            if question.is_some_and(|q| q.is_correct(Some(*answer))) {
                out.acertos += 1;
            }
        }
    }
    out
}
