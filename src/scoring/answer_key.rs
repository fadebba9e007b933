// src/scoring/answer_key.rs

use serde::{Deserialize, Serialize};

/// Question family. Decides which answer keys are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    Multipla,
    CertoErrado,
}

impl QuestionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "multipla" => Some(Self::Multipla),
            "certo_errado" => Some(Self::CertoErrado),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Multipla => "multipla",
            Self::CertoErrado => "certo_errado",
        }
    }
}

/// A parsed gabarito.
///
/// Two projections exist and must not be mixed up:
/// * `selection_index` is 0-based (A→0 … E→4) and is what submitted answers are compared to.
/// * `option_id` is 1-based (A→1 … E→5) and matches the ids produced by the alternative formatter.
///
/// Certo/Errado project to 1/0 in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKey {
    /// Letter position, 0 = A.
    Letter(u8),
    Certo,
    Errado,
}

impl AnswerKey {
    /// Trimmed, case-insensitive parse. Unknown values have no mapping.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_uppercase();
        match normalized.as_str() {
            "A" => Some(Self::Letter(0)),
            "B" => Some(Self::Letter(1)),
            "C" => Some(Self::Letter(2)),
            "D" => Some(Self::Letter(3)),
            "E" => Some(Self::Letter(4)),
            "CERTO" => Some(Self::Certo),
            "ERRADO" => Some(Self::Errado),
            _ => None,
        }
    }

    /// Parses a key and rejects it when it belongs to the other question family.
    pub fn for_question(raw: &str, kind: QuestionKind) -> Option<Self> {
        Self::parse(raw).filter(|key| key.kind() == kind)
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            Self::Letter(_) => QuestionKind::Multipla,
            Self::Certo | Self::Errado => QuestionKind::CertoErrado,
        }
    }

    pub fn selection_index(&self) -> i32 {
        match self {
            Self::Letter(n) => i32::from(*n),
            Self::Certo => 1,
            Self::Errado => 0,
        }
    }

    pub fn option_id(&self) -> i32 {
        match self {
            Self::Letter(n) => i32::from(*n) + 1,
            Self::Certo => 1,
            Self::Errado => 0,
        }
    }

    /// True when a submitted 0-based index matches this key.
    pub fn matches(&self, selected: i32) -> bool {
        selected >= 0 && selected == self.selection_index()
    }
}

/// Validates the stored gabarito shape for a question type (used by admin create/update).
pub fn is_valid_gabarito(raw: &str, tipo: &str) -> bool {
    match QuestionKind::parse(tipo) {
        Some(kind) => AnswerKey::for_question(raw, kind).is_some(),
        None => false,
    }
}
