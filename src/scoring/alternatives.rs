// src/scoring/alternatives.rs

use serde::Serialize;

use crate::utils::html::strip_p_tags;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    /// Field position, A = 1 … E = 5. Not renumbered when earlier fields are empty.
    pub id: i32,
    pub text: String,
}

/// Turns the five optional item fields (A..E) into the ordered alternative list.
pub fn format_alternatives(items: [Option<&str>; 5]) -> Vec<Alternative> {
    items
        .iter()
        .enumerate()
        .filter_map(|(pos, item)| {
            let text = strip_p_tags((*item)?);
            if text.is_empty() {
                return None;
            }
            Some(Alternative {
                id: pos as i32 + 1,
                text,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::answer_key::AnswerKey;

    #[test]
    fn full_set_keeps_order_and_strips_markup() {
        let alts = format_alternatives([
            Some("<p>um</p>"),
            Some("dois"),
            Some("<p> três </p>"),
            Some("quatro"),
            Some("cinco"),
        ]);

        let texts: Vec<&str> = alts.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, ["um", "dois", "três", "quatro", "cinco"]);
        assert_eq!(alts.iter().map(|a| a.id).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn missing_fields_are_skipped_without_renumbering() {
        let alts = format_alternatives([Some("a"), None, Some("c"), Some("<p></p>"), Some("e")]);
        assert_eq!(alts.len(), 3);
        assert_eq!(alts.iter().map(|a| a.id).collect::<Vec<_>>(), [1, 3, 5]);
    }

    #[test]
    fn ids_line_up_with_answer_key_option_ids() {
        let alts = format_alternatives([Some("a"), None, Some("c"), Some("d"), None]);
        let key = AnswerKey::parse("D").unwrap();
        let correct = alts.iter().find(|a| a.id == key.option_id()).unwrap();
        assert_eq!(correct.text, "d");
    }

    #[test]
    fn certo_errado_question_has_no_alternatives() {
        assert!(format_alternatives([None, None, None, None, None]).is_empty());
    }
}
