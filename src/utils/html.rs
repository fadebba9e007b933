use std::sync::LazyLock;

use regex::Regex;

static P_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?p\s*>").unwrap());

/// Whitelist-sanitizes user HTML (comments, notes, theories) before it is stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Removes `<p>` / `</p>` wrappers and trims the result.
pub fn strip_p_tags(input: &str) -> String {
    P_TAG.replace_all(input, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_removed() {
        let cleaned = clean_html("<p>ok</p><script>alert(1)</script>");
        assert!(cleaned.contains("<p>ok</p>"));
        assert!(!cleaned.contains("script"));
    }

    #[test]
    fn paragraph_wrappers_are_stripped() {
        assert_eq!(strip_p_tags("<p>  Brasília </p>"), "Brasília");
        assert_eq!(strip_p_tags("<P>a</P><p>b</p>"), "ab");
        assert_eq!(strip_p_tags("sem tags"), "sem tags");
    }

    #[test]
    fn other_tags_are_kept() {
        assert_eq!(strip_p_tags("<p><b>x</b></p>"), "<b>x</b>");
    }
}
