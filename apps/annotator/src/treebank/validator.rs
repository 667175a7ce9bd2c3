//! Strict CoNLL-U format grader: 1.0 when the text is well-formed, 0.0 otherwise.
//!
//! Only the shape is checked, never the linguistic content.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn token_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // ID FORM LEMMA UPOS XPOS FEATS HEAD DEPREL DEPS MISC
        Regex::new(
            r"^([^\t]+)\t([^\t]+)\t([^\t]+)\t([^\t]+)\t([^\t]*)\t([^\t]*)\t([^\t]+)\t([^\t]+)\t([^\t]*)\t([^\t]*)$",
        )
        .expect("token line pattern is a valid regex")
    })
}

/// Grades one sentence's token lines.
///
/// Fails on any comment line, any line that is not ten tab-separated fields
/// with ID, FORM, LEMMA, UPOS, HEAD and DEPREL non-empty, or when there are no
/// token lines at all.
pub fn grade(text: &str) -> f64 {
    let mut token_count = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') || !token_line_pattern().is_match(line) {
            return 0.0;
        }
        token_count += 1;
    }

    if token_count == 0 {
        0.0
    } else {
        1.0
    }
}

/// Grades an eval item's `expected_response`; a bare string is graded as-is.
pub fn grade_eval_item(item: &Value) -> f64 {
    match item {
        Value::Object(map) => grade(
            map.get("expected_response")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        ),
        Value::String(text) => grade(text),
        other => grade(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VALID: &str = "1\tHan\than\tPRON\t_\tCase=Nom\t2\tnsubj\t_\t_\n\
                         2\tsåg\tse\tVERB\t_\tTense=Past\t0\troot\t_\t_";

    #[test]
    fn test_grade_accepts_well_formed_lines() {
        assert_eq!(grade(VALID), 1.0);
    }

    #[test]
    fn test_grade_allows_empty_optional_columns() {
        assert_eq!(grade("1\tJa\tja\tINTJ\t\t\t0\troot\t\t_"), 1.0);
    }

    #[test]
    fn test_grade_trims_trailing_tabs_before_matching() {
        // Trailing empty columns are lost to trimming, leaving too few fields.
        assert_eq!(grade("1\tJa\tja\tINTJ\t_\t_\t0\troot\t\t"), 0.0);
    }

    #[test]
    fn test_grade_rejects_empty_required_column() {
        // Empty DEPREL.
        assert_eq!(grade("1\tJa\tja\tINTJ\t_\t_\t0\t\t_\t_"), 0.0);
    }

    #[test]
    fn test_grade_rejects_comments_and_wrong_width() {
        assert_eq!(grade(&format!("# text = Han såg\n{VALID}")), 0.0);
        assert_eq!(grade("1\tJa\tja\tINTJ\t_\t0\troot\t_\t_"), 0.0);
        assert_eq!(grade("1⟶Ja⟶ja⟶INTJ⟶_⟶0⟶root⟶_"), 0.0);
    }

    #[test]
    fn test_grade_rejects_empty_text() {
        assert_eq!(grade(""), 0.0);
        assert_eq!(grade("\n   \n"), 0.0);
    }

    #[test]
    fn test_grade_ignores_blank_lines_between_tokens() {
        assert_eq!(grade(&format!("\n{VALID}\n\n")), 1.0);
    }

    #[test]
    fn test_grade_eval_item_reads_expected_response() {
        assert_eq!(grade_eval_item(&json!({"expected_response": VALID})), 1.0);
        assert_eq!(grade_eval_item(&json!({"prompt": "x"})), 0.0);
        assert_eq!(grade_eval_item(&json!(VALID)), 1.0);
    }
}
