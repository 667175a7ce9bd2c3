//! Tokenizer and initial prompt builder.
//!
//! Words are maximal runs of word characters; every other non-space character
//! is a token of its own. Matching is Unicode-aware, so `är` and `år` stay whole.

use std::sync::OnceLock;

use regex::Regex;

use crate::pipeline::prompts::{BASE_SCHEMA, INITIAL_PROMPT_TEMPLATE};

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+|[^\w\s]").expect("word pattern is a valid regex"))
}

/// Splits a sentence into its word sequence. Whitespace never yields tokens,
/// so an empty or blank sentence gives an empty sequence.
pub fn split_words(sentence: &str) -> Vec<String> {
    word_pattern()
        .find_iter(sentence)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Renders the word list the way it is shown to the model: `['Han', 'såg', '.']`.
pub fn render_word_list(words: &[String]) -> String {
    let quoted = words
        .iter()
        .map(|w| quote_word(w))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{quoted}]")
}

fn quote_word(word: &str) -> String {
    let escaped = word.replace('\\', "\\\\");
    if escaped.contains('\'') && !escaped.contains('"') {
        format!("\"{escaped}\"")
    } else {
        format!("'{}'", escaped.replace('\'', "\\'"))
    }
}

/// Builds the first-stage prompt and returns it together with the word sequence.
pub fn build_initial_prompt(sentence: &str) -> (String, Vec<String>) {
    let words = split_words(sentence);
    let prompt = INITIAL_PROMPT_TEMPLATE
        .replace("{schema}", BASE_SCHEMA)
        .replace("{words}", &render_word_list(&words))
        .replace("{sentence}", sentence);
    (prompt, words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_words_separates_final_punctuation() {
        assert_eq!(
            split_words("Thetta är inte begynnilsen."),
            strings(&["Thetta", "är", "inte", "begynnilsen", "."])
        );
    }

    #[test]
    fn test_split_words_each_punctuation_char_is_its_own_token() {
        assert_eq!(
            split_words("Nej!? sa han, \"aldrig\"."),
            strings(&["Nej", "!", "?", "sa", "han", ",", "\"", "aldrig", "\"", "."])
        );
    }

    #[test]
    fn test_split_words_ignores_repeated_whitespace() {
        let words = split_words("  Han \t såg\n\n elva   år  ");
        assert_eq!(words, strings(&["Han", "såg", "elva", "år"]));
        assert!(words.iter().all(|w| !w.is_empty()));
    }

    #[test]
    fn test_split_words_blank_sentence_is_empty() {
        assert!(split_words("").is_empty());
        assert!(split_words("   \n\t").is_empty());
    }

    #[test]
    fn test_split_words_keeps_digits_and_underscores_in_words() {
        assert_eq!(
            split_words("år_2024 kostade 5,5 kr"),
            strings(&["år_2024", "kostade", "5", ",", "5", "kr"])
        );
    }

    #[test]
    fn test_render_word_list_quotes_like_a_list_literal() {
        assert_eq!(
            render_word_list(&strings(&["Han", "såg", "."])),
            "['Han', 'såg', '.']"
        );
        assert_eq!(render_word_list(&strings(&["'"])), "[\"'\"]");
        assert_eq!(render_word_list(&[]), "[]");
    }

    #[test]
    fn test_build_initial_prompt_embeds_sentence_words_and_schema() {
        let (prompt, words) = build_initial_prompt("Han såg elva år.");
        assert_eq!(words.len(), 5);
        assert_eq!(
            prompt,
            format!(
                "We will perform dependency parsing on this Swedish sentence:\n\
                 Han såg elva år.\n\n\
                 Words: ['Han', 'såg', 'elva', 'år', '.']\n\n\
                 {BASE_SCHEMA}\n"
            )
        );
    }

    #[test]
    fn test_build_initial_prompt_blank_sentence_is_not_rejected() {
        let (prompt, words) = build_initial_prompt("   ");
        assert!(words.is_empty());
        assert!(prompt.contains("Words: []"));
    }
}
