//! Record finalizer: turns final-stage model text into canonical CoNLL-U.
//!
//! Pure and deterministic. A line that does not split into exactly eight
//! fields fails the whole sentence; nothing is coerced, truncated or repaired.

use thiserror::Error;

use crate::pipeline::prompts::FIELD_DELIMITER;

/// Number of fields the model emits per row (no XPOS, no MISC).
pub const STAGED_FIELD_COUNT: usize = 8;

/// Value used for the XPOS and MISC columns.
pub const PLACEHOLDER: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinalizeError {
    #[error("Expected {expected} fields, got {actual} in line: {line}")]
    FieldCount {
        expected: usize,
        actual: usize,
        line: String,
    },
}

/// One staged row: ID, FORM, LEMMA, UPOS, FEATS, HEAD, DEPREL, DEPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRecord<'a> {
    fields: [&'a str; STAGED_FIELD_COUNT],
}

impl<'a> StagedRecord<'a> {
    pub fn parse(line: &'a str) -> Result<Self, FinalizeError> {
        let parts: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        let actual = parts.len();
        let fields: [&str; STAGED_FIELD_COUNT] =
            parts.try_into().map_err(|_| FinalizeError::FieldCount {
                expected: STAGED_FIELD_COUNT,
                actual,
                line: line.to_string(),
            })?;
        Ok(Self { fields })
    }

    /// The 10-column tab-separated line with XPOS after UPOS and MISC at the end.
    pub fn to_conllu_line(&self) -> String {
        let [id, form, lemma, upos, feats, head, deprel, deps] = self.fields;
        [
            id,
            form,
            lemma,
            upos,
            PLACEHOLDER,
            feats,
            head,
            deprel,
            deps,
            PLACEHOLDER,
        ]
        .join("\t")
    }
}

/// Parses every non-blank line of `staged_text` as a record. Whitespace around
/// the whole text is stripped first.
pub fn parse_records(staged_text: &str) -> Result<Vec<StagedRecord<'_>>, FinalizeError> {
    staged_text
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(StagedRecord::parse)
        .collect()
}

/// Converts one sentence of staged output into CoNLL-U token lines joined by
/// `\n`, without a trailing newline.
pub fn finalize(staged_text: &str) -> Result<String, FinalizeError> {
    let records = parse_records(staged_text)?;
    Ok(records
        .iter()
        .map(StagedRecord::to_conllu_line)
        .collect::<Vec<_>>()
        .join("\n"))
}
