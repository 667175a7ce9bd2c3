//! Correlation between batch requests, sentences and stages.
//!
//! `custom_id` is rendered from and parsed into `CorrelationId` here and
//! nowhere else. The same fields are also written to the request metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    #[error("custom_id '{0}' is not of the form <prefix>_s<sentence>_t<stage>")]
    Malformed(String),

    #[error("custom_id '{0}' has an empty batch prefix")]
    EmptyPrefix(String),

    #[error("sentence and stage indices are 1-based, got '{0}'")]
    ZeroIndex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CorrelationId {
    pub batch_prefix: String,
    pub sentence_index: usize,
    pub stage_index: usize,
}

impl CorrelationId {
    pub fn new(batch_prefix: impl Into<String>, sentence_index: usize, stage_index: usize) -> Self {
        Self {
            batch_prefix: batch_prefix.into(),
            sentence_index,
            stage_index,
        }
    }

    /// Same sentence, following stage.
    pub fn next_stage(&self) -> Self {
        Self {
            stage_index: self.stage_index + 1,
            ..self.clone()
        }
    }

    /// Request metadata. Values are strings, as the Responses API requires.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("batch_prefix".to_string(), self.batch_prefix.clone()),
            ("sentence_index".to_string(), self.sentence_index.to_string()),
            ("stage_index".to_string(), self.stage_index.to_string()),
        ])
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_s{}_t{}",
            self.batch_prefix, self.sentence_index, self.stage_index
        )
    }
}

impl FromStr for CorrelationId {
    type Err = CorrelationError;

    /// Parses from the right, so prefixes may themselves contain `_s` or `_t`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CorrelationError::Malformed(s.to_string());

        let (rest, stage) = s.rsplit_once("_t").ok_or_else(malformed)?;
        let (prefix, sentence) = rest.rsplit_once("_s").ok_or_else(malformed)?;

        let stage_index = parse_index(stage).ok_or_else(malformed)?;
        let sentence_index = parse_index(sentence).ok_or_else(malformed)?;

        if prefix.is_empty() {
            return Err(CorrelationError::EmptyPrefix(s.to_string()));
        }
        if stage_index == 0 || sentence_index == 0 {
            return Err(CorrelationError::ZeroIndex(s.to_string()));
        }

        Ok(Self::new(prefix, sentence_index, stage_index))
    }
}

/// Digits only; `+5` or ` 5` are rejected.
fn parse_index(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let id = CorrelationId::new("sv_pud-ud-test", 3, 1);
        assert_eq!(id.to_string(), "sv_pud-ud-test_s3_t1");
    }

    #[test]
    fn test_parse_handles_prefix_containing_separators() {
        let id: CorrelationId = "my_set_treebank_s12_t4".parse().unwrap();
        assert_eq!(id, CorrelationId::new("my_set_treebank", 12, 4));

        let id: CorrelationId = "a_s1_t2_s7_t5".parse().unwrap();
        assert_eq!(id, CorrelationId::new("a_s1_t2", 7, 5));
    }

    #[test]
    fn test_parse_rejects_malformed_ids() {
        for bad in ["request-1", "x_s3", "x_t1", "x_s_t1", "x_s3_t", "x_s3_t+1", "x_sA_t1"] {
            assert!(
                matches!(
                    bad.parse::<CorrelationId>(),
                    Err(CorrelationError::Malformed(_))
                ),
                "{bad} should be malformed"
            );
        }
    }

    #[test]
    fn test_parse_rejects_empty_prefix_and_zero_indices() {
        assert!(matches!(
            "_s1_t1".parse::<CorrelationId>(),
            Err(CorrelationError::EmptyPrefix(_))
        ));
        assert!(matches!(
            "x_s0_t1".parse::<CorrelationId>(),
            Err(CorrelationError::ZeroIndex(_))
        ));
    }

    #[test]
    fn test_next_stage_keeps_sentence() {
        let id = CorrelationId::new("tb", 9, 2).next_stage();
        assert_eq!(id.to_string(), "tb_s9_t3");
    }

    #[test]
    fn test_metadata_values_are_strings() {
        let meta = CorrelationId::new("tb", 9, 2).metadata();
        assert_eq!(meta["batch_prefix"], "tb");
        assert_eq!(meta["sentence_index"], "9");
        assert_eq!(meta["stage_index"], "2");
    }
}
