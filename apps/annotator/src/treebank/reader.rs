//! Minimal CoNLL-U reader: sentence boundaries, `# text` / `# sent_id`
//! metadata and raw token lines. Token lines are kept verbatim.

use std::path::Path;

use crate::errors::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreebankSentence {
    pub sent_id: Option<String>,
    pub text: Option<String>,
    pub token_lines: Vec<String>,
}

impl TreebankSentence {
    /// FORM column of every token line.
    pub fn forms(&self) -> impl Iterator<Item = &str> {
        self.token_lines
            .iter()
            .filter_map(|line| line.split('\t').nth(1))
            .filter(|form| !form.is_empty())
    }

    /// The `# text` metadata, or the FORMs joined by spaces when it is missing.
    /// `None` when neither yields any text.
    pub fn surface_text(&self) -> Option<String> {
        if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            return Some(text.to_string());
        }
        let joined = self.forms().collect::<Vec<_>>().join(" ");
        let joined = joined.trim();
        if joined.is_empty() {
            None
        } else {
            Some(joined.to_string())
        }
    }

    /// Token lines joined with `\n`, the gold annotation for dataset export.
    pub fn annotation(&self) -> String {
        self.token_lines.join("\n")
    }

    fn is_empty(&self) -> bool {
        self.sent_id.is_none() && self.text.is_none() && self.token_lines.is_empty()
    }
}

/// Splits CoNLL-U text into sentences. Blank lines end a sentence; the last
/// sentence is kept even without a trailing blank line.
pub fn parse_conllu(contents: &str) -> Vec<TreebankSentence> {
    let mut sentences = Vec::new();
    let mut current = TreebankSentence::default();

    for raw in contents.lines() {
        let line = raw.trim();

        if line.is_empty() {
            if !current.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            if let Some((key, value)) = comment.split_once('=') {
                match key.trim() {
                    "text" => current.text = Some(value.trim().to_string()),
                    "sent_id" => current.sent_id = Some(value.trim().to_string()),
                    _ => {}
                }
            }
            continue;
        }

        current.token_lines.push(line.to_string());
    }

    if !current.is_empty() {
        sentences.push(current);
    }

    sentences
}

pub async fn read_conllu(path: &Path) -> Result<Vec<TreebankSentence>, AppError> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(parse_conllu(&contents))
}
