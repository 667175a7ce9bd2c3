//! Fine-tuning and evaluation dataset export.
//!
//! Every sentence with both `# text` and token lines becomes one prompt/answer
//! pair: the raw text in, the gold token lines out.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::batch::requests::write_jsonl;
use crate::errors::AppError;
use crate::treebank::reader::TreebankSentence;

pub const PARSE_PROMPT_PREFIX: &str = "Parse the following Swedish text into CoNLL-U format:\n\n";
pub const EVAL_TASK: &str = "conllu_parsing";
pub const EVAL_LANGUAGE: &str = "sv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAnnotationPair {
    pub text: String,
    pub annotation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat-format training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalMetadata {
    pub text: String,
    pub task: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalExample {
    pub id: String,
    pub prompt: String,
    pub expected_response: String,
    pub metadata: EvalMetadata,
}

/// Pairs of (`# text`, token lines). Sentences missing either are dropped;
/// FORM fallback text is not used here.
pub fn text_annotation_pairs(sentences: &[TreebankSentence]) -> Vec<TextAnnotationPair> {
    sentences
        .iter()
        .filter_map(|s| {
            let text = s.text.as_deref().filter(|t| !t.is_empty())?;
            if s.token_lines.is_empty() {
                return None;
            }
            Some(TextAnnotationPair {
                text: text.to_string(),
                annotation: s.annotation(),
            })
        })
        .collect()
}

fn parse_prompt(text: &str) -> String {
    format!("{PARSE_PROMPT_PREFIX}{text}")
}

pub fn training_examples(pairs: &[TextAnnotationPair]) -> Vec<TrainingExample> {
    pairs
        .iter()
        .map(|pair| TrainingExample {
            messages: vec![
                ChatMessage {
                    role: "user".to_string(),
                    content: parse_prompt(&pair.text),
                },
                ChatMessage {
                    role: "assistant".to_string(),
                    content: pair.annotation.clone(),
                },
            ],
        })
        .collect()
}

pub fn eval_examples(pairs: &[TextAnnotationPair]) -> Vec<EvalExample> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, pair)| EvalExample {
            id: format!("conllu_eval_{i:04}"),
            prompt: parse_prompt(&pair.text),
            expected_response: pair.annotation.clone(),
            metadata: EvalMetadata {
                text: pair.text.clone(),
                task: EVAL_TASK.to_string(),
                language: EVAL_LANGUAGE.to_string(),
            },
        })
        .collect()
}

/// Writes both files and returns the number of pairs exported.
pub async fn export_datasets(
    sentences: &[TreebankSentence],
    training_path: &Path,
    eval_path: &Path,
) -> Result<usize, AppError> {
    let pairs = text_annotation_pairs(sentences);
    write_jsonl(training_path, &training_examples(&pairs)).await?;
    write_jsonl(eval_path, &eval_examples(&pairs)).await?;
    Ok(pairs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::requests::read_jsonl;
    use crate::treebank::reader::parse_conllu;

    const TREEBANK: &str = "# sent_id = 1
# text = Ja!
1\tJa\tja\tINTJ\t_\t_\t0\troot\t_\tSpaceAfter=No
2\t!\t!\tPUNCT\t_\t_\t1\tpunct\t_\t_

# sent_id = 2
1\tNej\tnej\tINTJ\t_\t_\t0\troot\t_\t_

# text = Han såg.
1\tHan\than\tPRON\t_\t_\t2\tnsubj\t_\t_
2\tsåg\tse\tVERB\t_\t_\t0\troot\t_\t_
";

    #[test]
    fn test_pairs_require_text_and_tokens() {
        let pairs = text_annotation_pairs(&parse_conllu(TREEBANK));
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].text, "Ja!");
        assert_eq!(pairs[1].text, "Han såg.");
        assert_eq!(pairs[1].annotation.lines().count(), 2);
    }

    #[test]
    fn test_training_example_shape() {
        let pairs = text_annotation_pairs(&parse_conllu(TREEBANK));
        let value = serde_json::to_value(&training_examples(&pairs)[0]).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(
            value["messages"][0]["content"],
            "Parse the following Swedish text into CoNLL-U format:\n\nJa!"
        );
        assert_eq!(value["messages"][1]["role"], "assistant");
        assert_eq!(value["messages"][1]["content"], pairs[0].annotation);
    }

    #[test]
    fn test_eval_ids_are_zero_padded() {
        let pairs = text_annotation_pairs(&parse_conllu(TREEBANK));
        let examples = eval_examples(&pairs);
        assert_eq!(examples[0].id, "conllu_eval_0000");
        assert_eq!(examples[1].id, "conllu_eval_0001");
        assert_eq!(examples[1].metadata.task, "conllu_parsing");
        assert_eq!(examples[1].metadata.language, "sv");
    }

    #[tokio::test]
    async fn test_export_datasets_writes_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let training = tmp.path().join("train.jsonl");
        let eval = tmp.path().join("eval.jsonl");

        let count = export_datasets(&parse_conllu(TREEBANK), &training, &eval)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let train_back: Vec<TrainingExample> = read_jsonl(&training).await.unwrap();
        let eval_back: Vec<EvalExample> = read_jsonl(&eval).await.unwrap();
        assert_eq!(train_back.len(), 2);
        assert_eq!(eval_back[0].expected_response, train_back[0].messages[1].content);
    }
}
