// Treebank data tools: CoNLL-U reading and writing, fine-tuning/eval dataset
// export, and the format grader used for scoring.

pub mod dataset;
pub mod reader;
pub mod validator;
pub mod writer;
