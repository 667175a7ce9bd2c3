//! Stage-by-stage batch preparation.
//!
//! Batches are static, so each stage is its own file: stage 1 is built from
//! treebank sentences, stage k+1 from the results of stage k, and the final
//! stage's results are finalized into a CoNLL-U document.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::batch::correlation::CorrelationId;
use crate::batch::requests::{validate_extra_fields, BatchRequest, BatchResultLine, RequestBody};
use crate::errors::AppError;
use crate::pipeline::finalizer::finalize;
use crate::pipeline::tasks::TaskSpec;
use crate::pipeline::tokenizer::build_initial_prompt;
use crate::treebank::reader::TreebankSentence;
use crate::treebank::writer::render_sentence;

pub const FIRST_STAGE_MAX_OUTPUT_TOKENS: u32 = 1024;
pub const NEXT_STAGE_MAX_OUTPUT_TOKENS: u32 = 4096;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub model: String,
    pub max_output_tokens: u32,
    pub extra: Map<String, Value>,
}

impl BatchOptions {
    fn body(&self, task: &TaskSpec, input: String, id: &CorrelationId) -> RequestBody {
        RequestBody {
            model: self.model.clone(),
            instructions: task.instructions(),
            input,
            max_output_tokens: self.max_output_tokens,
            metadata: Some(id.metadata()),
            extra: self.extra.clone(),
        }
    }
}

/// Default batch prefix: the input file name without its extension.
pub fn default_prefix(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "batch".to_string())
}

fn task_for_stage(tasks: &[TaskSpec], stage: usize) -> Result<&TaskSpec, AppError> {
    stage
        .checked_sub(1)
        .and_then(|i| tasks.get(i))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "stage {stage} is out of range (1..={})",
                tasks.len()
            ))
        })
}

/// One stage-1 request per sentence that has text. Sentence indices are
/// 1-based and count only the sentences that produced a request.
pub fn prepare_first_stage(
    sentences: &[TreebankSentence],
    batch_prefix: &str,
    options: &BatchOptions,
    tasks: &[TaskSpec],
) -> Result<Vec<BatchRequest>, AppError> {
    validate_extra_fields(&options.extra)?;
    if batch_prefix.is_empty() {
        return Err(AppError::Validation("batch prefix cannot be empty".to_string()));
    }
    let task = task_for_stage(tasks, 1)?;

    let requests: Vec<BatchRequest> = sentences
        .iter()
        .filter_map(|s| s.surface_text())
        .enumerate()
        .map(|(i, text)| {
            let id = CorrelationId::new(batch_prefix, i + 1, 1);
            let (prompt, _) = build_initial_prompt(&text);
            BatchRequest::new(&id, options.body(task, prompt, &id))
        })
        .collect();

    info!(
        "Prepared {} stage-1 requests for prefix {}",
        requests.len(),
        batch_prefix
    );
    Ok(requests)
}

/// Builds `target_stage` requests from the results of `target_stage - 1`.
///
/// Lines from other stages and lines whose `custom_id` is not ours are
/// skipped. A matching line without output text is an error.
pub fn prepare_next_stage(
    results: &[BatchResultLine],
    target_stage: usize,
    options: &BatchOptions,
    tasks: &[TaskSpec],
) -> Result<Vec<BatchRequest>, AppError> {
    validate_extra_fields(&options.extra)?;
    if target_stage < 2 {
        return Err(AppError::Validation(
            "next-stage preparation starts at stage 2".to_string(),
        ));
    }
    let task = task_for_stage(tasks, target_stage)?;
    let source_stage = target_stage - 1;

    let mut requests = Vec::new();
    for line in results {
        let id: CorrelationId = match line.custom_id.parse() {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping result line: {e}");
                continue;
            }
        };
        if id.stage_index != source_stage {
            debug!("Skipping {} (not stage {})", line.custom_id, source_stage);
            continue;
        }

        let output = line.output_text().ok_or_else(|| {
            AppError::Validation(format!(
                "Could not extract output text from result {}: {}",
                line.custom_id,
                line.failure_reason()
            ))
        })?;

        let next = id.next_stage();
        requests.push(BatchRequest::new(&next, options.body(task, output, &next)));
    }

    info!(
        "Prepared {} stage-{} requests",
        requests.len(),
        target_stage
    );
    Ok(requests)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub custom_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchFinalization {
    /// Finalized sentences, ordered by prefix then sentence index.
    pub document: String,
    pub finalized: usize,
    pub failures: Vec<BatchFailure>,
}

/// Finalizes every `final_stage` result into one CoNLL-U document.
/// Sentences that fail are reported in `failures` and left out.
pub fn finalize_results(results: &[BatchResultLine], final_stage: usize) -> BatchFinalization {
    let mut finished: Vec<(CorrelationId, String)> = Vec::new();
    let mut failures = Vec::new();

    for line in results {
        let Ok(id) = line.custom_id.parse::<CorrelationId>() else {
            continue;
        };
        if id.stage_index != final_stage {
            continue;
        }

        let outcome = line
            .output_text()
            .ok_or_else(|| line.failure_reason())
            .and_then(|text| finalize(&text).map_err(|e| e.to_string()));

        match outcome {
            Ok(conllu) => finished.push((id, conllu)),
            Err(reason) => {
                warn!("Could not finalize {}: {}", line.custom_id, reason);
                failures.push(BatchFailure {
                    custom_id: line.custom_id.clone(),
                    reason,
                });
            }
        }
    }

    finished.sort_by(|(a, _), (b, _)| {
        (&a.batch_prefix, a.sentence_index).cmp(&(&b.batch_prefix, b.sentence_index))
    });

    let document = finished
        .iter()
        .map(|(id, conllu)| {
            let sent_id = format!("{}_s{}", id.batch_prefix, id.sentence_index);
            render_sentence(&sent_id, None, conllu)
        })
        .collect::<String>();

    BatchFinalization {
        document,
        finalized: finished.len(),
        failures,
    }
}
