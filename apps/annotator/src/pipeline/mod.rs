// Staged annotation pipeline.
// tokenizer → runner (one model call per stage) → finalizer → token-count check.
// All model calls go through llm_client::ModelCaller.

pub mod artifacts;
pub mod finalizer;
pub mod handlers;
pub mod prompts;
pub mod runner;
pub mod tasks;
pub mod tokenizer;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::pipeline::artifacts::ArtifactSink;
use crate::pipeline::finalizer::finalize;
use crate::pipeline::runner::StagedRunner;
use crate::pipeline::tokenizer::build_initial_prompt;
use crate::treebank::reader::TreebankSentence;
use crate::treebank::writer::render_sentence;

/// Result of annotating one sentence.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub words: Vec<String>,
    /// Canonical CoNLL-U token lines, no trailing newline.
    pub conllu: String,
}

#[derive(Clone)]
pub struct Pipeline {
    runner: StagedRunner,
    strict_token_count: bool,
}

impl Pipeline {
    pub fn new(runner: StagedRunner, strict_token_count: bool) -> Self {
        Self {
            runner,
            strict_token_count,
        }
    }

    /// Annotates one sentence end to end.
    pub async fn annotate(
        &self,
        sentence: &str,
        sink: Option<&ArtifactSink>,
    ) -> Result<Annotation, AppError> {
        let (prompt, words) = build_initial_prompt(sentence);
        info!(
            "Annotating sentence ({} words, {} stages, model {})",
            words.len(),
            self.runner.tasks().len(),
            self.runner.model()
        );

        let staged = self.runner.run(&prompt, sink).await?;
        let conllu = finalize(&staged)?;
        self.check_token_count(words.len(), &conllu)?;

        Ok(Annotation { words, conllu })
    }

    /// Row count must match the advertised word count. Row order is not checked.
    fn check_token_count(&self, expected: usize, conllu: &str) -> Result<(), AppError> {
        let actual = conllu.lines().count();
        if actual == expected {
            return Ok(());
        }
        if self.strict_token_count {
            return Err(AppError::TokenCount { expected, actual });
        }
        warn!(
            "Model emitted {} rows for {} words; keeping output",
            actual, expected
        );
        Ok(())
    }

    /// Annotates treebank sentences one after another, writing each finished
    /// block to `out` as soon as it is ready. Sentences without any text are
    /// skipped. Returns the number of sentences written.
    ///
    /// The first failure stops the run; blocks already written stay written.
    pub async fn annotate_treebank<W>(
        &self,
        sentences: &[TreebankSentence],
        sink: Option<&ArtifactSink>,
        out: &mut W,
    ) -> Result<usize, AppError>
    where
        W: AsyncWrite + Unpin,
    {
        let eligible = annotatable(sentences);
        let skipped = sentences.len() - eligible.len();
        if skipped > 0 {
            warn!("Skipping {} of {} sentences without text", skipped, sentences.len());
        }

        let total = eligible.len();
        let mut written = 0;

        for (sentence, text) in eligible {
            let index = written + 1;
            let sentence_sink = sink.map(|s| s.for_sentence(index));

            let annotation = self.annotate(&text, sentence_sink.as_ref()).await?;

            let sent_id = sentence
                .sent_id
                .clone()
                .unwrap_or_else(|| format!("s{index}"));
            out.write_all(render_sentence(&sent_id, Some(&text), &annotation.conllu).as_bytes())
                .await?;
            out.flush().await?;

            written += 1;
            info!("Sentence {}/{} written", index, total);
        }

        Ok(written)
    }
}

/// Sentences that have surface text, paired with that text.
fn annotatable(sentences: &[TreebankSentence]) -> Vec<(&TreebankSentence, String)> {
    sentences
        .iter()
        .filter_map(|s| match s.surface_text() {
            Some(text) => Some((s, text)),
            None => {
                debug!("No text for sentence {:?}", s.sent_id);
                None
            }
        })
        .collect()
}
