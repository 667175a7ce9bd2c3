use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::batch::prepare::{FIRST_STAGE_MAX_OUTPUT_TOKENS, NEXT_STAGE_MAX_OUTPUT_TOKENS};

#[derive(Parser, Debug)]
#[command(name = "annotator")]
#[command(about = "Annotate Swedish sentences as CoNLL-U through staged LLM prompts", version)]
pub struct Cli {
    /// Model to use (overrides OPENAI_MODEL)
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Annotate a single sentence and print its CoNLL-U lines
    Parse {
        sentence: String,

        /// File to write the finalized CoNLL-U to
        #[arg(long, default_value = "output/parsed.conllu")]
        output: PathBuf,

        /// Fail when the model's row count differs from the word count
        #[arg(long)]
        strict: bool,

        /// Do not write per-stage debug artifacts
        #[arg(long)]
        no_artifacts: bool,
    },

    /// Annotate every sentence of a CoNLL-U file, one after another
    ParseFile {
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        #[arg(long)]
        strict: bool,

        #[arg(long)]
        no_artifacts: bool,
    },

    /// Prepare and finalize stage-by-stage batch files
    Batch {
        #[command(subcommand)]
        action: BatchCommand,
    },

    /// Export fine-tuning and evaluation JSONL from a gold CoNLL-U file
    Dataset {
        input: PathBuf,

        #[arg(long, default_value = "sv_conllu_training.jsonl")]
        training: PathBuf,

        #[arg(long, default_value = "sv_conllu_eval.jsonl")]
        eval: PathBuf,
    },

    /// Grade CoNLL-U output for strict format conformance
    Validate {
        input: PathBuf,

        /// Treat the input as eval JSONL and grade each `expected_response`
        #[arg(long)]
        jsonl: bool,
    },

    /// Serve the pipeline over HTTP
    Serve {
        /// Port to bind (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BatchCommand {
    /// Build stage-1 requests from a CoNLL-U file
    Prepare {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Batch prefix for custom ids (defaults to the input file stem)
        #[arg(long)]
        prefix: Option<String>,

        #[arg(long, default_value_t = FIRST_STAGE_MAX_OUTPUT_TOKENS)]
        max_output_tokens: u32,

        #[command(flatten)]
        extra: ExtraBody,
    },

    /// Build the requests for the next stage from the previous stage's results
    Next {
        /// Results JSONL of the previous stage
        #[arg(long)]
        results: PathBuf,

        /// Stage to prepare (2..=5)
        #[arg(long)]
        stage: usize,

        #[arg(long)]
        output: PathBuf,

        #[arg(long, default_value_t = NEXT_STAGE_MAX_OUTPUT_TOKENS)]
        max_output_tokens: u32,

        #[command(flatten)]
        extra: ExtraBody,
    },

    /// Finalize the last stage's results into a CoNLL-U file
    Finalize {
        #[arg(long)]
        results: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Stage whose results are final
        #[arg(long, default_value_t = 5)]
        stage: usize,
    },
}

#[derive(Args, Debug, Default)]
pub struct ExtraBody {
    /// Extra request body fields as a JSON object, e.g. '{"reasoning":{"effort":"low"}}'
    #[arg(long)]
    pub extra_body: Option<String>,
}
