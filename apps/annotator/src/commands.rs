//! Command dispatch. Each subcommand wires config into the library pieces.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::batch::prepare::{
    default_prefix, finalize_results, prepare_first_stage, prepare_next_stage, BatchOptions,
};
use crate::batch::requests::{read_jsonl, write_jsonl, BatchResultLine};
use crate::cli::{BatchCommand, Cli, Command, ExtraBody};
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pipeline::artifacts::{new_run_id, ArtifactSink};
use crate::pipeline::runner::StagedRunner;
use crate::pipeline::tasks::default_tasks;
use crate::pipeline::Pipeline;
use crate::routes::build_router;
use crate::state::AppState;
use crate::treebank::dataset::export_datasets;
use crate::treebank::reader::read_conllu;
use crate::treebank::validator::{grade, grade_eval_item};

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let model = cli.model.unwrap_or_else(|| config.model.clone());

    match cli.command {
        Command::Parse {
            sentence,
            output,
            strict,
            no_artifacts,
        } => {
            let pipeline = build_pipeline(&config, &model, strict)?;
            let run_id = new_run_id();
            let sink = (!no_artifacts).then(|| ArtifactSink::for_run(&config.artifact_root, &run_id));

            let annotation = pipeline.annotate(&sentence, sink.as_ref()).await?;
            println!("{}", annotation.conllu);

            ensure_parent(&output).await?;
            tokio::fs::write(&output, format!("{}\n", annotation.conllu)).await?;
            info!("Run {} written to {}", run_id, output.display());
        }

        Command::ParseFile {
            input,
            output,
            strict,
            no_artifacts,
        } => {
            let pipeline = build_pipeline(&config, &model, strict)?;
            let sentences = read_conllu(&input).await?;
            let run_id = new_run_id();
            let sink = (!no_artifacts).then(|| ArtifactSink::for_run(&config.artifact_root, &run_id));

            ensure_parent(&output).await?;
            let mut file = tokio::fs::File::create(&output)
                .await
                .with_context(|| format!("Could not create {}", output.display()))?;
            let written = pipeline
                .annotate_treebank(&sentences, sink.as_ref(), &mut file)
                .await?;
            info!(
                "Run {}: annotated {} of {} sentences -> {}",
                run_id,
                written,
                sentences.len(),
                output.display()
            );
        }

        Command::Batch { action } => run_batch(action, &model).await?,

        Command::Dataset {
            input,
            training,
            eval,
        } => {
            let sentences = read_conllu(&input).await?;
            let count = export_datasets(&sentences, &training, &eval).await?;
            info!(
                "Exported {} text-annotation pairs -> {}, {}",
                count,
                training.display(),
                eval.display()
            );
        }

        Command::Validate { input, jsonl } => {
            let scores: Vec<f64> = if jsonl {
                read_jsonl::<Value>(&input)
                    .await?
                    .iter()
                    .map(grade_eval_item)
                    .collect()
            } else {
                read_conllu(&input)
                    .await?
                    .iter()
                    .map(|s| grade(&s.annotation()))
                    .collect()
            };
            let passed = scores.iter().filter(|s| **s >= 1.0).count();
            let mean = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };
            println!("{passed}/{} valid (score {mean:.3})", scores.len());
        }

        Command::Serve { port, strict } => {
            let pipeline = build_pipeline(&config, &model, strict)?;
            let state = AppState {
                pipeline: Arc::new(pipeline),
                artifact_root: Some(config.artifact_root.clone()),
            };
            let app = build_router(state).layer(TraceLayer::new_for_http());

            let addr: SocketAddr = format!("0.0.0.0:{}", port.unwrap_or(config.port)).parse()?;
            info!("Listening on {addr}");

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

async fn run_batch(action: BatchCommand, model: &str) -> Result<()> {
    let tasks = default_tasks();

    match action {
        BatchCommand::Prepare {
            input,
            output,
            prefix,
            max_output_tokens,
            extra,
        } => {
            let sentences = read_conllu(&input).await?;
            let prefix = prefix.unwrap_or_else(|| default_prefix(&input));
            let options = batch_options(model, max_output_tokens, &extra)?;

            let requests = prepare_first_stage(&sentences, &prefix, &options, &tasks)?;
            write_jsonl(&output, &requests).await?;
            info!("Wrote {} requests -> {}", requests.len(), output.display());
        }

        BatchCommand::Next {
            results,
            stage,
            output,
            max_output_tokens,
            extra,
        } => {
            let lines: Vec<BatchResultLine> = read_jsonl(&results).await?;
            let options = batch_options(model, max_output_tokens, &extra)?;

            let requests = prepare_next_stage(&lines, stage, &options, &tasks)?;
            write_jsonl(&output, &requests).await?;
            info!("Wrote {} requests -> {}", requests.len(), output.display());
        }

        BatchCommand::Finalize {
            results,
            output,
            stage,
        } => {
            let lines: Vec<BatchResultLine> = read_jsonl(&results).await?;
            let outcome = finalize_results(&lines, stage);

            ensure_parent(&output).await?;
            tokio::fs::write(&output, &outcome.document).await?;
            for failure in &outcome.failures {
                warn!("{}: {}", failure.custom_id, failure.reason);
            }
            info!(
                "Finalized {} sentences ({} failed) -> {}",
                outcome.finalized,
                outcome.failures.len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config, model: &str, strict: bool) -> Result<Pipeline> {
    let client = LlmClient::new(
        config.require_api_key()?.to_string(),
        &config.openai_base_url,
        Duration::from_secs(config.request_timeout_secs),
        config.max_output_tokens,
    )?;
    info!("LLM client initialized (model: {model})");

    let runner = StagedRunner::new(Arc::new(client), model, default_tasks());
    Ok(Pipeline::new(runner, strict || config.strict_token_count))
}

fn batch_options(model: &str, max_output_tokens: u32, extra: &ExtraBody) -> Result<BatchOptions> {
    let extra = match extra.extra_body.as_deref() {
        Some(raw) => serde_json::from_str::<Map<String, Value>>(raw)
            .context("--extra-body must be a JSON object")?,
        None => Map::new(),
    };
    Ok(BatchOptions {
        model: model.to_string(),
        max_output_tokens,
        extra,
    })
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}
