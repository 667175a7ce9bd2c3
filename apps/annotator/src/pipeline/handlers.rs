//! Axum route handlers for the annotation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::pipeline::artifacts::{new_run_id, ArtifactSink};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub sentence: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub run_id: String,
    pub words: Vec<String>,
    pub conllu: String,
}

/// POST /api/v1/parse
///
/// Runs the five-stage pipeline for one sentence and returns its CoNLL-U lines.
/// Each request gets its own run id and artifact directory.
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    if request.sentence.trim().is_empty() {
        return Err(AppError::Validation("sentence cannot be empty".to_string()));
    }

    let run_id = new_run_id();
    let sink = state
        .artifact_root
        .as_deref()
        .map(|root| ArtifactSink::for_run(root, &run_id));

    info!("Parse request {run_id}");
    let annotation = state
        .pipeline
        .annotate(&request.sentence, sink.as_ref())
        .await?;

    Ok(Json(ParseResponse {
        run_id,
        words: annotation.words,
        conllu: annotation.conllu,
    }))
}
