//! Batch JSONL line shapes and read/write helpers.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::batch::correlation::CorrelationId;
use crate::errors::AppError;
use crate::llm_client::ResponsesResponse;

pub const BATCH_METHOD: &str = "POST";
pub const BATCH_URL: &str = "/v1/responses";

/// Field names owned by `RequestBody`; extra fields may not reuse them.
const RESERVED_BODY_FIELDS: &[&str] = &[
    "model",
    "instructions",
    "input",
    "max_output_tokens",
    "metadata",
];

/// One line of a batch input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub custom_id: String,
    pub method: String,
    pub url: String,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub model: String,
    pub instructions: String,
    pub input: String,
    pub max_output_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    /// Additional Responses API parameters, e.g. `reasoning` or `temperature`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BatchRequest {
    pub fn new(id: &CorrelationId, body: RequestBody) -> Self {
        Self {
            custom_id: id.to_string(),
            method: BATCH_METHOD.to_string(),
            url: BATCH_URL.to_string(),
            body,
        }
    }
}

/// Rejects extra body fields that would shadow a typed field.
pub fn validate_extra_fields(extra: &Map<String, Value>) -> Result<(), AppError> {
    let clashes: Vec<&str> = extra
        .keys()
        .map(String::as_str)
        .filter(|k| RESERVED_BODY_FIELDS.contains(k))
        .collect();
    if clashes.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "extra body fields may not override {clashes:?}"
        )))
    }
}

/// One line of a batch output file.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchResultLine {
    pub custom_id: String,
    #[serde(default)]
    pub response: Option<BatchResponse>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponse {
    pub status_code: u16,
    pub body: ResponsesResponse,
}

impl BatchResultLine {
    /// Why the line carries no usable output: the batch error, the HTTP
    /// status, or an empty reply.
    pub fn failure_reason(&self) -> String {
        if let Some(error) = self.error.as_ref().filter(|e| !e.is_null()) {
            return format!("batch error: {error}");
        }
        match &self.response {
            None => "no response".to_string(),
            Some(r) if !(200..300).contains(&r.status_code) => {
                format!("status {}", r.status_code)
            }
            Some(_) => "no output text".to_string(),
        }
    }

    /// Model output text, if the request succeeded and produced any.
    pub fn output_text(&self) -> Option<String> {
        self.response
            .as_ref()
            .filter(|r| (200..300).contains(&r.status_code))
            .and_then(|r| r.body.output_text())
    }
}

/// Reads a JSONL file, skipping blank lines.
pub async fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AppError> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_jsonl(&contents)
}

pub fn parse_jsonl<T: DeserializeOwned>(contents: &str) -> Result<Vec<T>, AppError> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(AppError::from))
        .collect()
}

/// One compact JSON document per line, UTF-8 unescaped.
pub fn to_jsonl<T: Serialize>(items: &[T]) -> Result<String, AppError> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    Ok(out)
}

pub async fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, to_jsonl(items)?).await?;
    Ok(())
}
