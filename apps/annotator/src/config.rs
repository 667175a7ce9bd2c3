use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_MODEL: &str = "gpt-5-mini-2025-08-07";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_ARTIFACT_DIR: &str = "output/debug";

/// Application configuration loaded from environment variables.
/// The API key is only required by commands that call the model.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub max_output_tokens: Option<u32>,
    pub request_timeout_secs: u64,
    pub artifact_root: PathBuf,
    pub strict_token_count: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            openai_api_key: get("OPENAI_API_KEY_TREEBANKS").filter(|k| !k.is_empty()),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_output_tokens: get("MAX_OUTPUT_TOKENS")
                .map(|v| v.parse::<u32>())
                .transpose()
                .context("MAX_OUTPUT_TOKENS must be a positive integer")?,
            request_timeout_secs: get("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| "120".to_string())
                .parse::<u64>()
                .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            artifact_root: get("DEBUG_ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR)),
            strict_token_count: parse_flag(get("STRICT_TOKEN_COUNT").as_deref())
                .context("STRICT_TOKEN_COUNT must be true or false")?,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .context("Required environment variable 'OPENAI_API_KEY_TREEBANKS' is not set")
    }
}

fn parse_flag(value: Option<&str>) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => anyhow::bail!("unrecognised flag value '{other}'"),
    }
}
