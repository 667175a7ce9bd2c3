use std::path::PathBuf;
use std::sync::Arc;

use crate::pipeline::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Root for per-request stage artifacts. `None` disables them.
    pub artifact_root: Option<PathBuf>,
}
