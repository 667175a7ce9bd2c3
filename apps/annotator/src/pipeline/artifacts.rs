//! Debug artifacts: the raw text of every stage, written as `task{k}.tsv`.
//!
//! Paths are always supplied by the caller and keyed per run (and per sentence
//! in multi-sentence mode), so two runs never overwrite each other.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

/// Unique id for one invocation, e.g. `20261019T174501Z-3f2a9c1d`.
pub fn new_run_id() -> String {
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let short = Uuid::new_v4().simple().to_string();
    format!("{stamp}-{}", &short[..8])
}

#[derive(Debug, Clone)]
pub struct ArtifactSink {
    dir: PathBuf,
}

impl ArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `{root}/{run_id}/`
    pub fn for_run(root: &Path, run_id: &str) -> Self {
        Self::new(root.join(run_id))
    }

    /// `{dir}/s{sentence_index}/`
    pub fn for_sentence(&self, sentence_index: usize) -> Self {
        Self::new(self.dir.join(format!("s{sentence_index}")))
    }

    pub fn stage_path(&self, stage_index: usize) -> PathBuf {
        self.dir.join(format!("task{stage_index}.tsv"))
    }

    /// Writes one stage's raw output verbatim, creating the directory if needed.
    pub async fn write_stage(&self, stage_index: usize, output: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.stage_path(stage_index);
        tokio::fs::write(&path, output).await?;
        Ok(path)
    }
}
