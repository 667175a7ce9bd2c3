//! Staged task runner: drives the ordered stages against the model.
//!
//! Stage k receives the base schema plus task k as instructions, and the raw
//! output of stage k-1 as input (the initial prompt for stage 1). Stages are
//! awaited one after another. A model error aborts the run as-is.

use std::sync::Arc;

use tracing::{info, warn};

use crate::llm_client::{LlmError, ModelCaller};
use crate::pipeline::artifacts::ArtifactSink;
use crate::pipeline::tasks::TaskSpec;

#[derive(Clone)]
pub struct StagedRunner {
    caller: Arc<dyn ModelCaller>,
    model: String,
    tasks: Vec<TaskSpec>,
}

impl StagedRunner {
    pub fn new(caller: Arc<dyn ModelCaller>, model: impl Into<String>, tasks: Vec<TaskSpec>) -> Self {
        Self {
            caller,
            model: model.into(),
            tasks,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    /// Runs every stage in order and returns the last stage's raw text.
    ///
    /// When `sink` is given, each stage's output is written to `task{k}.tsv`.
    /// A failed write is logged and does not stop the run.
    pub async fn run(
        &self,
        initial_prompt: &str,
        sink: Option<&ArtifactSink>,
    ) -> Result<String, LlmError> {
        let total = self.tasks.len();
        let mut output = initial_prompt.to_string();

        for (index, task) in self.tasks.iter().enumerate() {
            let stage = index + 1;
            let instructions = task.instructions();

            output = self.caller.call(&output, &instructions, &self.model).await?;
            info!(
                "Stage {}/{} complete (+{}, {} lines)",
                stage,
                total,
                task.columns_label(),
                output.lines().count()
            );

            if let Some(sink) = sink {
                if let Err(e) = sink.write_stage(stage, &output).await {
                    warn!(
                        "Could not write artifact {}: {}",
                        sink.stage_path(stage).display(),
                        e
                    );
                }
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::pipeline::tasks::{default_tasks, Column};

    /// One recorded model call.
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub input: String,
        pub instructions: String,
        pub model: String,
    }

    /// Returns scripted outputs in order and records every call.
    pub struct ScriptedCaller {
        outputs: Mutex<VecDeque<Result<String, LlmError>>>,
        pub calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedCaller {
        pub fn new(outputs: Vec<Result<String, LlmError>>) -> Self {
            Self {
                outputs: Mutex::new(outputs.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(outputs: &[&str]) -> Self {
            Self::new(outputs.iter().map(|s| Ok(s.to_string())).collect())
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelCaller for ScriptedCaller {
        async fn call(
            &self,
            input: &str,
            instructions: &str,
            model: &str,
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(RecordedCall {
                input: input.to_string(),
                instructions: instructions.to_string(),
                model: model.to_string(),
            });
            self.outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    fn tasks(n: usize) -> Vec<TaskSpec> {
        (1..=n)
            .map(|k| TaskSpec::new(vec![Column::Deps], format!("- Task {k}")))
            .collect()
    }

    #[tokio::test]
    async fn test_run_chains_outputs_into_inputs() {
        let caller = Arc::new(ScriptedCaller::ok(&["out1", "out2", "out3", "out4", "out5"]));
        let runner = StagedRunner::new(caller.clone(), "gpt-5-mini", default_tasks());

        let result = runner.run("initial prompt", None).await.unwrap();
        assert_eq!(result, "out5");

        let calls = caller.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[0].input, "initial prompt");
        for k in 1..5 {
            assert_eq!(calls[k].input, format!("out{k}"));
        }
        for (call, task) in calls.iter().zip(default_tasks()) {
            assert_eq!(call.instructions, task.instructions());
            assert_eq!(call.model, "gpt-5-mini");
        }
    }

    #[tokio::test]
    async fn test_run_issues_one_call_per_task() {
        for n in [1usize, 2, 7] {
            let outputs: Vec<String> = (1..=n).map(|k| format!("stage {k}")).collect();
            let refs: Vec<&str> = outputs.iter().map(String::as_str).collect();
            let caller = Arc::new(ScriptedCaller::ok(&refs));
            let runner = StagedRunner::new(caller.clone(), "m", tasks(n));

            let result = runner.run("p", None).await.unwrap();
            assert_eq!(result, format!("stage {n}"));
            assert_eq!(caller.calls().len(), n);
        }
    }

    #[tokio::test]
    async fn test_empty_stage_output_is_passed_on_verbatim() {
        let caller = Arc::new(ScriptedCaller::ok(&["", "second"]));
        let runner = StagedRunner::new(caller.clone(), "m", tasks(2));

        runner.run("p", None).await.unwrap();
        assert_eq!(caller.calls()[1].input, "");
    }

    #[tokio::test]
    async fn test_model_error_aborts_run() {
        let caller = Arc::new(ScriptedCaller::new(vec![
            Ok("out1".to_string()),
            Err(LlmError::Api {
                status: 401,
                message: "bad key".to_string(),
            }),
            Ok("never".to_string()),
        ]));
        let runner = StagedRunner::new(caller.clone(), "m", default_tasks());

        let err = runner.run("p", None).await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 401, .. }));
        assert_eq!(caller.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_run_writes_each_stage_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = ArtifactSink::for_run(tmp.path(), "run");
        let caller = Arc::new(ScriptedCaller::ok(&["a", "b", "c", "d", "e"]));
        let runner = StagedRunner::new(caller, "m", default_tasks());

        runner.run("p", Some(&sink)).await.unwrap();

        for (k, expected) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let text = std::fs::read_to_string(sink.stage_path(k + 1)).unwrap();
            assert_eq!(&text, expected);
        }
    }

    #[tokio::test]
    async fn test_artifact_failure_does_not_stop_run() {
        let tmp = tempfile::tempdir().unwrap();
        // A file where the artifact directory should be makes every write fail.
        let blocker = tmp.path().join("blocked");
        std::fs::write(&blocker, "not a directory").unwrap();
        let sink = ArtifactSink::new(&blocker);

        let caller = Arc::new(ScriptedCaller::ok(&["a", "b"]));
        let runner = StagedRunner::new(caller, "m", tasks(2));

        assert_eq!(runner.run("p", Some(&sink)).await.unwrap(), "b");
    }
}
