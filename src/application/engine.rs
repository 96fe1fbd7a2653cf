//! # Execution Engine
//!
//! Drives one request through the pipeline: split and validate the candidate command,
//! classify its route, dispatch it in the caller's working directory and report what
//! changed there. Holds no state between calls, so concurrent requests only need their
//! own directories.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::classifier::{self, Classification};
use crate::application::validator::ArgumentValidator;
use crate::domain::config::AppConfig;
use crate::domain::errors::{DispatchError, ErrorKind};
use crate::domain::traits::CommandGenerator;
use crate::domain::types::{
    CandidateCommand, ExecutionResult, ExecutionRoute, GeneratedCommand, ValidationOutcome,
};
use crate::infrastructure::tools::executor::ExecutionDispatcher;

/// Validation verdict and route, computed independently of each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub outcome: ValidationOutcome,
    pub classification: Classification,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub route: ExecutionRoute,
    pub result: ExecutionResult,
    /// Regular files that did not exist before the run, sorted.
    pub produced_files: Vec<String>,
    /// Expected outputs that are absent after the run. Informational only.
    pub missing_outputs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PromptOutcome {
    pub generated: GeneratedCommand,
    /// `None` when the generator produced no command.
    pub execution: Option<ProcessOutcome>,
}

#[derive(Debug, Error)]
pub enum RunError {
    /// Raised before anything is spawned.
    #[error("{detail}")]
    Rejected { reason: ErrorKind, detail: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Rejected { reason, .. } => *reason,
            RunError::Dispatch(e) => e.kind(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaEngine {
    validator: ArgumentValidator,
    dispatcher: ExecutionDispatcher,
    timeout: Option<Duration>,
}

impl MediaEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            validator: ArgumentValidator::new(config.validation.unknown_tools),
            dispatcher: ExecutionDispatcher::new(&config.execution),
            timeout: config.execution.timeout(),
        }
    }

    /// Overrides the configured timeout. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn assess(&self, command: &CandidateCommand) -> Assessment {
        Assessment {
            outcome: self.validator.validate(command),
            classification: classifier::classify(command),
        }
    }

    pub async fn run(
        &self,
        command: &CandidateCommand,
        workdir: &Path,
        expected_outputs: &[String],
    ) -> Result<ProcessOutcome, RunError> {
        let assessment = self.assess(command);
        if let ValidationOutcome::Rejected { reason, detail } = assessment.outcome {
            return Err(RunError::Rejected { reason, detail });
        }

        let route = assessment.classification.route;
        debug!(%route, trigger = ?assessment.classification.trigger, "Route chosen");

        let workdir = self.dispatcher.validate_workdir(workdir)?;
        let dir = workdir.path();
        let before = snapshot(dir).await.map_err(|e| DispatchError::InvalidWorkdir {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let result = self
            .dispatcher
            .dispatch(command, route, &workdir, self.timeout)
            .await?;

        let produced_files = match snapshot(dir).await {
            Ok(after) => after.difference(&before).cloned().collect(),
            Err(e) => {
                warn!("Could not list {:?} after run: {}", dir, e);
                Vec::new()
            }
        };
        let missing_outputs = missing_outputs(dir, expected_outputs);
        if !missing_outputs.is_empty() {
            info!(?missing_outputs, "Expected outputs were not produced");
        }

        Ok(ProcessOutcome {
            route,
            result,
            produced_files,
            missing_outputs,
        })
    }

    /// Asks the generator for a command and runs it over the uploaded files.
    pub async fn process_prompt(
        &self,
        generator: &dyn CommandGenerator,
        prompt: &str,
        uploaded_files: &[String],
        workdir: &Path,
    ) -> Result<PromptOutcome> {
        let generated = generator
            .generate(prompt, uploaded_files)
            .await
            .context("Command generation failed")?;

        let command = CandidateCommand::new(generated.linux_command.clone());
        if command.is_blank() {
            info!("Generator returned no command: {}", generated.description);
            return Ok(PromptOutcome {
                generated,
                execution: None,
            });
        }

        let execution = self
            .run(&command, workdir, &generated.output_files)
            .await?;
        Ok(PromptOutcome {
            generated,
            execution: Some(execution),
        })
    }
}

async fn snapshot(dir: &Path) -> std::io::Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Expected outputs are matched by file name; models often prefix them with a directory.
fn missing_outputs(workdir: &Path, expected: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|name| match Path::new(name.as_str()).file_name() {
            Some(file) => !workdir.join(file).exists(),
            None => true,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    fn engine() -> MediaEngine {
        MediaEngine::new(&AppConfig::default())
    }

    struct FixedGenerator(GeneratedCommand);

    #[async_trait]
    impl CommandGenerator for FixedGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _uploaded_files: &[String],
        ) -> Result<GeneratedCommand> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl CommandGenerator for FailingGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _uploaded_files: &[String],
        ) -> Result<GeneratedCommand> {
            anyhow::bail!("model unavailable")
        }
    }

    #[test]
    fn test_assess_rejected_command_is_still_classified() {
        let assessment = engine().assess(&CandidateCommand::new("ffmpeg out.mp3 && mogrify *.png"));
        assert!(!assessment.outcome.is_accepted());
        assert_eq!(
            assessment.classification.route,
            ExecutionRoute::Interpreted
        );
    }

    #[test]
    fn test_assess_pdf_to_grayscale_pipeline() {
        let assessment = engine().assess(&CandidateCommand::new(
            "pdftocairo -png input.pdf page && mogrify -colorspace Gray page-*.png",
        ));
        assert_eq!(assessment.outcome, ValidationOutcome::Accepted);
        assert_eq!(
            assessment.classification.route,
            ExecutionRoute::Interpreted
        );
    }

    #[tokio::test]
    async fn test_rejection_spawns_nothing() {
        let dir = TempDir::new().unwrap();
        let err = engine()
            .run(&CandidateCommand::new("pdftocairo -jpeg document.pdf"), dir.path(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingArgument);
        assert!(err.to_string().contains("pdftocairo"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_produced_and_missing_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("input.txt"), "pages").unwrap();

        let outcome = engine()
            .run(
                &CandidateCommand::new("cp input.txt page-1.txt && cp page-*.txt page-2.txt"),
                dir.path(),
                &["./uploads/page-1.txt".to_string(), "summary.txt".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(outcome.route, ExecutionRoute::Interpreted);
        assert!(outcome.result.success());
        assert_eq!(outcome.produced_files, vec!["page-1.txt", "page-2.txt"]);
        assert_eq!(outcome.missing_outputs, vec!["summary.txt"]);
    }

    #[tokio::test]
    async fn test_run_rejects_missing_workdir() {
        let dir = TempDir::new().unwrap();
        let err = engine()
            .run(
                &CandidateCommand::new("echo hi"),
                &dir.path().join("user-42"),
                &[],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidWorkdir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_direct_non_zero_exit() {
        let dir = TempDir::new().unwrap();
        let outcome = engine()
            .run(&CandidateCommand::new("ls missing-file.png"), dir.path(), &[])
            .await
            .unwrap();
        assert_eq!(outcome.route, ExecutionRoute::Direct);
        assert_eq!(outcome.result.failure_kind(), Some(ErrorKind::NonZeroExit));
        assert!(outcome.produced_files.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_timeout() {
        let dir = TempDir::new().unwrap();
        let err = engine()
            .with_timeout(Some(Duration::from_millis(100)))
            .run(&CandidateCommand::new("sleep 5"), dir.path(), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_prompt() {
        let dir = TempDir::new().unwrap();
        let generator = FixedGenerator(GeneratedCommand {
            linux_command: "touch result.txt".to_string(),
            output_files: vec!["result.txt".to_string()],
            ..GeneratedCommand::default()
        });

        let outcome = engine()
            .process_prompt(&generator, "make a file", &[], dir.path())
            .await
            .unwrap();
        let execution = outcome.execution.unwrap();
        assert_eq!(execution.produced_files, vec!["result.txt"]);
        assert!(execution.missing_outputs.is_empty());
    }

    #[tokio::test]
    async fn test_process_prompt_without_command() {
        let dir = TempDir::new().unwrap();
        let generator = FixedGenerator(GeneratedCommand {
            description: "Error: ambiguous request".to_string(),
            ..GeneratedCommand::default()
        });
        let outcome = engine()
            .process_prompt(&generator, "do something", &[], dir.path())
            .await
            .unwrap();
        assert!(outcome.execution.is_none());
    }

    #[tokio::test]
    async fn test_process_prompt_surfaces_rejection() {
        let dir = TempDir::new().unwrap();
        let generator = FixedGenerator(GeneratedCommand {
            linux_command: "ffmpeg out.mp3".to_string(),
            ..GeneratedCommand::default()
        });
        let err = engine()
            .process_prompt(&generator, "extract audio", &[], dir.path())
            .await
            .unwrap_err();
        let run_err = err.downcast_ref::<RunError>().unwrap();
        assert_eq!(run_err.kind(), ErrorKind::MissingRequiredFlag);

        let err = engine()
            .process_prompt(&FailingGenerator, "extract audio", &[], dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Command generation failed"));
    }
}
