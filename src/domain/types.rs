//! # Domain Types
//!
//! Common data structures and enums used across the validation and dispatch pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::ErrorKind;

/// The raw command string produced by the language model. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCommand(String);

impl CandidateCommand {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CandidateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// `tool arg arg ...`, checked against the rule table.
    Simple,
    /// A `for`/`while`/`until` construct, passed through without argument checks.
    Opaque,
}

/// One independently-validatable step of a compound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSegment<'a> {
    pub text: &'a str,
    pub kind: SegmentKind,
}

impl<'a> CommandSegment<'a> {
    pub fn simple(text: &'a str) -> Self {
        Self {
            text,
            kind: SegmentKind::Simple,
        }
    }

    pub fn opaque(text: &'a str) -> Self {
        Self {
            text,
            kind: SegmentKind::Opaque,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.kind == SegmentKind::Opaque
    }

    /// Whitespace tokens. Quoting is left to the shell.
    pub fn tokens(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.text.split_whitespace()
    }

    pub fn tool(&self) -> Option<&'a str> {
        self.text.split_whitespace().next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Accepted,
    Rejected { reason: ErrorKind, detail: String },
}

impl ValidationOutcome {
    pub fn rejected(reason: ErrorKind, detail: impl Into<String>) -> Self {
        ValidationOutcome::Rejected {
            reason,
            detail: detail.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }
}

/// How the dispatcher launches the subprocess. Chosen once per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionRoute {
    /// argv vector, no shell interpretation.
    Direct,
    /// The whole string handed to `sh -c`.
    Interpreted,
}

impl fmt::Display for ExecutionRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionRoute::Direct => f.write_str("direct"),
            ExecutionRoute::Interpreted => f.write_str("interpreted"),
        }
    }
}

/// What one subprocess run produced. Files it wrote stay in the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// `NonZeroExit` for a failed run; the caller decides how to present it.
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        if self.success() {
            None
        } else {
            Some(ErrorKind::NonZeroExit)
        }
    }
}

/// Structured answer from the command-generation collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCommand {
    #[serde(default)]
    pub linux_command: String,
    #[serde(default)]
    pub command_template: String,
    #[serde(default)]
    pub input_files: Vec<String>,
    #[serde(default)]
    pub output_files: Vec<String>,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_tool_and_tokens() {
        let segment = CommandSegment::simple("  pdftocairo  -png in.pdf page ");
        assert_eq!(segment.tool(), Some("pdftocairo"));
        assert_eq!(segment.tokens().count(), 4);
        assert!(!segment.is_opaque());
        assert_eq!(CommandSegment::simple("   ").tool(), None);
    }

    #[test]
    fn test_execution_result_failure_kind() {
        let mut result = ExecutionResult {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 3,
        };
        assert!(result.success());
        assert_eq!(result.failure_kind(), None);

        result.exit_code = Some(2);
        assert_eq!(result.failure_kind(), Some(ErrorKind::NonZeroExit));

        result.exit_code = None;
        assert_eq!(result.failure_kind(), Some(ErrorKind::NonZeroExit));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ValidationOutcome::rejected(ErrorKind::MissingArgument, "missing output");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "missing_argument");
        assert_eq!(json["detail"], "missing output");
    }
}
