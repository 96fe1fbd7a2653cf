//! # Errors
//!
//! One taxonomy (`ErrorKind`) shared by validation rejections and execution failures,
//! plus the typed errors raised by the dispatcher and the configuration loader.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Every way a candidate command can fail to become a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyCommand,
    MissingRequiredFlag,
    MissingArgument,
    /// Only produced when unknown tools are blocked.
    UnrecognizedTool,
    /// Not an error: the tool has no rule and the permissive fallback let it through.
    UnrecognizedButPermitted,
    ProcessSpawnFailure,
    NonZeroExit,
    Timeout,
    InvalidWorkdir,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::EmptyCommand => "empty_command",
            ErrorKind::MissingRequiredFlag => "missing_required_flag",
            ErrorKind::MissingArgument => "missing_argument",
            ErrorKind::UnrecognizedTool => "unrecognized_tool",
            ErrorKind::UnrecognizedButPermitted => "unrecognized_but_permitted",
            ErrorKind::ProcessSpawnFailure => "process_spawn_failure",
            ErrorKind::NonZeroExit => "non_zero_exit",
            ErrorKind::Timeout => "timeout",
            ErrorKind::InvalidWorkdir => "invalid_workdir",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of the execution dispatcher. A non-zero exit is not one of them:
/// it is reported through `ExecutionResult`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("working directory {path:?} is not usable: {reason}")]
    InvalidWorkdir { path: PathBuf, reason: String },

    #[error("command has no program to execute")]
    EmptyArgv,

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command timed out after {}s and was terminated", .after.as_secs())]
    Timeout { after: Duration },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::InvalidWorkdir { .. } => ErrorKind::InvalidWorkdir,
            DispatchError::EmptyArgv | DispatchError::Spawn { .. } | DispatchError::Wait { .. } => {
                ErrorKind::ProcessSpawnFailure
            }
            DispatchError::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresetError {
    #[error("template still contains unresolved placeholder(s): {}", .placeholders.join(", "))]
    Unresolved { placeholders: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_kinds() {
        let timeout = DispatchError::Timeout {
            after: Duration::from_secs(5),
        };
        assert_eq!(timeout.kind(), ErrorKind::Timeout);
        assert_eq!(
            timeout.to_string(),
            "command timed out after 5s and was terminated"
        );

        let spawn = DispatchError::Spawn {
            program: "pdftocairo".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(spawn.kind(), ErrorKind::ProcessSpawnFailure);
        assert_eq!(DispatchError::EmptyArgv.kind(), ErrorKind::ProcessSpawnFailure);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::MissingRequiredFlag).unwrap();
        assert_eq!(json, "\"missing_required_flag\"");
        assert_eq!(ErrorKind::NonZeroExit.to_string(), "non_zero_exit");
    }
}
