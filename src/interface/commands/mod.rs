//! # Command Handlers
//!
//! One handler per CLI subcommand (`check`, `run`, `preset`, `reply`), plus the report
//! printing they share. Each handler returns the process exit code.

pub mod check;
pub mod preset;
pub mod reply;
pub mod run;

use anyhow::Result;
use std::process::ExitCode;
use std::time::Duration;

use crate::application::engine::{ProcessOutcome, RunError};
use crate::domain::errors::ErrorKind;
use crate::strings::messages;

pub use check::{CheckArgs, handle_check};
pub use preset::{PresetArgs, handle_preset};
pub use reply::{ReplyArgs, handle_reply};
pub use run::{RunArgs, handle_run};

pub const EXIT_REJECTED: u8 = 1;
pub const EXIT_INVALID_WORKDIR: u8 = 2;
pub const EXIT_TIMEOUT: u8 = 124;
pub const EXIT_SPAWN_FAILURE: u8 = 127;

/// `--timeout 0` disables the limit; no flag keeps the configured one.
pub(crate) fn timeout_override(secs: Option<u64>) -> Option<Option<Duration>> {
    secs.map(|secs| (secs > 0).then(|| Duration::from_secs(secs)))
}

pub(crate) fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Timeout => EXIT_TIMEOUT,
        ErrorKind::ProcessSpawnFailure => EXIT_SPAWN_FAILURE,
        ErrorKind::InvalidWorkdir => EXIT_INVALID_WORKDIR,
        _ => EXIT_REJECTED,
    }
}

/// Mirrors the subprocess status; a signal death maps to 128 + 9 like a shell would report
/// a SIGKILL.
pub(crate) fn exit_code_for_result(code: Option<i32>) -> u8 {
    match code {
        Some(code) => u8::try_from(code).unwrap_or(1),
        None => 137,
    }
}

pub(crate) fn report_outcome(
    command: &str,
    outcome: &ProcessOutcome,
    workdir: &str,
    json: bool,
) -> Result<ExitCode> {
    if json {
        let report = serde_json::json!({
            "status": if outcome.result.success() { "ok" } else { "failed" },
            "command": command,
            "outcome": outcome,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let mut output = outcome.result.stdout.clone();
        if !outcome.result.stderr.is_empty() {
            if !output.is_empty() {
                output.push_str("\n--- STDERR ---\n");
            }
            output.push_str(&outcome.result.stderr);
        }
        if !outcome.result.success() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&messages::exit_status(outcome.result.exit_code));
        }
        println!(
            "{}",
            messages::command_output_format(workdir, command, output.trim_end())
        );
        println!("{}", messages::produced_files(&outcome.produced_files));
        if !outcome.missing_outputs.is_empty() {
            println!("{}", messages::missing_outputs(&outcome.missing_outputs));
        }
    }
    Ok(ExitCode::from(exit_code_for_result(outcome.result.exit_code)))
}

pub(crate) fn report_error(err: &RunError, json: bool) -> Result<ExitCode> {
    let kind = err.kind();
    if json {
        let report = serde_json::json!({
            "status": "error",
            "kind": kind,
            "error": err.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match err {
            RunError::Rejected { reason, detail } => {
                eprintln!("{}", messages::command_rejected(reason.as_str(), detail))
            }
            RunError::Dispatch(e) => {
                eprintln!("{}", messages::execution_failed(kind.as_str(), &e.to_string()))
            }
        }
    }
    Ok(ExitCode::from(exit_code_for(kind)))
}
