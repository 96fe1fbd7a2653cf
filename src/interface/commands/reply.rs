//! `refile reply`: replay a saved model reply through the parser and run the command it holds.

use anyhow::{Context, Result};
use clap::Args;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::application::engine::{MediaEngine, RunError};
use crate::application::parsing::RecordedResponse;
use crate::domain::config::AppConfig;
use crate::interface::commands::{
    EXIT_REJECTED, exit_code_for_result, report_error, report_outcome, timeout_override,
};

#[derive(Args, Debug)]
pub struct ReplyArgs {
    /// File holding the raw model reply, or "-" for stdin
    pub response: PathBuf,

    /// Uploaded file the reply refers to (repeatable)
    #[arg(short, long = "upload")]
    pub uploads: Vec<String>,

    /// Working directory holding the uploaded files
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Timeout in seconds, 0 disables it (overrides the config)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

fn read_response(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read model reply from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model reply from {:?}", path))
    }
}

pub async fn handle_reply(config: &AppConfig, args: ReplyArgs) -> Result<ExitCode> {
    let recorded = RecordedResponse::new(read_response(&args.response)?);

    let mut engine = MediaEngine::new(config);
    if let Some(timeout) = timeout_override(args.timeout) {
        engine = engine.with_timeout(timeout);
    }

    let outcome = match engine
        .process_prompt(&recorded, "", &args.uploads, &args.workdir)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => match e.downcast_ref::<RunError>() {
            Some(run_err) => return report_error(run_err, args.json),
            None => return Err(e),
        },
    };

    let workdir = args.workdir.display().to_string();
    match &outcome.execution {
        Some(execution) if !args.json => {
            println!("{}", outcome.generated.description);
            report_outcome(&outcome.generated.linux_command, execution, &workdir, false)
        }
        Some(execution) => {
            let report = serde_json::json!({
                "generated": outcome.generated,
                "status": if execution.result.success() { "ok" } else { "failed" },
                "outcome": execution,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::from(exit_code_for_result(execution.result.exit_code)))
        }
        None => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome.generated.description);
            }
            Ok(ExitCode::from(EXIT_REJECTED))
        }
    }
}
