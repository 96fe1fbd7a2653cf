//! `refile run`: validate, classify and execute one command in a working directory.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::application::engine::MediaEngine;
use crate::domain::config::AppConfig;
use crate::domain::types::CandidateCommand;
use crate::interface::commands::{report_error, report_outcome, timeout_override};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// The candidate command, quoted as one argument
    pub command: String,

    /// Working directory holding the input files
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Timeout in seconds, 0 disables it (overrides the config)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// File the command is expected to produce (repeatable)
    #[arg(short = 'o', long = "expect-output")]
    pub expect_output: Vec<String>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_run(config: &AppConfig, args: RunArgs) -> Result<ExitCode> {
    let mut engine = MediaEngine::new(config);
    if let Some(timeout) = timeout_override(args.timeout) {
        engine = engine.with_timeout(timeout);
    }

    let command = CandidateCommand::new(args.command);
    match engine
        .run(&command, &args.workdir, &args.expect_output)
        .await
    {
        Ok(outcome) => report_outcome(
            command.as_str(),
            &outcome,
            &args.workdir.display().to_string(),
            args.json,
        ),
        Err(e) => report_error(&e, args.json),
    }
}
