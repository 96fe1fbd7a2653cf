//! `refile check`: validate and classify without executing anything.

use anyhow::Result;
use clap::Args;
use std::process::ExitCode;

use crate::application::engine::MediaEngine;
use crate::domain::config::AppConfig;
use crate::domain::types::{CandidateCommand, ValidationOutcome};
use crate::interface::commands::EXIT_REJECTED;
use crate::strings::messages;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// The candidate command, quoted as one argument
    pub command: String,

    /// Print the assessment as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn handle_check(config: &AppConfig, args: CheckArgs) -> Result<ExitCode> {
    let engine = MediaEngine::new(config);
    let command = CandidateCommand::new(args.command);
    let assessment = engine.assess(&command);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        match &assessment.outcome {
            ValidationOutcome::Accepted => println!(
                "{}",
                messages::command_accepted(&assessment.classification.route.to_string())
            ),
            ValidationOutcome::Rejected { reason, detail } => {
                println!("{}", messages::command_rejected(reason.as_str(), detail))
            }
        }
    }

    Ok(if assessment.outcome.is_accepted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_REJECTED)
    })
}
