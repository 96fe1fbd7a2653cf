//! `refile preset`: render a stored command template, then run it like `refile run`.

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::application::engine::MediaEngine;
use crate::application::presets::{OutputPattern, render_preset};
use crate::domain::config::AppConfig;
use crate::domain::types::CandidateCommand;
use crate::interface::commands::{report_error, report_outcome, timeout_override};

#[derive(Args, Debug)]
pub struct PresetArgs {
    /// Command template, e.g. "convert {input_file} -colorspace Gray {output_file}"
    pub template: String,

    /// Input placeholder binding NAME=FILE (repeatable)
    #[arg(short, long = "input", value_name = "NAME=FILE")]
    pub inputs: Vec<String>,

    /// Output placeholder binding NAME=PATTERN (repeatable)
    #[arg(short, long = "output", value_name = "NAME=PATTERN")]
    pub outputs: Vec<String>,

    /// Working directory holding the input files
    #[arg(short, long, required_unless_present = "dry_run")]
    pub workdir: Option<PathBuf>,

    /// Print the rendered command without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Timeout in seconds, 0 disables it (overrides the config)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_binding(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Binding '{}' has an empty name", raw);
    }
    Ok((name.to_string(), value.to_string()))
}

pub async fn handle_preset(config: &AppConfig, args: PresetArgs) -> Result<ExitCode> {
    let inputs = args
        .inputs
        .iter()
        .map(|raw| parse_binding(raw))
        .collect::<Result<Vec<_>>>()?;
    let outputs = args
        .outputs
        .iter()
        .map(|raw| parse_binding(raw).map(|(name, template)| OutputPattern { name, template }))
        .collect::<Result<Vec<_>>>()?;

    let rendered = render_preset(&args.template, &inputs, &outputs, Local::now())
        .context("Failed to render preset")?;
    info!("Rendered preset: {}", rendered.command);

    let workdir = match (&args.workdir, args.dry_run) {
        (Some(workdir), false) => workdir,
        _ => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rendered)?);
            } else {
                println!("{}", rendered.command);
            }
            return Ok(ExitCode::SUCCESS);
        }
    };

    let mut engine = MediaEngine::new(config);
    if let Some(timeout) = timeout_override(args.timeout) {
        engine = engine.with_timeout(timeout);
    }

    let command = CandidateCommand::new(rendered.command);
    match engine.run(&command, workdir, &rendered.output_files).await {
        Ok(outcome) => report_outcome(
            command.as_str(),
            &outcome,
            &workdir.display().to_string(),
            args.json,
        ),
        Err(e) => report_error(&e, args.json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binding() {
        assert_eq!(
            parse_binding("input_file=scan 1.pdf").unwrap(),
            ("input_file".to_string(), "scan 1.pdf".to_string())
        );
        assert_eq!(
            parse_binding("out={input_basename}=x.png").unwrap().1,
            "{input_basename}=x.png"
        );
        assert!(parse_binding("no-equals").is_err());
        assert!(parse_binding("=value").is_err());
    }
}
