//! # Main Entry Point
//!
//! Loads the configuration, sets up logging and hands off to the subcommand handler.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use refile::domain::config::{AppConfig, DEFAULT_CONFIG_PATH};
use refile::infrastructure::logging;
use refile::interface::commands::{
    CheckArgs, PresetArgs, ReplyArgs, RunArgs, handle_check, handle_preset, handle_reply,
    handle_run,
};

#[derive(Parser, Debug)]
#[command(name = "refile", version, about = "Validate and run media-processing commands")]
struct Cli {
    /// Config file (defaults to data/config.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate and classify a command without running it
    Check(CheckArgs),
    /// Validate and run a command in a working directory
    Run(RunArgs),
    /// Render a command template and run it
    Preset(PresetArgs),
    /// Run the command held in a saved model reply
    Reply(ReplyArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // An explicit path must exist; the default one is optional.
    let config = match &cli.config {
        Some(path) => AppConfig::load(path, true),
        None => AppConfig::load(Path::new(DEFAULT_CONFIG_PATH), false),
    }
    .context("Failed to load configuration")?;

    let _guard = logging::init(
        &config.logging,
        logging::level_override(cli.verbose, cli.quiet),
    )?;

    match cli.command {
        Commands::Check(args) => handle_check(&config, args),
        Commands::Run(args) => handle_run(&config, args).await,
        Commands::Preset(args) => handle_preset(&config, args).await,
        Commands::Reply(args) => handle_reply(&config, args).await,
    }
}
