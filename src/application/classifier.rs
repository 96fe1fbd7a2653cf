//! # Shell-Mode Classifier
//!
//! Picks the execution route for a whole command by looking for shell syntax in the
//! unsplit string. This is a fixed list of trigger substrings, not a shell parser: any hit
//! sends the command through the interpreter so that chained steps share one shell and
//! one view of the working directory.

use serde::Serialize;

use crate::domain::types::{CandidateCommand, ExecutionRoute};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellTrigger {
    Chain,
    Pipe,
    Loop,
    Glob,
    Substitution,
    Sequence,
    Redirect,
    Quote,
    Variable,
    Background,
}

const SUBSTRING_TRIGGERS: &[(&str, ShellTrigger)] = &[
    ("&&", ShellTrigger::Chain),
    ("||", ShellTrigger::Chain),
    ("|", ShellTrigger::Pipe),
    ("*", ShellTrigger::Glob),
    ("?", ShellTrigger::Glob),
    ("[", ShellTrigger::Glob),
    ("$(", ShellTrigger::Substitution),
    ("`", ShellTrigger::Substitution),
    (";", ShellTrigger::Sequence),
    ("\n", ShellTrigger::Sequence),
    (">", ShellTrigger::Redirect),
    ("<", ShellTrigger::Redirect),
    ("'", ShellTrigger::Quote),
    ("\"", ShellTrigger::Quote),
    ("$", ShellTrigger::Variable),
    ("&", ShellTrigger::Background),
];

/// Matched as whole whitespace-delimited tokens.
const LOOP_TOKENS: &[&str] = &["for", "while"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub route: ExecutionRoute,
    /// First trigger found, for diagnostics. `None` on the direct route.
    pub trigger: Option<ShellTrigger>,
}

pub fn classify(command: &CandidateCommand) -> Classification {
    let trigger = find_trigger(command.as_str());
    let route = if trigger.is_some() {
        ExecutionRoute::Interpreted
    } else {
        ExecutionRoute::Direct
    };
    Classification { route, trigger }
}

pub fn route_for(command: &CandidateCommand) -> ExecutionRoute {
    classify(command).route
}

fn find_trigger(command: &str) -> Option<ShellTrigger> {
    if let Some((_, trigger)) = SUBSTRING_TRIGGERS
        .iter()
        .find(|(needle, _)| command.contains(needle))
    {
        return Some(*trigger);
    }
    if command
        .split_whitespace()
        .any(|token| LOOP_TOKENS.contains(&token))
    {
        return Some(ShellTrigger::Loop);
    }
    None
}
