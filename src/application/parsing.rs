//! # Parsing Utils
//!
//! Turns the raw text returned by the command-generation model into a `GeneratedCommand`.
//! Models do not always honour the JSON format they are asked for, so there are fallbacks:
//! a fenced shell block, then the whole reply.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::domain::traits::CommandGenerator;
use crate::domain::types::GeneratedCommand;

static FENCED_SHELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:bash|sh|shell)?[ \t]*\n(.*?)```").expect("fenced block regex")
});

const FENCED_FALLBACK: &str = "Command extracted from a code block in the model response";
const TEXT_FALLBACK: &str = "Command generated from model response";
const PARSE_FAILED_FALLBACK: &str = "Command generated from model response (parsing failed)";

pub fn parse_generated_command(response: &str, uploaded_files: &[String]) -> GeneratedCommand {
    let json_span = json_span(response);

    if let Some(span) = json_span {
        match serde_json::from_str::<GeneratedCommand>(span) {
            Ok(mut parsed) => {
                parsed.linux_command = parsed.linux_command.trim().to_string();
                if parsed.command_template.trim().is_empty() {
                    parsed.command_template = parsed.linux_command.clone();
                }
                return parsed;
            }
            Err(e) => warn!("Model response held malformed JSON: {}", e),
        }
    }

    if let Some(caps) = FENCED_SHELL.captures(response) {
        if let Some(body) = caps.get(1) {
            let command = body.as_str().trim().to_string();
            if !command.is_empty() {
                return fallback(command, uploaded_files, FENCED_FALLBACK);
            }
        }
    }

    let description = if json_span.is_some() {
        PARSE_FAILED_FALLBACK
    } else {
        TEXT_FALLBACK
    };
    fallback(response.trim().to_string(), uploaded_files, description)
}

/// A model reply captured earlier, replayed through the parser. Ignores the prompt.
#[derive(Debug, Clone)]
pub struct RecordedResponse {
    text: String,
}

impl RecordedResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl CommandGenerator for RecordedResponse {
    async fn generate(&self, _prompt: &str, uploaded_files: &[String]) -> Result<GeneratedCommand> {
        Ok(parse_generated_command(&self.text, uploaded_files))
    }
}

/// From the first `{` to the last `}`, inclusive.
fn json_span(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

fn fallback(command: String, uploaded_files: &[String], description: &str) -> GeneratedCommand {
    GeneratedCommand {
        command_template: command.clone(),
        linux_command: command,
        input_files: uploaded_files.to_vec(),
        output_files: Vec::new(),
        description: description.to_string(),
    }
}
