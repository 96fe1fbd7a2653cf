//! # Preset Rendering
//!
//! Presets are stored command templates such as
//! `convert {input_file} -colorspace Gray {output_file}`. Rendering fills the input
//! placeholders with the user's files and derives output names from patterns like
//! `{input_basename}_gray{input_ext}`. The result is an ordinary candidate command.

use chrono::{DateTime, Local};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use crate::domain::errors::PresetError;

/// `{name}` placeholders. `${name}` is shell syntax and is captured only to be skipped.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$?)\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPattern {
    #[serde(default = "default_output_name")]
    pub name: String,
    pub template: String,
}

fn default_output_name() -> String {
    "output_file".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPreset {
    pub command: String,
    pub output_files: Vec<String>,
}

/// `inputs` maps placeholder names to filenames, in order; the first one seeds the
/// `{input_basename}` and `{input_ext}` of every output pattern.
pub fn render_preset(
    template: &str,
    inputs: &[(String, String)],
    outputs: &[OutputPattern],
    now: DateTime<Local>,
) -> Result<RenderedPreset, PresetError> {
    let mut command = template.to_string();
    for (name, file) in inputs {
        command = command.replace(&format!("{{{name}}}"), file);
    }

    let first_input = inputs.first().map_or("output", |(_, file)| file.as_str());
    let first_input = Path::new(first_input);
    let basename = first_input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = first_input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let timestamp = now.format("%Y%m%d_%H%M%S").to_string();

    let mut output_files = Vec::with_capacity(outputs.len());
    for pattern in outputs {
        let file = pattern
            .template
            .replace("{input_basename}", &basename)
            .replace("{input_ext}", &ext)
            .replace("{timestamp}", &timestamp);
        command = command.replace(&format!("{{{}}}", pattern.name), &file);
        output_files.push(file);
    }

    let placeholders = unresolved(&command);
    if !placeholders.is_empty() {
        return Err(PresetError::Unresolved { placeholders });
    }

    Ok(RenderedPreset {
        command,
        output_files,
    })
}

/// Unique placeholder names, in order of first appearance.
fn unresolved(command: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER
        .captures_iter(command)
        .filter(|caps| caps.get(1).is_some_and(|m| m.as_str().is_empty()))
        .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}
