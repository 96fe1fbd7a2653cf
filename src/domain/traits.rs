//! # Domain Traits
//!
//! Abstract interface for the command-generation collaborator.
//! The model call itself lives outside this crate; anything that can turn a prompt into a
//! `GeneratedCommand` plugs in here.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::types::GeneratedCommand;

#[async_trait]
pub trait CommandGenerator: Send + Sync {
    /// Translate a natural-language request into a command over the uploaded files.
    async fn generate(&self, prompt: &str, uploaded_files: &[String]) -> Result<GeneratedCommand>;
}
