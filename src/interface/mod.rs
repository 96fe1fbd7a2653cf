//! # Interface Layer
//!
//! Command-line entry points over the application layer.

pub mod commands;
