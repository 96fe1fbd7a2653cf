//! # Infrastructure Layer
//!
//! Handles interactions with the operating system: subprocesses, process groups and
//! log sinks.

pub mod logging;
pub mod tools;
