//! # Tools Module
//!
//! Launches validated media commands inside a caller-owned working directory.

pub mod executor;
pub mod process_group;
