//! # Strings Module
//!
//! Centralizes user-facing strings: rejection details and CLI report lines.

pub mod messages;
