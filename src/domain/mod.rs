//! # Domain Layer
//!
//! Core definitions, types, and traits that describe a media command from the moment
//! the model produces it to the moment its subprocess exits.
//! Independent of the process runtime, serving as the contract for the other layers.

pub mod config;
pub mod errors;
pub mod traits;
pub mod types;
