//! # Application Layer
//!
//! The validation-and-dispatch core: the tool rule table, the chain splitter, the argument
//! validator, the shell-mode classifier, and the engine that runs them in order.
//! Model-response parsing and preset rendering produce the commands the engine consumes.

pub mod classifier;
pub mod engine;
pub mod parsing;
pub mod presets;
pub mod rules;
pub mod splitter;
pub mod validator;
