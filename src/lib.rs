//! # refile
//!
//! Validates and runs model-generated media-processing commands (`pdftocairo`, `ffmpeg`,
//! ImageMagick, `tesseract`, ...) inside a caller-owned working directory.
//!
//! A candidate command is split into steps, each step is checked for the arguments its tool
//! cannot do without, and the whole string is then routed either straight to `execve` or
//! through `sh -c` when it uses shell syntax.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod strings;

pub use application::engine::{Assessment, MediaEngine, ProcessOutcome, RunError};
pub use domain::config::AppConfig;
pub use domain::errors::{DispatchError, ErrorKind};
pub use domain::types::{CandidateCommand, ExecutionResult, ExecutionRoute, ValidationOutcome};
