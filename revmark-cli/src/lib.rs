//! Revmark CLI library
//!
//! This library provides the command-line interface for re-annotating
//! manuscripts with LLM review feedback.

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;

pub use error::{CliError, CliResult};
