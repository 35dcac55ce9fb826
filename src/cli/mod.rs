//! Command-line interface for Packwise.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations
//! - [`interpreter`] - Target interpreter lookup

pub mod args;
pub mod commands;
pub mod interpreter;

pub use args::{AnalyzeArgs, CheckArgs, Cli, Commands, CompletionsArgs};
pub use commands::{Command, CommandDispatcher, CommandResult};
pub use interpreter::{resolve_interpreter, InterpreterSource, PYTHON_ENV_VAR};
