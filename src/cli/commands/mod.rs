//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. Commands are
//! routed by [`CommandDispatcher`], which also owns the shared setup
//! (project root and merged configuration).

pub mod analyze;
pub mod cache;
pub mod check;
pub mod completions;
pub mod dispatcher;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
