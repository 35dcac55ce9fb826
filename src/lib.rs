//! Packwise - find what a Python script needs bundled.
//!
//! Packwise reads a Python entry script, works out which third-party
//! distributions it pulls in, checks them against a target interpreter
//! and emits the directive arguments a bundler needs to produce a
//! working executable.
//!
//! # Modules
//!
//! - [`cache`] - Signed module availability cache
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, and validation
//! - [`error`] - Error types and result aliases
//! - [`extract`] - Import extraction from Python source
//! - [`pipeline`] - Expansion, resolution, and the end-to-end analyzer
//! - [`probe`] - Availability probing in the target interpreter
//! - [`registry`] - Knowledge base of modules, distributions, and quirks
//! - [`synth`] - Bundler directive synthesis
//! - [`ui`] - Prompts, spinners, tables, and terminal output
//!
//! # Example
//!
//! ```
//! use packwise::extract::extract;
//!
//! let extraction = extract("import os.path\nfrom yaml import safe_load\n");
//! assert!(extraction.syntax_error.is_none());
//! assert!(extraction.imports.direct.contains("os.path"));
//! assert!(extraction.imports.top_level().contains("yaml"));
//! ```
//!
//! For interpreter-backed analysis, see the integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod probe;
pub mod registry;
pub mod synth;
pub mod ui;

pub use error::{PackwiseError, Result};
