//! Error types for Packwise operations.
//!
//! This module defines [`PackwiseError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - The analysis core degrades instead of failing: parse errors, probe
//!   failures, timeouts and cache corruption become data, not errors
//! - Use `PackwiseError` for the few conditions a caller must handle
//!   (unreadable scripts, bad configuration)
//! - Use `anyhow::Error` (via `PackwiseError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Packwise operations.
#[derive(Debug, Error)]
pub enum PackwiseError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// No usable target interpreter could be located.
    #[error("Python interpreter not found: {message}")]
    InterpreterNotFound { message: String },

    /// Source script could not be read.
    #[error("Failed to read script {path}: {source}")]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Packwise operations.
pub type Result<T> = std::result::Result<T, PackwiseError>;
