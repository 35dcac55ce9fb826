//! Configuration loading, parsing, and validation for Packwise.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use packwise::config::{load_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".packwise");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "settings:\n  probe:\n    workers: 2\n").unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.settings.probe.workers, 2);
//! ```
//!
//! # Configuration File Locations
//!
//! Packwise discovers and merges configuration in this order:
//! 1. User global config (`~/.packwise/config.yml`)
//! 2. Project config (`.packwise/config.yml`)
//! 3. Local overrides (`.packwise/config.local.yml`)
//! 4. The file passed with `--config`

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use schema::{
    CacheConfig, PackwiseConfig, ProbeConfig, RegistryOverrides, Settings, SynthesisConfig,
};

pub use loader::{
    find_project_root, load_config, load_config_file, load_config_value, load_merged_config,
    parse_config, ConfigPaths, CONFIG_DIR,
};

pub use merger::{deep_merge, merge_configs};

pub use validator::{validate, validate_config, ValidationError};
