//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - Probe timeout, chunk size and worker count must be positive, and the
//!   timeout may not exceed one day
//! - The cache TTL must parse to a positive duration
//! - Registry overrides may only name safe modules and distributions

use crate::config::schema::{PackwiseConfig, RegistryOverrides};
use crate::error::{PackwiseError, Result};
use crate::probe::MAX_TIMEOUT_SECS;
use crate::registry::{is_safe_distribution_name, is_safe_import_name};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate_config(config: &PackwiseConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_probe(config));
    errors.extend(validate_cache(config));
    errors.extend(validate_overrides(&config.registry));

    errors
}

fn validate_probe(config: &PackwiseConfig) -> Vec<ValidationError> {
    let probe = &config.settings.probe;
    let mut errors = Vec::new();

    if probe.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "probe-timeout",
            "settings.probe.timeout_secs must be greater than zero",
        ));
    } else if probe.timeout_secs > MAX_TIMEOUT_SECS {
        errors.push(ValidationError::new(
            "probe-timeout",
            format!(
                "settings.probe.timeout_secs must be at most {}",
                MAX_TIMEOUT_SECS
            ),
        ));
    }
    if probe.chunk_size == 0 {
        errors.push(ValidationError::new(
            "probe-chunk-size",
            "settings.probe.chunk_size must be greater than zero",
        ));
    }
    if probe.workers == 0 {
        errors.push(ValidationError::new(
            "probe-workers",
            "settings.probe.workers must be greater than zero",
        ));
    }

    errors
}

fn validate_cache(config: &PackwiseConfig) -> Vec<ValidationError> {
    match config.settings.cache.ttl() {
        Ok(_) => Vec::new(),
        Err(e) => vec![ValidationError::new(
            "cache-ttl",
            format!("settings.cache.ttl: {}", e),
        )],
    }
}

fn validate_overrides(overrides: &RegistryOverrides) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut check_import = |name: &str, field: &str| {
        if !is_safe_import_name(name) {
            errors.push(ValidationError::new(
                "unsafe-module-name",
                format!("registry.{} contains invalid module name '{}'", field, name),
            ));
        }
    };

    for import in overrides.distribution_names.keys() {
        check_import(import, "distribution_names");
    }
    for (module, extras) in &overrides.implicit {
        check_import(module, "implicit");
        for extra in extras {
            check_import(extra, "implicit");
        }
    }
    for (field, names) in [
        ("complex", &overrides.complex),
        ("giant", &overrides.giant),
        ("metadata", &overrides.metadata),
        ("denied", &overrides.denied),
    ] {
        for name in names {
            check_import(name, field);
        }
    }

    for (import, dist) in &overrides.distribution_names {
        if !is_safe_distribution_name(dist) {
            errors.push(ValidationError::new(
                "unsafe-distribution-name",
                format!(
                    "registry.distribution_names maps '{}' to invalid distribution '{}'",
                    import, dist
                ),
            ));
        }
    }

    errors.sort_by(|a, b| a.message.cmp(&b.message));
    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &PackwiseConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(PackwiseError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
