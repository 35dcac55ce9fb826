//! Configuration schema definitions for Packwise.
//!
//! This module contains all the struct definitions that map to
//! the YAML configuration file format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{default_cache_path, parse_ttl, DEFAULT_TTL};
use crate::probe::{ProbeSettings, ProbeStrategyKind};
use crate::synth::SynthesisOptions;

/// Root configuration structure for `.packwise/config.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackwiseConfig {
    /// Global settings
    pub settings: Settings,

    /// Additions to the built-in package knowledge
    #[serde(skip_serializing_if = "RegistryOverrides::is_empty")]
    pub registry: RegistryOverrides,
}

/// Analysis settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Target interpreter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<PathBuf>,

    pub probe: ProbeConfig,

    pub cache: CacheConfig,

    pub synthesis: SynthesisConfig,
}

/// How modules are probed in the target interpreter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// batch or pool
    pub strategy: ProbeStrategyKind,

    /// Budget for the whole probing phase
    pub timeout_secs: u64,

    /// Modules per interpreter spawn (batch)
    pub chunk_size: usize,

    /// Concurrent interpreter spawns (pool)
    pub workers: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            strategy: ProbeStrategyKind::Batch,
            timeout_secs: default_timeout_secs(),
            chunk_size: default_chunk_size(),
            workers: default_workers(),
        }
    }
}

impl ProbeConfig {
    pub fn to_settings(&self) -> ProbeSettings {
        ProbeSettings {
            strategy: self.strategy,
            timeout: Duration::from_secs(self.timeout_secs),
            chunk_size: self.chunk_size,
            workers: self.workers,
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    64
}

fn default_workers() -> usize {
    8
}

/// Module availability cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Entry lifetime such as "7d" or "12h"
    pub ttl: String,

    /// Cache file (defaults to the user cache directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: DEFAULT_TTL.to_string(),
            path: None,
        }
    }
}

impl CacheConfig {
    /// Parsed TTL.
    pub fn ttl(&self) -> anyhow::Result<chrono::Duration> {
        parse_ttl(&self.ttl)
    }

    /// Configured path or the default cache file.
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_cache_path)
    }
}

/// Optional directive groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Emit UPX exclusions for binaries that break when compressed
    pub compress: bool,

    /// Exclude dev tooling and test packages
    pub exclude_dev_tooling: bool,

    /// Collect pkg_resources and tkinter whole
    pub safe_mode: bool,
}

impl SynthesisConfig {
    pub fn to_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            compress: self.compress,
            exclude_dev_tooling: self.exclude_dev_tooling,
            safe_mode: self.safe_mode,
        }
    }
}

/// Project-specific package knowledge merged over the built-in registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOverrides {
    /// Import name to distribution name
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub distribution_names: HashMap<String, String>,

    /// Extra runtime-only submodules per package
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub implicit: HashMap<String, Vec<String>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub complex: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub giant: Vec<String>,

    /// Packages needing their distribution metadata bundled
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<String>,

    /// Packages never bundled
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub denied: Vec<String>,
}

impl RegistryOverrides {
    pub fn is_empty(&self) -> bool {
        self.distribution_names.is_empty()
            && self.implicit.is_empty()
            && self.complex.is_empty()
            && self.giant.is_empty()
            && self.metadata.is_empty()
            && self.denied.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: PackwiseConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, PackwiseConfig::default());
        assert_eq!(config.settings.probe.timeout_secs, 60);
        assert_eq!(config.settings.probe.chunk_size, 64);
        assert_eq!(config.settings.probe.workers, 8);
        assert!(config.settings.cache.enabled);
        assert_eq!(config.settings.cache.ttl, "7d");
        assert!(!config.settings.synthesis.compress);
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
settings:
  python: /usr/bin/python3
  probe:
    strategy: pool
    timeout_secs: 30
    workers: 2
  cache:
    enabled: false
    ttl: 12h
    path: /tmp/cache.json
  synthesis:
    compress: true
    exclude_dev_tooling: true
    safe_mode: true
registry:
  distribution_names:
    foo: foo-dist
  denied: [mytool]
  metadata: [mypkg]
"#;
        let config: PackwiseConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.settings.python, Some(PathBuf::from("/usr/bin/python3")));
        assert_eq!(config.settings.probe.strategy, ProbeStrategyKind::Pool);
        assert_eq!(config.settings.probe.chunk_size, 64);
        assert!(!config.settings.cache.enabled);
        assert_eq!(config.settings.cache.ttl().unwrap().num_hours(), 12);
        assert_eq!(
            config.settings.cache.resolved_path(),
            PathBuf::from("/tmp/cache.json")
        );
        assert_eq!(config.registry.distribution_names["foo"], "foo-dist");
        assert_eq!(config.registry.denied, vec!["mytool"]);

        let options = config.settings.synthesis.to_options();
        assert!(options.compress && options.exclude_dev_tooling && options.safe_mode);
    }

    #[test]
    fn probe_config_converts_to_settings() {
        let settings = ProbeConfig {
            timeout_secs: 5,
            ..Default::default()
        }
        .to_settings();
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.strategy, ProbeStrategyKind::Batch);
    }

    #[test]
    fn unknown_strategy_fails_to_parse() {
        let result: Result<PackwiseConfig, _> =
            serde_yaml::from_str("settings:\n  probe:\n    strategy: serial\n");
        assert!(result.is_err());
    }

    #[test]
    fn default_config_serializes_without_registry() {
        let yaml = serde_yaml::to_string(&PackwiseConfig::default()).unwrap();
        assert!(!yaml.contains("registry"));
    }
}
