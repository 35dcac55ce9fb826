//! Configuration file discovery and loading.
//!
//! This module handles finding and loading configuration files from
//! various locations in the correct priority order. Every layer is
//! optional; with no files at all the defaults apply.

use crate::config::merger::merge_configs;
use crate::config::schema::PackwiseConfig;
use crate::error::{PackwiseError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-project and per-user configuration directory.
pub const CONFIG_DIR: &str = ".packwise";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. User global config (`~/.packwise/config.yml`)
/// 2. Project config (`.packwise/config.yml`)
/// 3. Local overrides (`.packwise/config.local.yml`)
/// 4. Explicit `--config` file
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// User's global config: ~/.packwise/config.yml
    pub user_global: Option<PathBuf>,

    /// Project config: .packwise/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .packwise/config.local.yml
    pub project_local: Option<PathBuf>,

    /// File named on the command line; must exist
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            user_global: Self::find_user_global(),
            project: existing(project_root.join(CONFIG_DIR).join("config.yml")),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
            explicit: None,
        }
    }

    /// Add a file that overrides every discovered layer.
    pub fn with_explicit(mut self, path: Option<&Path>) -> Self {
        self.explicit = path.map(Path::to_path_buf);
        self
    }

    /// Find user's global config at ~/.packwise/config.yml
    fn find_user_global() -> Option<PathBuf> {
        existing(dirs::home_dir()?.join(CONFIG_DIR).join("config.yml"))
    }

    /// Returns all config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [
            &self.user_global,
            &self.project,
            &self.project_local,
            &self.explicit,
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Check if any project config exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Find the project root by walking up from `start`.
///
/// Looks for:
/// 1. `.packwise` directory (primary indicator)
/// 2. `.git` directory (fallback)
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a single config file and parse it into PackwiseConfig.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<PackwiseConfig> {
    let content = read_config(path)?;
    parse_config(&content, path)
}

/// Parse YAML content into PackwiseConfig.
pub fn parse_config(content: &str, source_path: &Path) -> Result<PackwiseConfig> {
    if content.trim().is_empty() {
        return Ok(PackwiseConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| PackwiseError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a config file as raw YAML Value (for merging).
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = read_config(path)?;
    if content.trim().is_empty() {
        return Ok(serde_yaml::Value::Mapping(Default::default()));
    }

    serde_yaml::from_str(&content).map_err(|e| PackwiseError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PackwiseError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PackwiseError::Io(e)
        }
    })
}

/// Merge every discovered layer into one typed config.
pub fn load_merged_config(paths: &ConfigPaths) -> Result<PackwiseConfig> {
    let mut configs = Vec::new();
    for path in paths.all_existing() {
        debug!("Loading config layer {:?}", path);
        configs.push(load_config_value(path)?);
    }

    if configs.is_empty() {
        return Ok(PackwiseConfig::default());
    }

    let merged = merge_configs(&configs);
    let source = paths
        .all_existing()
        .last()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    serde_yaml::from_value(merged).map_err(|e| PackwiseError::ConfigParseError {
        path: source,
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Discover and merge config for `project_root`, with an optional explicit file on top.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<PackwiseConfig> {
    let paths = ConfigPaths::discover(project_root).with_explicit(config_override);
    load_merged_config(&paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_project(root: &Path, name: &str, content: &str) {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn discover_finds_project_config() {
        let temp = TempDir::new().unwrap();
        write_project(temp.path(), "config.yml", "settings: {}");

        let paths = ConfigPaths::discover(temp.path());
        assert!(paths.project.is_some());
        assert!(paths.has_project_config());
    }

    #[test]
    fn discover_returns_none_for_missing_configs() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::discover(temp.path());
        assert!(paths.project.is_none());
        assert!(paths.project_local.is_none());
        assert!(!paths.has_project_config());
    }

    #[test]
    fn find_project_root_finds_packwise_dir() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("foo").join("bar");
        fs::create_dir_all(&subdir).unwrap();
        fs::create_dir_all(temp.path().join(CONFIG_DIR)).unwrap();

        assert_eq!(find_project_root(&subdir), Some(temp.path().to_path_buf()));
    }

    #[test]
    fn find_project_root_prefers_packwise_over_git() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("nested").join("project");
        fs::create_dir_all(&subdir).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::create_dir_all(subdir.join(CONFIG_DIR)).unwrap();

        assert_eq!(find_project_root(&subdir), Some(subdir));
    }

    #[test]
    fn local_overrides_project() {
        let temp = TempDir::new().unwrap();
        write_project(
            temp.path(),
            "config.yml",
            "settings:\n  probe:\n    timeout_secs: 30\n    workers: 2\n",
        );
        write_project(
            temp.path(),
            "config.local.yml",
            "settings:\n  probe:\n    timeout_secs: 90\n",
        );

        let paths = ConfigPaths {
            user_global: None,
            ..ConfigPaths::discover(temp.path())
        };
        let config = load_merged_config(&paths).unwrap();
        assert_eq!(config.settings.probe.timeout_secs, 90);
        assert_eq!(config.settings.probe.workers, 2);
    }

    #[test]
    fn explicit_file_wins() {
        let temp = TempDir::new().unwrap();
        write_project(temp.path(), "config.yml", "settings:\n  synthesis:\n    compress: false\n");
        let explicit = temp.path().join("ci.yml");
        fs::write(&explicit, "settings:\n  synthesis:\n    compress: true\n").unwrap();

        let paths = ConfigPaths {
            user_global: None,
            ..ConfigPaths::discover(temp.path()).with_explicit(Some(&explicit))
        };
        let config = load_merged_config(&paths).unwrap();
        assert!(config.settings.synthesis.compress);
    }

    #[test]
    fn no_files_gives_defaults() {
        let config = load_merged_config(&ConfigPaths::default()).unwrap();
        assert_eq!(config, PackwiseConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::default().with_explicit(Some(&temp.path().join("nope.yml")));
        let err = load_merged_config(&paths).unwrap_err();
        assert!(matches!(err, PackwiseError::ConfigNotFound { .. }));
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "settings: [unclosed").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, PackwiseError::ConfigParseError { .. }));
    }

    #[test]
    fn empty_file_is_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.yml");
        fs::write(&path, "").unwrap();
        assert_eq!(load_config_file(&path).unwrap(), PackwiseConfig::default());
    }
}
