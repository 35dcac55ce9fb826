//! Target interpreter selection.
//!
//! Lookup order: `--python`, then `settings.python`, then the
//! `PACKWISE_PYTHON` environment variable, then the first `python3` or
//! `python` found on PATH. PATH is scanned directly rather than through
//! `which`, whose behavior differs between systems.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PackwiseError, Result};

/// Environment variable naming the interpreter.
pub const PYTHON_ENV_VAR: &str = "PACKWISE_PYTHON";

#[cfg(windows)]
const CANDIDATES: &[&str] = &["python.exe", "python3.exe"];
#[cfg(not(windows))]
const CANDIDATES: &[&str] = &["python3", "python"];

/// Where the chosen interpreter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterSource {
    Flag,
    Config,
    Environment,
    Path,
}

impl std::fmt::Display for InterpreterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InterpreterSource::Flag => "--python",
            InterpreterSource::Config => "settings.python",
            InterpreterSource::Environment => PYTHON_ENV_VAR,
            InterpreterSource::Path => "PATH",
        };
        f.write_str(label)
    }
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// First executable interpreter candidate in `path_entries`.
pub fn find_on_path(path_entries: &[PathBuf]) -> Option<PathBuf> {
    CANDIDATES.iter().find_map(|name| {
        path_entries
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file() && is_executable(candidate))
    })
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Choose the interpreter using the real environment.
pub fn resolve_interpreter(
    flag: Option<&Path>,
    configured: Option<&Path>,
) -> Result<(PathBuf, InterpreterSource)> {
    resolve_interpreter_with(
        flag,
        configured,
        |key| std::env::var(key),
        &parse_system_path(),
    )
}

/// Choose the interpreter with an injected environment lookup.
pub fn resolve_interpreter_with<F>(
    flag: Option<&Path>,
    configured: Option<&Path>,
    env_fn: F,
    path_entries: &[PathBuf],
) -> Result<(PathBuf, InterpreterSource)>
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    let chosen = if let Some(path) = flag {
        (path.to_path_buf(), InterpreterSource::Flag)
    } else if let Some(path) = configured {
        (path.to_path_buf(), InterpreterSource::Config)
    } else if let Some(value) = env_fn(PYTHON_ENV_VAR).ok().filter(|v| !v.trim().is_empty()) {
        (PathBuf::from(value.trim()), InterpreterSource::Environment)
    } else if let Some(found) = find_on_path(path_entries) {
        (found, InterpreterSource::Path)
    } else {
        return Err(PackwiseError::InterpreterNotFound {
            message: format!(
                "no {} on PATH; pass --python, set settings.python, or set {}",
                CANDIDATES.join(" or "),
                PYTHON_ENV_VAR
            ),
        });
    };

    debug!("Using interpreter {} (from {})", chosen.0.display(), chosen.1);
    Ok(chosen)
}
