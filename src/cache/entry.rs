//! Cache entry types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A cached availability result for one top-level module in one interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheEntry {
    /// Interpreter the module was probed in, as returned by [`interpreter_key`].
    pub interpreter: String,
    /// Top-level import name.
    pub module: String,
    /// Whether the module imported in the target interpreter.
    pub available: bool,
    /// Installed version, if one was found.
    pub version: Option<String>,
    /// When the result was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry recorded at `recorded_at`.
    pub fn new(
        interpreter: impl Into<String>,
        module: impl Into<String>,
        available: bool,
        version: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            module: module.into(),
            available,
            version,
            recorded_at,
        }
    }

    /// Key of this entry in the container.
    pub fn key(&self) -> String {
        entry_key(&self.interpreter, &self.module)
    }

    /// Age of this entry relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.recorded_at)
    }

    /// Whether the entry is still within `ttl` at `now`.
    ///
    /// Entries stamped in the future are never fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = self.age(now);
        age >= Duration::zero() && age < ttl
    }
}

/// Container key for `module` probed in `interpreter`.
pub fn entry_key(interpreter: &str, module: &str) -> String {
    format!("{}@{}", module, interpreter)
}

/// Stable identity of an interpreter path.
///
/// Symlinks are resolved so `venv/bin/python` and the file it points to
/// share entries. Paths that cannot be resolved are used as given.
pub fn interpreter_key(interpreter: &Path) -> String {
    std::fs::canonicalize(interpreter)
        .unwrap_or_else(|_| interpreter.to_path_buf())
        .display()
        .to_string()
}

/// Summary counts over a cache container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
    pub expired: usize,
    pub available: usize,
    pub missing: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn entry_age_is_relative() {
        let entry = CacheEntry::new("/usr/bin/python3", "numpy", true, Some("1.26.0".into()), at(0));
        assert_eq!(entry.age(at(5)).num_hours(), 5);
    }

    #[test]
    fn entry_freshness_boundary() {
        let entry = CacheEntry::new("/usr/bin/python3", "numpy", true, None, at(0));
        assert!(entry.is_fresh(at(1), Duration::hours(2)));
        assert!(!entry.is_fresh(at(2), Duration::hours(2)));
        assert!(!entry.is_fresh(at(3), Duration::hours(2)));
    }

    #[test]
    fn entry_serializes() {
        let entry = CacheEntry::new("/usr/bin/python3", "PIL", false, None, at(0));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"module\":\"PIL\""));
        assert!(json.contains("\"available\":false"));

        let parsed: CacheEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn entry_from_the_future_is_expired() {
        let entry = CacheEntry::new("/usr/bin/python3", "numpy", true, None, at(5));
        assert!(!entry.is_fresh(at(4), Duration::days(7)));
        assert!(entry.is_fresh(at(5), Duration::days(7)));
    }

    #[test]
    fn key_includes_interpreter() {
        let a = CacheEntry::new("/venv-a/bin/python", "numpy", true, None, at(0));
        let b = CacheEntry::new("/venv-b/bin/python", "numpy", true, None, at(0));
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), entry_key("/venv-a/bin/python", "numpy"));
    }

    #[test]
    fn interpreter_key_resolves_symlinks() {
        let temp = tempfile::TempDir::new().unwrap();
        let real = temp.path().join("python3.12");
        std::fs::write(&real, "").unwrap();
        let canonical = interpreter_key(&real);

        #[cfg(unix)]
        {
            let link = temp.path().join("python");
            std::os::unix::fs::symlink(&real, &link).unwrap();
            assert_eq!(interpreter_key(&link), canonical);
        }
        assert_eq!(interpreter_key(Path::new("no/such/python")), "no/such/python");
    }
}
