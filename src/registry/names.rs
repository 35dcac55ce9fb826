//! Name normalization and allow-list checks.
//!
//! Every name that may end up in a process argument list passes through
//! one of the `is_safe_*` checks first.

use regex::Regex;
use std::sync::LazyLock;

/// Dotted Python identifier path.
static IMPORT_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("IMPORT_NAME_REGEX must compile")
});

/// Distribution name as accepted by package indexes.
static DISTRIBUTION_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$")
        .expect("DISTRIBUTION_NAME_REGEX must compile")
});

/// Separator runs folded by PEP 503 normalization.
static SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("SEPARATOR_REGEX must compile"));

/// Upper bound for any single name.
const MAX_NAME_LENGTH: usize = 200;

/// Check that an import name is a plain dotted identifier path.
pub fn is_safe_import_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LENGTH && IMPORT_NAME_REGEX.is_match(name)
}

/// Check that a distribution name only uses index-safe characters.
pub fn is_safe_distribution_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LENGTH && DISTRIBUTION_NAME_REGEX.is_match(name)
}

/// Normalize a distribution name (lower-case, separator runs folded to `-`).
pub fn normalize_distribution(name: &str) -> String {
    SEPARATOR_REGEX
        .replace_all(&name.trim().to_lowercase(), "-")
        .into_owned()
}

/// Best-guess import name for an unmapped distribution.
pub fn default_import_name(distribution: &str) -> String {
    SEPARATOR_REGEX
        .replace_all(&distribution.trim().to_lowercase(), "_")
        .into_owned()
}

/// First dot-separated segment of a module path.
pub fn top_level(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Every prefix of a dotted path, shortest first (`a.b.c` → `a`, `a.b`, `a.b.c`).
pub fn dotted_prefixes(name: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    for (idx, ch) in name.char_indices() {
        if ch == '.' {
            prefixes.push(name[..idx].to_string());
        }
    }
    prefixes.push(name.to_string());
    prefixes
}

/// Whether `name` equals `prefix` or is nested beneath it.
pub fn has_module_prefix(name: &str, prefix: &str) -> bool {
    name == prefix
        || (name.len() > prefix.len()
            && name.starts_with(prefix)
            && name.as_bytes()[prefix.len()] == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_import_names() {
        assert!(is_safe_import_name("numpy"));
        assert!(is_safe_import_name("PIL._tkinter_finder"));
        assert!(is_safe_import_name("_thread"));
    }

    #[test]
    fn unsafe_import_names() {
        assert!(!is_safe_import_name(""));
        assert!(!is_safe_import_name("os; rm -rf /"));
        assert!(!is_safe_import_name("$(whoami)"));
        assert!(!is_safe_import_name("a..b"));
        assert!(!is_safe_import_name("1abc"));
        assert!(!is_safe_import_name("a.b."));
        assert!(!is_safe_import_name("foo`id`"));
    }

    #[test]
    fn overlong_name_is_unsafe() {
        let name = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(!is_safe_import_name(&name));
        assert!(!is_safe_distribution_name(&name));
    }

    #[test]
    fn safe_distribution_names() {
        assert!(is_safe_distribution_name("opencv-python"));
        assert!(is_safe_distribution_name("Pillow"));
        assert!(is_safe_distribution_name("zope.interface"));
        assert!(is_safe_distribution_name("a"));
    }

    #[test]
    fn unsafe_distribution_names() {
        assert!(!is_safe_distribution_name("-e"));
        assert!(!is_safe_distribution_name("pkg|cat"));
        assert!(!is_safe_distribution_name("pkg "));
        assert!(!is_safe_distribution_name("pkg-"));
    }

    #[test]
    fn normalize_folds_separators() {
        assert_eq!(normalize_distribution("Python_Dateutil"), "python-dateutil");
        assert_eq!(normalize_distribution("zope.interface"), "zope-interface");
        assert_eq!(normalize_distribution("a--_b"), "a-b");
    }

    #[test]
    fn default_import_name_lowercases() {
        assert_eq!(default_import_name("Flask-Login"), "flask_login");
        assert_eq!(default_import_name("requests"), "requests");
    }

    #[test]
    fn dotted_prefixes_expand() {
        assert_eq!(dotted_prefixes("a.b.c"), vec!["a", "a.b", "a.b.c"]);
        assert_eq!(dotted_prefixes("numpy"), vec!["numpy"]);
    }

    #[test]
    fn top_level_takes_first_segment() {
        assert_eq!(top_level("a.b.c"), "a");
        assert_eq!(top_level("solo"), "solo");
    }

    #[test]
    fn prefix_match_respects_segments() {
        assert!(has_module_prefix("numpy.testing", "numpy.testing"));
        assert!(has_module_prefix("numpy.testing.utils", "numpy.testing"));
        assert!(!has_module_prefix("numpy.testingx", "numpy.testing"));
        assert!(!has_module_prefix("numpy", "numpy.testing"));
    }
}
