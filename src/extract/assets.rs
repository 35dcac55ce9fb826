//! Data files a script names by literal path.
//!
//! Images, icons and small data files referenced as quoted literals
//! (`"assets/logo.png"`, `'settings.json'`) must ship next to the bundle.
//! The scan is textual, so a reference is only kept when it resolves to a
//! file that exists.

use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static ASSET_LITERAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["']([^"'\r\n]+\.(?:png|jpg|jpeg|gif|ico|json|txt|xml|cfg))["']"#)
        .expect("ASSET_LITERAL_REGEX must compile")
});

/// Quoted literals in `source` that look like image or data file paths.
pub fn asset_references(source: &str) -> BTreeSet<String> {
    ASSET_LITERAL_REGEX
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Resolve `references` to existing files.
///
/// Each reference is tried against `script_dir`, then `cwd`. Absolute
/// references are used as they are. Results are canonical, sorted and
/// free of duplicates.
pub fn locate_assets(
    references: &BTreeSet<String>,
    script_dir: &Path,
    cwd: &Path,
) -> Vec<PathBuf> {
    let mut located = BTreeSet::new();

    for reference in references {
        let found = [script_dir.join(reference), cwd.join(reference)]
            .into_iter()
            .find(|candidate| candidate.exists())
            .and_then(|candidate| std::fs::canonicalize(candidate).ok());
        match found {
            Some(path) => {
                located.insert(path);
            }
            None => debug!("Skipping asset reference '{}': not found", reference),
        }
    }

    located.into_iter().collect()
}
