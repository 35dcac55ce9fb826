//! Module registry: static knowledge about Python packages.
//!
//! The registry answers every question the pipeline asks about a module
//! name: is it part of the standard library, what is it installed as, what
//! does it load behind the scanner's back, and how should it be bundled.
//!
//! A [`Registry`] is an explicit value passed by reference into the
//! extractor, resolver and synthesizer. Use [`Registry::builtin`] for the
//! compiled-in tables or [`Registry::builder`] for a minimal registry in
//! tests.
//!
//! # Example
//!
//! ```
//! use packwise::registry::Registry;
//!
//! let registry = Registry::builtin();
//! assert!(registry.is_stdlib("json"));
//! assert_eq!(registry.distribution_name("PIL"), "Pillow");
//! assert_eq!(registry.import_name("opencv-python"), "cv2");
//! assert!(registry.is_giant("numpy"));
//! ```

pub mod builtin;
pub mod names;

pub use builtin::{REGISTRY_VERSION, SUPPORTED_PYTHON};
pub use names::{
    dotted_prefixes, has_module_prefix, is_safe_distribution_name, is_safe_import_name,
    normalize_distribution, top_level,
};

use crate::config::RegistryOverrides;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Read-only package knowledge base.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    stdlib: HashSet<String>,
    distribution_names: HashMap<String, String>,
    /// Keyed by normalized distribution name.
    import_names: HashMap<String, String>,
    implicit: HashMap<String, BTreeSet<String>>,
    complex: HashSet<String>,
    giant: HashSet<String>,
    metadata: HashSet<String>,
    denied: HashSet<String>,
    denied_prefixes: BTreeSet<String>,
    baseline_hidden: BTreeSet<String>,
    compression_unsafe: BTreeSet<String>,
}

impl Registry {
    /// Registry with the compiled-in tables.
    pub fn builtin() -> Self {
        let mut builder = Self::builder()
            .stdlib(builtin::STDLIB_MODULES.iter().copied())
            .baseline_hidden(builtin::BASELINE_HIDDEN_IMPORTS.iter().copied())
            .compression_unsafe(builtin::COMPRESSION_UNSAFE.iter().copied());

        for (import, dist) in builtin::DISTRIBUTION_NAMES {
            builder = builder.distribution(*import, *dist);
        }
        for (module, deps) in builtin::IMPLICIT_DEPENDENCIES {
            builder = builder.implicit(*module, deps.iter().copied());
        }
        for name in builtin::COMPLEX_PACKAGES {
            builder = builder.complex(*name);
        }
        for name in builtin::GIANT_PACKAGES {
            builder = builder.giant(*name);
        }
        for name in builtin::METADATA_REQUIRED {
            builder = builder.metadata(*name);
        }
        for name in builtin::DENIED_MODULES {
            builder = builder.denied(*name);
        }
        for prefix in builtin::DENIED_PREFIXES {
            builder = builder.denied_prefix(*prefix);
        }

        builder.build()
    }

    /// Start an empty registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Merge project-specific knowledge from configuration.
    pub fn with_overrides(self, overrides: &RegistryOverrides) -> Self {
        let mut builder = RegistryBuilder { inner: self };

        // Sorted so the inverse mapping stays deterministic.
        let mut mapped: Vec<_> = overrides.distribution_names.iter().collect();
        mapped.sort();
        for (import, dist) in mapped {
            builder = builder.distribution_override(import, dist);
        }
        for (module, deps) in &overrides.implicit {
            builder = builder.implicit(module.as_str(), deps.iter().map(String::as_str));
        }
        for name in &overrides.complex {
            builder = builder.complex(name.as_str());
        }
        for name in &overrides.giant {
            builder = builder.giant(name.as_str());
        }
        for name in &overrides.metadata {
            builder = builder.metadata(name.as_str());
        }
        for name in &overrides.denied {
            builder = builder.denied(name.as_str());
        }

        builder.build()
    }

    /// Exact membership in the standard-library set.
    pub fn is_stdlib(&self, top_level_name: &str) -> bool {
        self.stdlib.contains(top_level_name)
    }

    /// Name used to install `top_level_name`; identity when unmapped.
    pub fn distribution_name(&self, top_level_name: &str) -> String {
        self.distribution_names
            .get(top_level_name)
            .cloned()
            .unwrap_or_else(|| top_level_name.to_string())
    }

    /// Import name for a distribution; normalized form when unmapped.
    pub fn import_name(&self, distribution_name: &str) -> String {
        self.import_names
            .get(&normalize_distribution(distribution_name))
            .cloned()
            .unwrap_or_else(|| names::default_import_name(distribution_name))
    }

    /// Modules required at runtime by `top_level_name` that scanning cannot see.
    pub fn implicit_dependencies(&self, top_level_name: &str) -> BTreeSet<String> {
        self.implicit
            .get(top_level_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Package warrants exhaustive submodule collection (giants included).
    pub fn is_complex(&self, name: &str) -> bool {
        self.complex.contains(name) || self.complex.contains(top_level(name))
    }

    /// Complex package exempt from submodule collection.
    pub fn is_giant(&self, name: &str) -> bool {
        self.giant.contains(name) || self.giant.contains(top_level(name))
    }

    /// Package breaks without its distribution metadata bundled.
    pub fn requires_metadata_copy(&self, name: &str) -> bool {
        self.metadata.contains(name) || self.metadata.contains(top_level(name))
    }

    /// Package must never be bundled.
    pub fn is_denied(&self, name: &str) -> bool {
        self.denied.contains(name) || self.denied.contains(top_level(name))
    }

    /// Denied dotted prefix covering `name`, if any.
    pub fn denied_prefix(&self, name: &str) -> Option<&str> {
        self.denied_prefixes
            .iter()
            .find(|prefix| has_module_prefix(name, prefix))
            .map(String::as_str)
    }

    /// Submodules merged into every analysis.
    pub fn baseline_hidden_imports(&self) -> &BTreeSet<String> {
        &self.baseline_hidden
    }

    /// Binaries that must never be UPX-compressed.
    pub fn compression_unsafe(&self) -> &BTreeSet<String> {
        &self.compression_unsafe
    }

    /// Denied modules plus denied prefixes, sorted.
    pub fn excluded_modules(&self) -> BTreeSet<String> {
        self.denied
            .iter()
            .chain(self.denied_prefixes.iter())
            .cloned()
            .collect()
    }
}

/// Incremental [`Registry`] construction.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    inner: Registry,
}

impl RegistryBuilder {
    /// Add standard-library names.
    pub fn stdlib<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.inner
            .stdlib
            .extend(names.into_iter().map(str::to_string));
        self
    }

    /// Map an import name to its distribution. The first mapping for a
    /// distribution provides the inverse lookup.
    pub fn distribution(mut self, import: &str, distribution: &str) -> Self {
        self.inner
            .distribution_names
            .insert(import.to_string(), distribution.to_string());
        self.inner
            .import_names
            .entry(normalize_distribution(distribution))
            .or_insert_with(|| import.to_string());
        self
    }

    /// Like [`distribution`](Self::distribution) but also replaces the inverse.
    fn distribution_override(mut self, import: &str, distribution: &str) -> Self {
        self.inner
            .distribution_names
            .insert(import.to_string(), distribution.to_string());
        self.inner
            .import_names
            .insert(normalize_distribution(distribution), import.to_string());
        self
    }

    /// Add implicit runtime dependencies of a module.
    pub fn implicit<'a>(mut self, module: &str, deps: impl IntoIterator<Item = &'a str>) -> Self {
        self.inner
            .implicit
            .entry(module.to_string())
            .or_default()
            .extend(deps.into_iter().map(str::to_string));
        self
    }

    /// Classify a package as complex.
    pub fn complex(mut self, name: &str) -> Self {
        self.inner.complex.insert(name.to_string());
        self
    }

    /// Classify a package as giant (and therefore complex).
    pub fn giant(mut self, name: &str) -> Self {
        self.inner.complex.insert(name.to_string());
        self.inner.giant.insert(name.to_string());
        self
    }

    /// Require metadata bundling for a package.
    pub fn metadata(mut self, name: &str) -> Self {
        self.inner.metadata.insert(name.to_string());
        self
    }

    /// Deny a package outright.
    pub fn denied(mut self, name: &str) -> Self {
        self.inner.denied.insert(name.to_string());
        self
    }

    /// Deny a dotted prefix from hidden imports.
    pub fn denied_prefix(mut self, prefix: &str) -> Self {
        self.inner.denied_prefixes.insert(prefix.to_string());
        self
    }

    /// Add baseline hidden imports.
    pub fn baseline_hidden<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.inner
            .baseline_hidden
            .extend(names.into_iter().map(str::to_string));
        self
    }

    /// Add compression-unsafe binaries.
    pub fn compression_unsafe<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.inner
            .compression_unsafe
            .extend(names.into_iter().map(str::to_string));
        self
    }

    /// Finish construction.
    pub fn build(self) -> Registry {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn builtin_knows_stdlib() {
        let registry = Registry::builtin();
        assert!(registry.is_stdlib("os"));
        assert!(registry.is_stdlib("tkinter"));
        assert!(registry.is_stdlib("__future__"));
        assert!(!registry.is_stdlib("numpy"));
        assert!(!registry.is_stdlib("os.path"));
    }

    #[test]
    fn distribution_name_defaults_to_identity() {
        let registry = Registry::builtin();
        assert_eq!(registry.distribution_name("PIL"), "Pillow");
        assert_eq!(registry.distribution_name("requests"), "requests");
        assert_eq!(registry.distribution_name(""), "");
    }

    #[test]
    fn import_name_inverts_mapping() {
        let registry = Registry::builtin();
        assert_eq!(registry.import_name("Pillow"), "PIL");
        assert_eq!(registry.import_name("pillow"), "PIL");
        assert_eq!(registry.import_name("Python_Dateutil"), "dateutil");
        assert_eq!(registry.import_name("pywin32"), "win32api");
    }

    #[test]
    fn import_name_normalizes_unmapped() {
        let registry = Registry::builtin();
        assert_eq!(registry.import_name("Flask-Login"), "flask_login");
    }

    #[test]
    fn implicit_dependencies_lookup() {
        let registry = Registry::builtin();
        let deps = registry.implicit_dependencies("tkinter");
        assert!(deps.contains("tkinter.ttk"));
        assert!(registry.implicit_dependencies("unknown").is_empty());
    }

    #[test]
    fn giant_implies_complex() {
        let registry = Registry::builtin();
        assert!(registry.is_giant("numpy"));
        assert!(registry.is_complex("numpy"));
        assert!(registry.is_complex("pandas"));
        assert!(!registry.is_giant("pandas"));
    }

    #[test]
    fn classification_uses_top_level() {
        let registry = Registry::builtin();
        assert!(registry.is_giant("numpy.linalg"));
        assert!(registry.is_denied("pytest.mark"));
        assert!(registry.requires_metadata_copy("tqdm.auto"));
    }

    #[test]
    fn unknown_names_get_conservative_defaults() {
        let registry = Registry::builtin();
        for name in ["", "zzz_unknown", "a.b.c", "$(rm -rf)"] {
            assert!(!registry.is_complex(name));
            assert!(!registry.is_giant(name));
            assert!(!registry.requires_metadata_copy(name));
            assert!(!registry.is_denied(name));
            assert!(registry.denied_prefix(name).is_none());
        }
    }

    #[test]
    fn denied_prefix_matches_segments() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.denied_prefix("numpy.testing.utils"),
            Some("numpy.testing")
        );
        assert!(registry.denied_prefix("numpy.linalg").is_none());
        assert!(registry.denied_prefix("numpy").is_none());
    }

    #[test]
    fn excluded_modules_merge_denied_and_prefixes() {
        let registry = Registry::builtin();
        let excluded = registry.excluded_modules();
        assert!(excluded.contains("pytest"));
        assert!(excluded.contains("numpy.f2py"));
    }

    #[test]
    fn builder_creates_minimal_registry() {
        let registry = Registry::builder()
            .stdlib(["os"])
            .distribution("foo", "foo-dist")
            .giant("big")
            .build();

        assert!(registry.is_stdlib("os"));
        assert!(!registry.is_stdlib("json"));
        assert_eq!(registry.distribution_name("foo"), "foo-dist");
        assert_eq!(registry.import_name("foo_dist"), "foo");
        assert!(registry.is_complex("big"));
        assert!(registry.baseline_hidden_imports().is_empty());
    }

    #[test]
    fn overrides_extend_builtin() {
        let overrides = RegistryOverrides {
            distribution_names: HashMap::from([("mylib".to_string(), "my-lib".to_string())]),
            denied: vec!["internal_tool".to_string()],
            metadata: vec!["mylib".to_string()],
            ..Default::default()
        };

        let registry = Registry::builtin().with_overrides(&overrides);
        assert_eq!(registry.distribution_name("mylib"), "my-lib");
        assert_eq!(registry.import_name("my-lib"), "mylib");
        assert!(registry.is_denied("internal_tool"));
        assert!(registry.requires_metadata_copy("mylib"));
        assert!(registry.is_stdlib("os"));
    }
}
