//! Build directive synthesis.
//!
//! [`synthesize`] turns a [`Resolution`] into an ordered list of
//! packaging-backend directives. It performs no I/O, and identical inputs
//! always produce identical output.
//!
//! Order of the emitted directives:
//!
//! 1. `--exclude-module` for every excluded module, when dev tooling is excluded.
//! 2. `--add-data` for every data file, in path order.
//! 3. Per top-level module, lexicographically: `--hidden-import` for the
//!    module and its known submodules, `--collect-submodules` for complex
//!    (non-giant) packages, `--copy-metadata` for packages that read their
//!    own metadata.
//! 4. `--collect-all` for the packaging-runtime packages, in safe mode.
//! 5. `--upx-exclude` for every compression-unsafe binary, when compressing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::pipeline::{RejectReason, RejectedName, Resolution};
use crate::registry::{is_safe_distribution_name, is_safe_import_name, Registry};

/// A packaging-backend flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectiveFlag {
    HiddenImport,
    CollectSubmodules,
    CopyMetadata,
    ExcludeModule,
    UpxExclude,
    AddData,
    CollectAll,
}

impl DirectiveFlag {
    /// Command-line spelling.
    pub fn as_flag(&self) -> &'static str {
        match self {
            DirectiveFlag::HiddenImport => "--hidden-import",
            DirectiveFlag::CollectSubmodules => "--collect-submodules",
            DirectiveFlag::CopyMetadata => "--copy-metadata",
            DirectiveFlag::ExcludeModule => "--exclude-module",
            DirectiveFlag::UpxExclude => "--upx-exclude",
            DirectiveFlag::AddData => "--add-data",
            DirectiveFlag::CollectAll => "--collect-all",
        }
    }
}

/// One flag and its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Directive {
    pub flag: DirectiveFlag,
    pub value: String,
}

impl Directive {
    pub fn new(flag: DirectiveFlag, value: impl Into<String>) -> Self {
        Self {
            flag,
            value: value.into(),
        }
    }

    /// `["--flag", "value"]`, ready to append to an argument vector.
    pub fn to_args(&self) -> [String; 2] {
        [self.flag.as_flag().to_string(), self.value.clone()]
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.flag.as_flag(), self.value)
    }
}

/// Switches that add whole directive groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisOptions {
    /// The bundle will be UPX-compressed.
    pub compress: bool,
    /// Exclude dev tooling and test packages from the bundle.
    pub exclude_dev_tooling: bool,
    /// Bundle the packaging-runtime packages whole.
    pub safe_mode: bool,
}

/// Packages collected whole in safe mode.
pub const SAFE_MODE_PACKAGES: &[&str] = &["pkg_resources", "tkinter"];

/// Separator between source and destination in an `--add-data` value.
const DATA_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// `--add-data` value placing `path` at the bundle root.
pub fn add_data_value(path: &Path) -> String {
    format!("{}{}.", path.display(), DATA_SEPARATOR)
}

/// Synthesis output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    pub directives: Vec<Directive>,
    /// Resolution rejections followed by any found during synthesis.
    pub rejected: Vec<RejectedName>,
    /// Distributions to install before packaging, sorted.
    pub missing: Vec<String>,
}

impl Synthesis {
    /// Flattened argument vector for every directive.
    pub fn to_args(&self) -> Vec<String> {
        self.directives.iter().flat_map(Directive::to_args).collect()
    }

    /// Directives with the given flag, in order.
    pub fn with_flag(&self, flag: DirectiveFlag) -> impl Iterator<Item = &Directive> {
        self.directives.iter().filter(move |d| d.flag == flag)
    }
}

/// Turn a resolution into build directives.
pub fn synthesize(
    resolution: &Resolution,
    registry: &Registry,
    options: &SynthesisOptions,
) -> Synthesis {
    synthesize_with_data(resolution, registry, options, &[])
}

/// [`synthesize`], also bundling `data_files` at the bundle root.
pub fn synthesize_with_data(
    resolution: &Resolution,
    registry: &Registry,
    options: &SynthesisOptions,
    data_files: &[PathBuf],
) -> Synthesis {
    let mut synthesis = Synthesis {
        rejected: resolution.rejected.clone(),
        ..Default::default()
    };
    let mut missing = BTreeSet::new();
    let mut metadata_copied = BTreeSet::new();

    if options.exclude_dev_tooling {
        for module in registry.excluded_modules() {
            synthesis
                .directives
                .push(Directive::new(DirectiveFlag::ExcludeModule, module));
        }
    }

    let data_files: BTreeSet<&PathBuf> = data_files.iter().collect();
    for path in data_files {
        synthesis
            .directives
            .push(Directive::new(DirectiveFlag::AddData, add_data_value(path)));
    }

    for (module, info) in &resolution.modules {
        if registry.is_denied(module) {
            debug!("Skipping denied module {}", module);
            continue;
        }
        if !is_safe_import_name(module) {
            synthesis
                .rejected
                .push(RejectedName::new(module.as_str(), RejectReason::UnsafeImportName));
            continue;
        }
        if !is_safe_distribution_name(&info.distribution_name) {
            synthesis.rejected.push(RejectedName::new(
                info.distribution_name.as_str(),
                RejectReason::UnsafeDistributionName,
            ));
            continue;
        }
        if !info.available {
            missing.insert(info.distribution_name.clone());
            continue;
        }

        synthesis
            .directives
            .push(Directive::new(DirectiveFlag::HiddenImport, module.as_str()));
        for submodule in resolution.submodules_of(module) {
            if submodule == module || !is_safe_import_name(submodule) {
                continue;
            }
            if let Some(prefix) = registry.denied_prefix(submodule) {
                debug!("Skipping {} (denied prefix {})", submodule, prefix);
                continue;
            }
            synthesis
                .directives
                .push(Directive::new(DirectiveFlag::HiddenImport, submodule.as_str()));
        }

        if registry.is_complex(module) && !registry.is_giant(module) {
            synthesis
                .directives
                .push(Directive::new(DirectiveFlag::CollectSubmodules, module.as_str()));
        }

        if registry.requires_metadata_copy(module)
            && metadata_copied.insert(info.distribution_name.clone())
        {
            synthesis.directives.push(Directive::new(
                DirectiveFlag::CopyMetadata,
                info.distribution_name.as_str(),
            ));
        }
    }

    if options.safe_mode {
        for package in SAFE_MODE_PACKAGES {
            synthesis
                .directives
                .push(Directive::new(DirectiveFlag::CollectAll, *package));
        }
    }

    if options.compress {
        for binary in registry.compression_unsafe() {
            synthesis
                .directives
                .push(Directive::new(DirectiveFlag::UpxExclude, binary.as_str()));
        }
    }

    synthesis.missing = missing.into_iter().collect();
    debug!(
        "Synthesized {} directives, {} missing distributions",
        synthesis.directives.len(),
        synthesis.missing.len()
    );
    synthesis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ModuleInfo;
    use std::collections::BTreeMap;

    fn registry() -> Registry {
        Registry::builder()
            .stdlib(["os"])
            .distribution("PIL", "Pillow")
            .complex("pandas")
            .giant("numpy")
            .metadata("tqdm")
            .metadata("tqdm_extra")
            .distribution("tqdm_extra", "tqdm")
            .denied("pytest")
            .denied_prefix("numpy.testing")
            .compression_unsafe(["vcruntime140.dll", "python3.dll"])
            .build()
    }

    fn resolution(modules: &[(&str, ModuleInfo)], submodules: &[&str]) -> Resolution {
        Resolution {
            modules: modules
                .iter()
                .map(|(name, info)| (name.to_string(), info.clone()))
                .collect::<BTreeMap<_, _>>(),
            submodules: submodules.iter().map(|s| s.to_string()).collect(),
            rejected: Vec::new(),
        }
    }

    fn rendered(synthesis: &Synthesis) -> Vec<String> {
        synthesis.directives.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn giant_package_gets_hidden_import_only() {
        let res = resolution(
            &[("numpy", ModuleInfo::installed("numpy", Some("1.26.0".into())))],
            &["numpy.linalg", "numpy.testing", "numpy.testing.utils"],
        );
        let synthesis = synthesize(&res, &registry(), &SynthesisOptions::default());

        assert_eq!(
            rendered(&synthesis),
            vec!["--hidden-import numpy", "--hidden-import numpy.linalg"]
        );
    }

    #[test]
    fn complex_package_collects_submodules() {
        let res = resolution(&[("pandas", ModuleInfo::installed("pandas", None))], &[]);
        let synthesis = synthesize(&res, &registry(), &SynthesisOptions::default());

        assert_eq!(
            rendered(&synthesis),
            vec!["--hidden-import pandas", "--collect-submodules pandas"]
        );
    }

    #[test]
    fn metadata_copied_once_per_distribution() {
        let res = resolution(
            &[
                ("tqdm", ModuleInfo::installed("tqdm", None)),
                ("tqdm_extra", ModuleInfo::installed("tqdm", None)),
            ],
            &[],
        );
        let synthesis = synthesize(&res, &registry(), &SynthesisOptions::default());
        assert_eq!(synthesis.with_flag(DirectiveFlag::CopyMetadata).count(), 1);
    }

    #[test]
    fn unavailable_modules_are_missing_not_bundled() {
        let res = resolution(&[("foo_bar", ModuleInfo::missing("foo_bar"))], &["foo_bar.x"]);
        let synthesis = synthesize(&res, &registry(), &SynthesisOptions::default());

        assert!(synthesis.directives.is_empty());
        assert_eq!(synthesis.missing, vec!["foo_bar"]);
    }

    #[test]
    fn denied_modules_emit_nothing() {
        let res = resolution(
            &[("pytest", ModuleInfo::installed("pytest", None))],
            &["pytest.mark"],
        );
        let synthesis = synthesize(&res, &registry(), &SynthesisOptions::default());
        assert!(synthesis.directives.is_empty());
        assert!(synthesis.missing.is_empty());
    }

    #[test]
    fn unsafe_distribution_is_rejected() {
        let res = resolution(&[("evil", ModuleInfo::missing("evil; rm -rf /"))], &[]);
        let synthesis = synthesize(&res, &registry(), &SynthesisOptions::default());

        assert!(synthesis.missing.is_empty());
        assert_eq!(synthesis.rejected.len(), 1);
        assert_eq!(synthesis.rejected[0].reason, RejectReason::UnsafeDistributionName);
    }

    #[test]
    fn unsafe_names_never_reach_directives() {
        let res = resolution(
            &[("os", ModuleInfo::stdlib("os"))],
            &["os.path", "os.$(reboot)"],
        );
        let synthesis = synthesize(&res, &registry(), &SynthesisOptions::default());
        assert!(synthesis.to_args().iter().all(|arg| !arg.contains('$')));
    }

    #[test]
    fn exclusions_come_first_and_upx_last() {
        let res = resolution(&[("os", ModuleInfo::stdlib("os"))], &[]);
        let options = SynthesisOptions {
            compress: true,
            exclude_dev_tooling: true,
            safe_mode: false,
        };
        let synthesis = synthesize(&res, &registry(), &options);

        assert_eq!(
            rendered(&synthesis),
            vec![
                "--exclude-module numpy.testing",
                "--exclude-module pytest",
                "--hidden-import os",
                "--upx-exclude python3.dll",
                "--upx-exclude vcruntime140.dll",
            ]
        );
    }

    #[test]
    fn data_files_follow_exclusions_and_safe_mode_precedes_upx() {
        let res = resolution(&[("os", ModuleInfo::stdlib("os"))], &[]);
        let options = SynthesisOptions {
            compress: true,
            exclude_dev_tooling: true,
            safe_mode: true,
        };
        let data = [PathBuf::from("/game/levels.json"), PathBuf::from("/game/icon.png")];
        let synthesis = synthesize_with_data(&res, &registry(), &options, &data);

        let flags: Vec<DirectiveFlag> = synthesis.directives.iter().map(|d| d.flag).collect();
        assert_eq!(
            flags,
            vec![
                DirectiveFlag::ExcludeModule,
                DirectiveFlag::ExcludeModule,
                DirectiveFlag::AddData,
                DirectiveFlag::AddData,
                DirectiveFlag::HiddenImport,
                DirectiveFlag::CollectAll,
                DirectiveFlag::CollectAll,
                DirectiveFlag::UpxExclude,
                DirectiveFlag::UpxExclude,
            ]
        );
        let data_values: Vec<&str> = synthesis
            .with_flag(DirectiveFlag::AddData)
            .map(|d| d.value.as_str())
            .collect();
        assert_eq!(
            data_values,
            vec![
                add_data_value(Path::new("/game/icon.png")),
                add_data_value(Path::new("/game/levels.json")),
            ]
        );
        let collected: Vec<&str> = synthesis
            .with_flag(DirectiveFlag::CollectAll)
            .map(|d| d.value.as_str())
            .collect();
        assert_eq!(collected, vec!["pkg_resources", "tkinter"]);
    }

    #[test]
    fn safe_mode_is_off_by_default() {
        let res = resolution(&[("os", ModuleInfo::stdlib("os"))], &[]);
        let synthesis = synthesize(&res, &registry(), &SynthesisOptions::default());
        assert_eq!(synthesis.with_flag(DirectiveFlag::CollectAll).count(), 0);
        assert_eq!(synthesis.with_flag(DirectiveFlag::AddData).count(), 0);
    }

    #[test]
    fn add_data_places_file_at_bundle_root() {
        let value = add_data_value(Path::new("/srv/app/logo.png"));
        assert!(value.starts_with("/srv/app/logo.png"));
        assert!(value.ends_with('.'));
        assert_eq!(value.len(), "/srv/app/logo.png".len() + 2);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let res = resolution(
            &[
                ("pandas", ModuleInfo::installed("pandas", None)),
                ("PIL", ModuleInfo::cached("Pillow", true, Some("10.0".into()))),
                ("numpy", ModuleInfo::installed("numpy", None)),
                ("foo", ModuleInfo::timed_out("foo")),
            ],
            &["PIL.Image", "numpy.core"],
        );
        let options = SynthesisOptions {
            compress: true,
            exclude_dev_tooling: true,
            safe_mode: true,
        };
        let first = synthesize(&res, &registry(), &options);
        let second = synthesize(&res, &registry(), &options);
        assert_eq!(first, second);
        assert_eq!(first.to_args(), second.to_args());
    }

    #[test]
    fn directive_args_render() {
        let directive = Directive::new(DirectiveFlag::CopyMetadata, "tqdm");
        assert_eq!(directive.to_args(), ["--copy-metadata".to_string(), "tqdm".to_string()]);
    }
}
