//! Availability resolution: safety filter, stdlib, cache, then probe.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

use super::expand::ExpandedImports;
use crate::cache::{interpreter_key, CacheEntry, CacheStore};
use crate::probe::{ModuleInfo, ProbeRequest, ProbeStrategy};
use crate::registry::{is_safe_distribution_name, is_safe_import_name, top_level, Registry};

/// Why a name was kept away from every process and directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnsafeImportName,
    UnsafeDistributionName,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UnsafeImportName => f.write_str("unsafe import name"),
            RejectReason::UnsafeDistributionName => f.write_str("unsafe distribution name"),
        }
    }
}

/// A name that failed the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedName {
    pub name: String,
    pub reason: RejectReason,
}

impl RejectedName {
    pub fn new(name: impl Into<String>, reason: RejectReason) -> Self {
        let name = name.into();
        warn!("Rejected {:?}: {}", name, reason);
        Self { name, reason }
    }
}

/// Availability of every safe top-level module in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub modules: BTreeMap<String, ModuleInfo>,
    /// Safe dotted names whose top level is in `modules`.
    pub submodules: BTreeSet<String>,
    pub rejected: Vec<RejectedName>,
}

impl Resolution {
    /// Known submodules nested under `module`, sorted.
    pub fn submodules_of<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.submodules
            .iter()
            .filter(move |name| top_level(name) == module)
    }
}

/// Resolve each expanded module without probing anything twice.
///
/// Unsafe names are rejected before they reach the cache or a process.
/// Cached results are only reused for the interpreter they were probed in.
/// Standard-library modules never spawn anything. Only definitive probe
/// results are written back to the cache.
pub fn resolve(
    expanded: &ExpandedImports,
    registry: &Registry,
    prober: &dyn ProbeStrategy,
    interpreter: &Path,
    mut cache: Option<&mut CacheStore>,
) -> Resolution {
    let mut resolution = Resolution::default();
    let mut to_probe = Vec::new();
    let interpreter_id = interpreter_key(interpreter);

    for module in &expanded.modules {
        if !is_safe_import_name(module) {
            resolution
                .rejected
                .push(RejectedName::new(module.as_str(), RejectReason::UnsafeImportName));
            continue;
        }

        let distribution = registry.distribution_name(module);
        if registry.is_stdlib(module) {
            resolution
                .modules
                .insert(module.clone(), ModuleInfo::stdlib(distribution));
            continue;
        }

        if !is_safe_distribution_name(&distribution) {
            resolution.rejected.push(RejectedName::new(
                distribution,
                RejectReason::UnsafeDistributionName,
            ));
            continue;
        }

        if let Some(entry) = cache.as_deref().and_then(|c| c.get(&interpreter_id, module)) {
            debug!("Cache hit for {}", module);
            resolution.modules.insert(
                module.clone(),
                ModuleInfo::cached(distribution, entry.available, entry.version),
            );
            continue;
        }

        to_probe.push((module.clone(), distribution));
    }

    for name in &expanded.submodules {
        if !is_safe_import_name(name) {
            resolution
                .rejected
                .push(RejectedName::new(name.as_str(), RejectReason::UnsafeImportName));
        } else if expanded.modules.contains(top_level(name)) {
            resolution.submodules.insert(name.clone());
        }
    }
    // Drop submodules of rejected parents.
    let accepted: BTreeSet<&str> = resolution
        .modules
        .keys()
        .map(String::as_str)
        .chain(to_probe.iter().map(|(m, _)| m.as_str()))
        .collect();
    resolution
        .submodules
        .retain(|name| accepted.contains(top_level(name)));

    if to_probe.is_empty() {
        debug!("Nothing to probe");
        return resolution;
    }

    let request = ProbeRequest::new(interpreter, to_probe);
    debug!(
        "Probing {} modules with the {} strategy",
        request.modules.len(),
        prober.name()
    );
    let mut probed = prober.probe(&request);

    let mut definitive = Vec::new();
    for (module, distribution) in request.modules {
        let info = probed
            .remove(&module)
            .unwrap_or_else(|| ModuleInfo::probe_failed(distribution));
        if info.status.is_definitive() {
            definitive.push((module.clone(), info.clone()));
        }
        resolution.modules.insert(module, info);
    }

    if let Some(cache) = cache.as_deref_mut() {
        let now = cache.now();
        cache.set_batch(definitive.into_iter().map(|(module, info)| {
            CacheEntry::new(interpreter_id.as_str(), module, info.available, info.version, now)
        }));
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MachineKey;
    use crate::probe::ModuleStatus;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers from a fixed table and records every request.
    struct TableProbe {
        installed: BTreeMap<&'static str, &'static str>,
        requests: Mutex<Vec<Vec<String>>>,
    }

    impl TableProbe {
        fn new(installed: &[(&'static str, &'static str)]) -> Self {
            Self {
                installed: installed.iter().copied().collect(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn probed(&self) -> Vec<Vec<String>> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ProbeStrategy for TableProbe {
        fn name(&self) -> &'static str {
            "table"
        }

        fn probe(&self, request: &ProbeRequest) -> BTreeMap<String, ModuleInfo> {
            self.requests
                .lock()
                .unwrap()
                .push(request.modules.iter().map(|(m, _)| m.clone()).collect());
            request
                .modules
                .iter()
                .map(|(module, dist)| {
                    let info = match self.installed.get(module.as_str()) {
                        Some(version) => ModuleInfo::installed(dist.clone(), Some(version.to_string())),
                        None if module == "slow" => ModuleInfo::timed_out(dist.clone()),
                        None => ModuleInfo::missing(dist.clone()),
                    };
                    (module.clone(), info)
                })
                .collect()
        }
    }

    fn registry() -> Registry {
        Registry::builder()
            .stdlib(["os", "sys", "json"])
            .distribution("PIL", "Pillow")
            .distribution("evil", "bad dist")
            .build()
    }

    fn expanded(modules: &[&str], submodules: &[&str]) -> ExpandedImports {
        ExpandedImports {
            modules: modules.iter().map(|s| s.to_string()).collect(),
            submodules: submodules.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn cache(temp: &TempDir) -> CacheStore {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        CacheStore::open_with_key(
            temp.path().join("cache.json"),
            Duration::days(7),
            MachineKey::new("test"),
        )
        .with_clock(move || t0)
    }

    #[test]
    fn stdlib_never_probes() {
        let probe = TableProbe::new(&[]);
        let resolution = resolve(
            &expanded(&["os", "sys", "json"], &["os.path"]),
            &registry(),
            &probe,
            Path::new("python3"),
            None,
        );

        assert!(probe.probed().is_empty());
        assert!(resolution
            .modules
            .values()
            .all(|info| info.available && info.status == ModuleStatus::Stdlib));
        assert!(resolution.submodules.contains("os.path"));
    }

    #[test]
    fn third_party_modules_probed_once() {
        let probe = TableProbe::new(&[("PIL", "10.0.0")]);
        let resolution = resolve(
            &expanded(&["PIL", "foo_bar", "os"], &[]),
            &registry(),
            &probe,
            Path::new("python3"),
            None,
        );

        assert_eq!(probe.probed(), vec![vec!["PIL".to_string(), "foo_bar".to_string()]]);
        let pil = &resolution.modules["PIL"];
        assert_eq!(pil.distribution_name, "Pillow");
        assert_eq!(pil.version.as_deref(), Some("10.0.0"));
        assert!(!resolution.modules["foo_bar"].available);
    }

    #[test]
    fn unsafe_names_are_rejected_before_probing() {
        let probe = TableProbe::new(&[]);
        let resolution = resolve(
            &expanded(&["os; rm -rf ~", "evil"], &["os; rm -rf ~.x", "$(id).y"]),
            &registry(),
            &probe,
            Path::new("python3"),
            None,
        );

        assert!(probe.probed().is_empty());
        assert!(resolution.modules.is_empty());
        assert!(resolution.submodules.is_empty());
        let rejected: Vec<_> = resolution.rejected.iter().map(|r| r.name.as_str()).collect();
        assert!(rejected.contains(&"os; rm -rf ~"));
        assert!(rejected.contains(&"bad dist"));
        assert!(rejected.contains(&"$(id).y"));
    }

    #[test]
    fn cache_hits_skip_probe_and_definitive_results_are_cached() {
        let temp = TempDir::new().unwrap();
        let mut store = cache(&temp);
        let probe = TableProbe::new(&[("numpy", "1.26.0")]);
        let input = expanded(&["numpy", "foo_bar", "slow"], &[]);

        let first = resolve(&input, &registry(), &probe, Path::new("python3"), Some(&mut store));
        assert_eq!(first.modules["numpy"].status, ModuleStatus::Installed);
        assert_eq!(first.modules["slow"].status, ModuleStatus::Timeout);
        assert_eq!(store.len(), 2);
        assert!(store.get("python3", "slow").is_none());

        let second = resolve(&input, &registry(), &probe, Path::new("python3"), Some(&mut store));
        assert_eq!(second.modules["numpy"].status, ModuleStatus::Cached);
        assert_eq!(second.modules["numpy"].version.as_deref(), Some("1.26.0"));
        assert_eq!(second.modules["foo_bar"].status, ModuleStatus::Cached);
        assert!(!second.modules["foo_bar"].available);
        // only the transient result is probed again
        assert_eq!(probe.probed()[1], vec!["slow".to_string()]);
    }

    #[test]
    fn submodules_of_filters_by_parent() {
        let resolution = Resolution {
            submodules: ["a.x", "a.y.z", "b.x"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let subs: Vec<_> = resolution.submodules_of("a").collect();
        assert_eq!(subs, vec!["a.x", "a.y.z"]);
    }

    #[test]
    fn cached_results_do_not_leak_between_interpreters() {
        let temp = TempDir::new().unwrap();
        let mut store = cache(&temp);
        let input = expanded(&["numpy"], &[]);

        let in_a = TableProbe::new(&[("numpy", "1.26.0")]);
        let a = resolve(&input, &registry(), &in_a, Path::new("/venv-a/bin/python"), Some(&mut store));
        assert!(a.modules["numpy"].available);

        let in_b = TableProbe::new(&[]);
        let b = resolve(&input, &registry(), &in_b, Path::new("/venv-b/bin/python"), Some(&mut store));
        assert_eq!(in_b.probed(), vec![vec!["numpy".to_string()]]);
        assert_eq!(b.modules["numpy"].status, ModuleStatus::Missing);
        assert!(!b.modules["numpy"].available);

        let again = resolve(&input, &registry(), &in_a, Path::new("/venv-a/bin/python"), Some(&mut store));
        assert_eq!(again.modules["numpy"].status, ModuleStatus::Cached);
        assert!(again.modules["numpy"].available);
    }
}
