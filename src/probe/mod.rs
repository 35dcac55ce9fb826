//! Module availability probing.
//!
//! A [`ProbeStrategy`] asks the target interpreter whether each requested
//! module imports, and which version is installed. Two interchangeable
//! strategies exist:
//!
//! - [`BatchProbe`] spawns one interpreter per chunk of modules.
//! - [`PoolProbe`] runs a bounded worker pool with one spawn per module.
//!
//! Both share one deadline for the whole phase, never probe a module
//! twice, and turn every failure into a per-module status instead of an
//! error. [`strategy_for`] picks one from [`ProbeSettings`].

mod batch;
mod pool;
mod process;
mod script;

pub use batch::BatchProbe;
pub use pool::PoolProbe;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// How a module's availability was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    /// Part of the standard library; never probed.
    Stdlib,
    /// Served from a fresh cache entry.
    Cached,
    /// Imported successfully in the target interpreter.
    Installed,
    /// The import failed because the module is not installed.
    Missing,
    /// The probe could not run or the import raised something else.
    ProbeFailed,
    /// The probing phase ran out of time before this module finished.
    Timeout,
}

impl ModuleStatus {
    /// Results that reflect the interpreter's real state and may be cached.
    pub fn is_definitive(&self) -> bool {
        matches!(self, ModuleStatus::Installed | ModuleStatus::Missing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Stdlib => "stdlib",
            ModuleStatus::Cached => "cached",
            ModuleStatus::Installed => "installed",
            ModuleStatus::Missing => "missing",
            ModuleStatus::ProbeFailed => "probe failed",
            ModuleStatus::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved availability of one top-level module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub available: bool,
    pub version: Option<String>,
    pub distribution_name: String,
    pub status: ModuleStatus,
}

impl ModuleInfo {
    pub fn stdlib(distribution_name: impl Into<String>) -> Self {
        Self::with_status(distribution_name, true, None, ModuleStatus::Stdlib)
    }

    pub fn installed(distribution_name: impl Into<String>, version: Option<String>) -> Self {
        Self::with_status(distribution_name, true, version, ModuleStatus::Installed)
    }

    pub fn missing(distribution_name: impl Into<String>) -> Self {
        Self::with_status(distribution_name, false, None, ModuleStatus::Missing)
    }

    pub fn probe_failed(distribution_name: impl Into<String>) -> Self {
        Self::with_status(distribution_name, false, None, ModuleStatus::ProbeFailed)
    }

    pub fn timed_out(distribution_name: impl Into<String>) -> Self {
        Self::with_status(distribution_name, false, None, ModuleStatus::Timeout)
    }

    pub fn cached(
        distribution_name: impl Into<String>,
        available: bool,
        version: Option<String>,
    ) -> Self {
        Self::with_status(distribution_name, available, version, ModuleStatus::Cached)
    }

    fn with_status(
        distribution_name: impl Into<String>,
        available: bool,
        version: Option<String>,
        status: ModuleStatus,
    ) -> Self {
        Self {
            available,
            version,
            distribution_name: distribution_name.into(),
            status,
        }
    }
}

/// Modules to probe in one interpreter.
///
/// Names are expected to be safe, non-stdlib and not served by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub interpreter: PathBuf,
    /// `(import name, distribution name)`, deduplicated by import name.
    pub modules: Vec<(String, String)>,
}

impl ProbeRequest {
    /// Build a request, keeping the first occurrence of each import name.
    pub fn new(
        interpreter: impl Into<PathBuf>,
        modules: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut seen = std::collections::HashSet::new();
        let modules = modules
            .into_iter()
            .filter(|(import, _)| seen.insert(import.clone()))
            .collect();
        Self {
            interpreter: interpreter.into(),
            modules,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// A way of answering a [`ProbeRequest`].
pub trait ProbeStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Probe every requested module. The result has exactly one entry per
    /// requested import name.
    fn probe(&self, request: &ProbeRequest) -> BTreeMap<String, ModuleInfo>;
}

/// Which [`ProbeStrategy`] to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStrategyKind {
    #[default]
    Batch,
    Pool,
}

impl FromStr for ProbeStrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batch" => Ok(ProbeStrategyKind::Batch),
            "pool" => Ok(ProbeStrategyKind::Pool),
            other => Err(format!(
                "unknown probe strategy '{}' (expected batch or pool)",
                other
            )),
        }
    }
}

impl std::fmt::Display for ProbeStrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStrategyKind::Batch => f.write_str("batch"),
            ProbeStrategyKind::Pool => f.write_str("pool"),
        }
    }
}

/// Longest probing budget accepted from flags or config, in seconds (one day).
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Deadline `timeout` from now, clamped to [`MAX_TIMEOUT_SECS`].
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    let budget = timeout.min(Duration::from_secs(MAX_TIMEOUT_SECS));
    now.checked_add(budget).unwrap_or(now)
}

/// Probe tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub strategy: ProbeStrategyKind,
    /// Budget for the whole probing phase.
    pub timeout: Duration,
    /// Modules per interpreter spawn in batch mode.
    pub chunk_size: usize,
    /// Worker threads in pool mode.
    pub workers: usize,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            strategy: ProbeStrategyKind::Batch,
            timeout: Duration::from_secs(60),
            chunk_size: 64,
            workers: 8,
        }
    }
}

/// Build the configured strategy.
pub fn strategy_for(settings: &ProbeSettings) -> Box<dyn ProbeStrategy> {
    match settings.strategy {
        ProbeStrategyKind::Batch => Box::new(BatchProbe::new(settings.timeout, settings.chunk_size)),
        ProbeStrategyKind::Pool => Box::new(PoolProbe::new(settings.timeout, settings.workers)),
    }
}
