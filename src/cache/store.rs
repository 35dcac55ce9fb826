//! Cache storage implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::entry::{entry_key, CacheEntry, CacheStats};
use super::signature::{sign, verify, MachineKey};
use super::validation::{validate, ValidationResult};

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// On-disk layout of the cache file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheContainer {
    pub entries: BTreeMap<String, CacheEntry>,
    pub signature: String,
}

/// Signed, TTL-bounded store of module availability results.
///
/// Any file that cannot be read, parsed or verified loads as an empty
/// container. Write failures are logged and the in-memory state is kept.
pub struct CacheStore {
    path: PathBuf,
    ttl: Duration,
    key: MachineKey,
    clock: Clock,
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheStore {
    /// Open the cache at `path` keyed to this machine.
    pub fn open(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self::open_with_key(path, ttl, MachineKey::local())
    }

    /// Open the cache at `path` with an explicit signing key.
    pub fn open_with_key(path: impl Into<PathBuf>, ttl: Duration, key: MachineKey) -> Self {
        let mut store = Self {
            path: path.into(),
            ttl,
            key,
            clock: Arc::new(Utc::now),
            entries: BTreeMap::new(),
        };
        store.load();
        store
    }

    /// Replace the clock used for TTL checks and new timestamps.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Get the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Reload from disk, discarding in-memory state.
    pub fn load(&mut self) {
        self.entries = match self.read_verified() {
            Ok(Some(entries)) => {
                debug!("Loaded {} cache entries from {:?}", entries.len(), self.path);
                entries
            }
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!("Ignoring cache file {:?}: {:#}", self.path, e);
                BTreeMap::new()
            }
        };
    }

    fn read_verified(&self) -> Result<Option<BTreeMap<String, CacheEntry>>> {
        if !self.path.exists() {
            debug!("No cache file at {:?}", self.path);
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        let container: CacheContainer =
            serde_json::from_str(&json).context("Malformed cache container")?;

        if !verify(&container.entries, &container.signature, &self.key) {
            anyhow::bail!("signature mismatch");
        }
        Ok(Some(container.entries))
    }

    /// Look up a fresh entry for `module` probed in `interpreter`.
    pub fn get(&self, interpreter: &str, module: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(&entry_key(interpreter, module));
        match validate(entry, self.now(), self.ttl) {
            ValidationResult::Fresh => entry.cloned(),
            ValidationResult::Expired => {
                debug!("Cache entry for {} in {} expired", module, interpreter);
                None
            }
            ValidationResult::NotFound => None,
        }
    }

    /// Record one entry and persist.
    pub fn set(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.key(), entry);
        self.persist();
    }

    /// Record several entries and persist once.
    pub fn set_batch(&mut self, entries: impl IntoIterator<Item = CacheEntry>) {
        let before = self.entries.len();
        let mut count = 0;
        for entry in entries {
            self.entries.insert(entry.key(), entry);
            count += 1;
        }
        if count > 0 {
            debug!(
                "Cached {} results ({} new)",
                count,
                self.entries.len() - before
            );
            self.persist();
        }
    }

    /// Drop every entry and persist an empty container. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.persist();
        removed
    }

    /// All recorded entries, fresh or not, ordered by module then interpreter.
    pub fn entries(&self) -> Vec<&CacheEntry> {
        self.entries.values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry is fresh at the store's current time.
    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.is_fresh(self.now(), self.ttl)
    }

    /// Count entries by freshness and availability.
    pub fn stats(&self) -> CacheStats {
        let now = self.now();
        let mut stats = CacheStats::default();
        for entry in self.entries.values() {
            stats.total += 1;
            if entry.is_fresh(now, self.ttl) {
                stats.fresh += 1;
            } else {
                stats.expired += 1;
            }
            if entry.available {
                stats.available += 1;
            } else {
                stats.missing += 1;
            }
        }
        stats
    }

    fn persist(&self) {
        if let Err(e) = self.write() {
            warn!("Failed to write cache {:?}: {:#}", self.path, e);
        }
    }

    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create cache directory {:?}", parent))?;
            }
        }

        let container = CacheContainer {
            signature: sign(&self.entries, &self.key),
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&container)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("path", &self.path)
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.len())
            .finish()
    }
}
