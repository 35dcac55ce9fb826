//! Module availability cache.
//!
//! Probe results are stored in a single signed JSON file so repeated
//! analyses skip the interpreter round-trip for modules already seen.
//! Entries expire after a TTL (7 days by default).

pub mod entry;
pub mod signature;
pub mod store;
pub mod validation;

pub use entry::{entry_key, interpreter_key, CacheEntry, CacheStats};
pub use signature::MachineKey;
pub use store::{CacheContainer, CacheStore, Clock};
pub use validation::{format_duration, parse_ttl, ValidationResult};

/// Default lifetime of a cache entry.
pub const DEFAULT_TTL: &str = "7d";

/// Get the default cache directory.
pub fn default_cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("packwise")
}

/// Get the default cache file path.
pub fn default_cache_path() -> std::path::PathBuf {
    default_cache_dir().join("module_cache.json")
}
