//! Container signatures.
//!
//! The key is a locally reproducible machine fingerprint, not a secret.
//! It detects corruption and cache files copied between machines; it
//! does not stop someone on the same machine from re-signing a file.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::entry::CacheEntry;

/// Key mixed into every signature.
#[derive(Clone, PartialEq, Eq)]
pub struct MachineKey(String);

impl MachineKey {
    /// Fingerprint of the current host and login.
    pub fn local() -> Self {
        Self(format!("{}/{}", hostname(), login_name()))
    }

    /// Use an explicit key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for MachineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MachineKey(..)")
    }
}

fn hostname() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string())
}

fn login_name() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// `hex(sha256(key || 0x00 || canonical_json(entries)))`
pub fn sign(entries: &BTreeMap<String, CacheEntry>, key: &MachineKey) -> String {
    // BTreeMap keys and struct field order make the JSON canonical.
    let payload = serde_json::to_vec(entries).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update([0u8]);
    hasher.update(&payload);
    let digest = hasher.finalize();
    hex::encode(&digest[..])
}

/// Check a stored signature against freshly computed contents.
pub fn verify(entries: &BTreeMap<String, CacheEntry>, signature: &str, key: &MachineKey) -> bool {
    sign(entries, key) == signature
}
