//! Entry freshness and TTL parsing.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Duration, Utc};

use super::CacheEntry;

/// Freshness of a looked-up entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    /// Entry is within its TTL.
    Fresh,
    /// Entry is present but older than the TTL.
    Expired,
    /// No entry recorded.
    NotFound,
}

/// Classify an optional entry at `now`.
pub fn validate(entry: Option<&CacheEntry>, now: DateTime<Utc>, ttl: Duration) -> ValidationResult {
    match entry {
        None => ValidationResult::NotFound,
        Some(entry) if entry.is_fresh(now, ttl) => ValidationResult::Fresh,
        Some(_) => ValidationResult::Expired,
    }
}

/// Parse a TTL string like "7d", "24h", "30m".
pub fn parse_ttl(ttl: &str) -> Result<Duration> {
    let ttl = ttl.trim().to_lowercase();

    let (number, unit): (&str, fn(i64) -> Option<Duration>) =
        if let Some(days) = ttl.strip_suffix('d') {
            (days, Duration::try_days)
        } else if let Some(hours) = ttl.strip_suffix('h') {
            (hours, Duration::try_hours)
        } else if let Some(mins) = ttl.strip_suffix('m') {
            (mins, Duration::try_minutes)
        } else if let Some(secs) = ttl.strip_suffix('s') {
            (secs, Duration::try_seconds)
        } else {
            // Assume seconds if no suffix
            (ttl.as_str(), Duration::try_seconds)
        };

    let value: i64 = number.trim().parse()?;
    let duration = unit(value).ok_or_else(|| anyhow!("TTL '{}' is out of range", ttl))?;

    if duration <= Duration::zero() {
        bail!("TTL must be positive, got '{}'", ttl);
    }
    Ok(duration)
}

/// Format a duration for display.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds();

    if secs >= 86400 {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
