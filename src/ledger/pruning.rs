/// Retention policy: age-based eviction of ledger entries
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::entry::Entry;

/// Default retention window for upload records (days)
pub const RETENTION_ENTRIES_DAYS: i64 = 7;

/// Pruning statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneStats {
    pub kept: usize,
    pub evicted: usize,
}

/// Drop entries older than `retention` relative to `now`.
///
/// Order of the remaining entries is preserved. Entries stamped in the future
/// are kept.
pub fn evict_expired(
    entries: Vec<Entry>,
    retention: Duration,
    now: DateTime<Utc>,
) -> (Vec<Entry>, PruneStats) {
    let total = entries.len();

    let kept: Vec<Entry> = entries
        .into_iter()
        .filter(|entry| {
            let age = now.signed_duration_since(entry.timestamp);
            if age > retention {
                debug!(id = entry.id, timestamp = %entry.timestamp, "Evicting expired entry");
                false
            } else {
                true
            }
        })
        .collect();

    let stats = PruneStats {
        kept: kept.len(),
        evicted: total - kept.len(),
    };

    (kept, stats)
}
