use crate::config::env_flag;
use crate::domain::snapshot::SnapshotRecord;
use chrono::{DateTime, Utc};
use std::time::Duration;

const DEFAULT_FRESH_WINDOW_SECS: u64 = 24 * 60 * 60;
const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_BACKUP_TTL_SECS: u64 = 5 * 60;

#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// A stored record younger than this is served without refreshing.
    pub fresh_window: Duration,
    /// TTL for cache entries holding live or stored data.
    pub cache_ttl: Duration,
    /// TTL for cache entries holding the backup snapshot, so a retry happens soon.
    pub backup_ttl: Duration,
    /// Serve the backup snapshot without touching cache, store or network.
    pub ci_bypass: bool,
    /// Write a disaster-recovery copy after each refresh.
    pub dev_file_backup: bool,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            fresh_window: Duration::from_secs(DEFAULT_FRESH_WINDOW_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            backup_ttl: Duration::from_secs(DEFAULT_BACKUP_TTL_SECS),
            ci_bypass: false,
            dev_file_backup: false,
        }
    }
}

impl RefreshPolicy {
    pub fn from_env() -> Self {
        Self {
            fresh_window: secs_from_env("SNAPSHOT_FRESH_WINDOW_SECS", DEFAULT_FRESH_WINDOW_SECS),
            cache_ttl: secs_from_env("SNAPSHOT_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
            backup_ttl: secs_from_env("SNAPSHOT_BACKUP_TTL_SECS", DEFAULT_BACKUP_TTL_SECS),
            ci_bypass: env_flag("CI_BYPASS"),
            dev_file_backup: env_flag("DEV_FILE_BACKUP"),
        }
    }

    pub fn is_fresh(&self, record: &SnapshotRecord, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(self.fresh_window) {
            Ok(window) => now - record.timestamp < window,
            Err(_) => true,
        }
    }
}

fn secs_from_env(name: &str, default: u64) -> Duration {
    let secs = std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}
