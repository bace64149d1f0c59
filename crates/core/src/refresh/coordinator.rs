use crate::backup::BackupSnapshot;
use crate::domain::snapshot::{CompositeSnapshot, SnapshotField};
use crate::ingest::{SourceData, UpstreamSource};
use crate::refresh::policy::RefreshPolicy;
use crate::storage::cache::FastCache;
use crate::storage::lock::RefreshLock;
use crate::storage::recovery::SnapshotSink;
use crate::storage::snapshots::SnapshotStore;
use anyhow::Context;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

pub const SNAPSHOT_CACHE_KEY: &str = "economic_snapshot";

/// Which fields of a refreshed snapshot came from live sources and which from the backup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub live: Vec<SnapshotField>,
    pub substituted: Vec<(SnapshotField, String)>,
}

impl RefreshReport {
    pub fn is_fully_live(&self) -> bool {
        self.substituted.is_empty()
    }
}

/// Serves the economic snapshot through cache → store → upstream tiers and owns the
/// refresh protocol. One instance per process; its lock serializes refreshes.
pub struct SnapshotCoordinator {
    cache: Arc<dyn FastCache>,
    store: Arc<dyn SnapshotStore>,
    sources: Vec<Arc<dyn UpstreamSource>>,
    backup: Arc<BackupSnapshot>,
    lock: RefreshLock,
    recovery_sink: Option<Arc<dyn SnapshotSink>>,
    policy: RefreshPolicy,
}

impl SnapshotCoordinator {
    pub fn new(
        cache: Arc<dyn FastCache>,
        store: Arc<dyn SnapshotStore>,
        sources: Vec<Arc<dyn UpstreamSource>>,
        backup: BackupSnapshot,
        lock: RefreshLock,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            cache,
            store,
            sources,
            backup: Arc::new(backup),
            lock,
            recovery_sink: None,
            policy,
        }
    }

    pub fn with_recovery_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.recovery_sink = Some(sink);
        self
    }

    /// Never fails: any problem below this point degrades to backup data.
    pub async fn fetch_snapshot(&self) -> CompositeSnapshot {
        if self.policy.ci_bypass {
            return self.backup.snapshot().clone();
        }

        if let Some(snapshot) = self.read_cache().await {
            return snapshot;
        }

        match self.load_or_refresh().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "economic snapshot pipeline failed; serving backup snapshot");
                let snapshot = self.backup.snapshot().clone();
                self.write_cache(&snapshot, self.policy.backup_ttl).await;
                snapshot
            }
        }
    }

    /// Refreshes under the lock regardless of store freshness. Errors are returned, not masked.
    pub async fn force_refresh(&self) -> anyhow::Result<(CompositeSnapshot, RefreshReport)> {
        let _guard = self.lock.acquire().await;
        self.refresh_locked().await
    }

    /// Runs every source once and assembles the result without committing anything.
    pub async fn preview_refresh(&self) -> (CompositeSnapshot, RefreshReport) {
        self.gather().await
    }

    pub async fn invalidate_cache(&self) -> anyhow::Result<()> {
        self.cache
            .delete(SNAPSHOT_CACHE_KEY)
            .await
            .context("delete cached economic snapshot failed")
    }

    async fn load_or_refresh(&self) -> anyhow::Result<CompositeSnapshot> {
        if let Some(snapshot) = self.load_fresh_from_store().await? {
            return Ok(snapshot);
        }

        let _guard = self.lock.acquire().await;

        // Another caller may have finished a refresh while we waited for the lock.
        if let Some(snapshot) = self.load_fresh_from_store().await? {
            return Ok(snapshot);
        }

        let (snapshot, _) = self.refresh_locked().await?;
        Ok(snapshot)
    }

    async fn load_fresh_from_store(&self) -> anyhow::Result<Option<CompositeSnapshot>> {
        let record = self
            .store
            .get_latest()
            .await
            .context("read stored economic snapshot failed")?;

        let Some(record) = record else {
            tracing::info!("no stored economic snapshot");
            return Ok(None);
        };

        let now = Utc::now();
        if !self.policy.is_fresh(&record, now) {
            tracing::info!(
                committed_at = %record.timestamp,
                age_minutes = (now - record.timestamp).num_minutes(),
                "stored economic snapshot is stale"
            );
            return Ok(None);
        }

        self.write_cache(&record.data, self.policy.cache_ttl).await;
        Ok(Some(record.data))
    }

    // Caller must hold the refresh lock.
    async fn refresh_locked(&self) -> anyhow::Result<(CompositeSnapshot, RefreshReport)> {
        let (snapshot, report) = self.gather().await;

        let committed_at = Utc::now();
        self.store
            .replace_latest(committed_at, &snapshot)
            .await
            .context("commit refreshed economic snapshot failed")?;

        self.write_cache(&snapshot, self.policy.cache_ttl).await;
        self.persist_disaster_recovery_copy(&snapshot).await;

        tracing::info!(
            %committed_at,
            live = report.live.len(),
            substituted = report.substituted.len(),
            "economic snapshot refreshed"
        );
        Ok((snapshot, report))
    }

    /// Fetches every source concurrently and waits for all of them to settle. Fields whose
    /// source failed keep the backup value.
    async fn gather(&self) -> (CompositeSnapshot, RefreshReport) {
        let mut snapshot = self.backup.snapshot().clone();
        let mut report = RefreshReport::default();

        let mut tasks = JoinSet::new();
        let mut spawned = HashMap::new();
        for source in &self.sources {
            let task_source = Arc::clone(source);
            let handle = tasks.spawn(async move {
                let result = task_source.fetch().await;
                (task_source.field(), task_source.name().to_string(), result)
            });
            spawned.insert(handle.id(), (source.field(), source.name().to_string()));
        }

        while let Some(joined) = tasks.join_next().await {
            let (field, name, result) = match joined {
                Ok(out) => out,
                Err(err) => {
                    let Some((field, name)) = spawned.get(&err.id()) else {
                        tracing::warn!(error = %err, "unknown upstream source task did not complete");
                        continue;
                    };
                    tracing::warn!(source = %name, %field, error = %err, "upstream source task did not complete; using backup data");
                    report
                        .substituted
                        .push((*field, format!("source task did not complete: {err}")));
                    continue;
                }
            };

            match result {
                Ok(data) => {
                    if apply(&mut snapshot, field, data) {
                        report.live.push(field);
                    } else {
                        tracing::warn!(source = %name, %field, "upstream source returned data for another field; using backup data");
                        report
                            .substituted
                            .push((field, "mismatched source data".to_string()));
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        source = %name,
                        %field,
                        stage = err.stage.as_str(),
                        error = %err.detail,
                        "upstream source failed; using backup data"
                    );
                    report.substituted.push((field, err.to_string()));
                }
            }
        }

        report.live.sort();
        report.substituted.sort_by_key(|(field, _)| *field);
        (snapshot, report)
    }

    /// Best effort: failures are logged and never fail the refresh.
    async fn persist_disaster_recovery_copy(&self, snapshot: &CompositeSnapshot) {
        if !self.policy.dev_file_backup {
            return;
        }
        let Some(sink) = self.recovery_sink.as_ref() else {
            tracing::debug!("DEV_FILE_BACKUP set but no recovery sink configured");
            return;
        };
        if let Err(err) = sink.write_snapshot(snapshot).await {
            tracing::warn!(error = %format!("{err:#}"), "disaster-recovery snapshot write failed");
        }
    }

    async fn read_cache(&self) -> Option<CompositeSnapshot> {
        let raw = match self.cache.get(SNAPSHOT_CACHE_KEY).await {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CompositeSnapshot>(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, "cached economic snapshot is undecodable; treating as miss");
                None
            }
        }
    }

    async fn write_cache(&self, snapshot: &CompositeSnapshot, ttl: Duration) {
        let raw = match serde_json::to_string(snapshot) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "serialize economic snapshot for cache failed");
                return;
            }
        };
        if let Err(err) = self.cache.set(SNAPSHOT_CACHE_KEY, ttl, &raw).await {
            tracing::warn!(error = %format!("{err:#}"), ttl_secs = ttl.as_secs(), "cache write failed");
        }
    }
}

fn apply(snapshot: &mut CompositeSnapshot, field: SnapshotField, data: SourceData) -> bool {
    match (field, data) {
        (SnapshotField::News, SourceData::News(articles)) => snapshot.news = articles,
        (SnapshotField::Stocks, SourceData::Stocks(rankings)) => snapshot.trends.stocks = rankings,
        (SnapshotField::Indicator(indicator), SourceData::Series(series)) => {
            *snapshot.trends.series_mut(indicator) = series
        }
        _ => return false,
    }
    true
}
