use crate::backup::BackupSnapshot;
use crate::config::Settings;
use crate::ingest::{self, UpstreamSource};
use crate::refresh::{RefreshPolicy, SnapshotCoordinator};
use crate::storage::cache::{FastCache, MemoryCache, RedisCache};
use crate::storage::lock::RefreshLock;
use crate::storage::recovery::FileSnapshotSink;
use crate::storage::snapshots::{MemorySnapshotStore, PgSnapshotStore, SnapshotStore};
use std::sync::Arc;

/// Redis when configured and reachable; otherwise a process-local cache.
pub async fn connect_cache(settings: &Settings) -> Arc<dyn FastCache> {
    let url = match settings.require_redis_url() {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("REDIS_URL missing; using in-process snapshot cache");
            return Arc::new(MemoryCache::new());
        }
    };

    match RedisCache::connect(url).await {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "redis connect failed; using in-process snapshot cache");
            Arc::new(MemoryCache::new())
        }
    }
}

pub async fn build_coordinator(
    settings: &Settings,
    pool: Option<sqlx::PgPool>,
) -> anyhow::Result<SnapshotCoordinator> {
    let policy = RefreshPolicy::from_env();
    let backup = BackupSnapshot::from_settings(settings)?;

    let sources: Vec<Arc<dyn UpstreamSource>> = if policy.ci_bypass {
        tracing::info!("CI_BYPASS set; economic snapshot will be served from backup only");
        Vec::new()
    } else {
        ingest::default_sources(settings)?
    };

    let store: Arc<dyn SnapshotStore> = match pool {
        Some(pool) => Arc::new(PgSnapshotStore::new(pool)),
        None => {
            tracing::warn!("no database; stored economic snapshot lives in process memory");
            Arc::new(MemorySnapshotStore::new())
        }
    };

    let cache = connect_cache(settings).await;

    let sink = FileSnapshotSink::from_env();
    if policy.dev_file_backup {
        tracing::info!(path = %sink.path().display(), "disaster-recovery snapshot copies enabled");
    }

    Ok(SnapshotCoordinator::new(
        cache,
        store,
        sources,
        backup,
        RefreshLock::new(),
        policy,
    )
    .with_recovery_sink(Arc::new(sink)))
}
