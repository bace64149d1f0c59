use crate::domain::snapshot::{CompositeSnapshot, SnapshotRecord};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

// The table holds at most one row; this is its fixed primary key.
const SNAPSHOT_ROW_ID: i16 = 1;

/// Durable home of the last committed snapshot. Writes are full replacements.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn get_latest(&self) -> anyhow::Result<Option<SnapshotRecord>>;

    async fn replace_latest(
        &self,
        timestamp: DateTime<Utc>,
        data: &CompositeSnapshot,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: sqlx::PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn get_latest(&self) -> anyhow::Result<Option<SnapshotRecord>> {
        let row = sqlx::query_as::<_, (DateTime<Utc>, Json<serde_json::Value>)>(
            "SELECT committed_at, data FROM economic_snapshots WHERE id = $1",
        )
        .persistent(false)
        .bind(SNAPSHOT_ROW_ID)
        .fetch_optional(&self.pool)
        .await
        .context("select economic_snapshots failed")?;

        Ok(row.and_then(|(timestamp, Json(raw))| decode_stored(timestamp, raw)))
    }

    async fn replace_latest(
        &self,
        timestamp: DateTime<Utc>,
        data: &CompositeSnapshot,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO economic_snapshots (id, committed_at, data) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET \
               committed_at = EXCLUDED.committed_at, \
               data = EXCLUDED.data",
        )
        .persistent(false)
        .bind(SNAPSHOT_ROW_ID)
        .bind(timestamp)
        .bind(Json(data))
        .execute(&self.pool)
        .await
        .context("upsert economic_snapshots failed")?;
        Ok(())
    }
}

/// A row whose JSON no longer matches `CompositeSnapshot` counts as missing, so the next
/// refresh overwrites it.
pub(crate) fn decode_stored(
    timestamp: DateTime<Utc>,
    raw: serde_json::Value,
) -> Option<SnapshotRecord> {
    match serde_json::from_value::<CompositeSnapshot>(raw) {
        Ok(data) => Some(SnapshotRecord { timestamp, data }),
        Err(err) => {
            tracing::warn!(committed_at = %timestamp, error = %err, "stored economic snapshot is undecodable; treating as missing");
            None
        }
    }
}

/// Process-local store for deployments without a database. Keeps the same replace semantics.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    record: tokio::sync::RwLock<Option<SnapshotRecord>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SnapshotRecord) -> Self {
        Self {
            record: tokio::sync::RwLock::new(Some(record)),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get_latest(&self) -> anyhow::Result<Option<SnapshotRecord>> {
        Ok(self.record.read().await.clone())
    }

    async fn replace_latest(
        &self,
        timestamp: DateTime<Utc>,
        data: &CompositeSnapshot,
    ) -> anyhow::Result<()> {
        *self.record.write().await = Some(SnapshotRecord {
            timestamp,
            data: data.clone(),
        });
        Ok(())
    }
}
