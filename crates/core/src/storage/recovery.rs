use crate::domain::snapshot::CompositeSnapshot;
use anyhow::Context;
use std::path::{Path, PathBuf};

pub const DEFAULT_RECOVERY_PATH: &str = "data/economic_snapshot_backup.json";

/// Destination for disaster-recovery copies of a freshly assembled snapshot.
#[async_trait::async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write_snapshot(&self, data: &CompositeSnapshot) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSnapshotSink {
    path: PathBuf,
}

impl FileSnapshotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        let path = std::env::var("DEV_FILE_BACKUP_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RECOVERY_PATH.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SnapshotSink for FileSnapshotSink {
    async fn write_snapshot(&self, data: &CompositeSnapshot) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create {} failed", dir.display()))?;
        }

        let body = serde_json::to_vec_pretty(data).context("serialize snapshot failed")?;

        // Write to a sibling temp file and rename so readers never see a partial file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("write {} failed", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("rename to {} failed", self.path.display()))?;
        Ok(())
    }
}
