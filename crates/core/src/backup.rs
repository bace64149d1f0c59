use crate::config::Settings;
use crate::domain::snapshot::CompositeSnapshot;
use anyhow::Context;
use std::path::Path;

const BUNDLED_SNAPSHOT: &str = include_str!("../data/backup_snapshot.json");

/// Last-known-good snapshot served when live sources or infrastructure fail. Immutable once
/// loaded.
#[derive(Debug, Clone)]
pub struct BackupSnapshot {
    snapshot: CompositeSnapshot,
}

impl BackupSnapshot {
    pub fn new(snapshot: CompositeSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn bundled() -> anyhow::Result<Self> {
        let snapshot = serde_json::from_str::<CompositeSnapshot>(BUNDLED_SNAPSHOT)
            .context("bundled backup snapshot is not a valid CompositeSnapshot")?;
        Ok(Self { snapshot })
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read backup snapshot {} failed", path.display()))?;
        let snapshot = serde_json::from_str::<CompositeSnapshot>(&text)
            .with_context(|| format!("{} is not a valid CompositeSnapshot", path.display()))?;
        Ok(Self { snapshot })
    }

    /// `BACKUP_SNAPSHOT_PATH` when set and readable, the bundled copy otherwise.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        if let Some(path) = settings.backup_snapshot_path.as_deref() {
            match Self::from_file(Path::new(path)) {
                Ok(backup) => {
                    tracing::info!(path, "loaded backup snapshot override");
                    return Ok(backup);
                }
                Err(err) => {
                    tracing::warn!(path, error = %format!("{err:#}"), "backup snapshot override unusable; using bundled copy");
                }
            }
        }
        Self::bundled()
    }

    pub fn snapshot(&self) -> &CompositeSnapshot {
        &self.snapshot
    }
}
