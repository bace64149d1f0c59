use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Serializes snapshot refreshes within one process. Clones share the same lock; separate
/// `new()` calls do not. Not coordinated across processes: the store staleness check is the
/// only cross-instance guard.
#[derive(Debug, Clone, Default)]
pub struct RefreshLock {
    inner: Arc<Mutex<()>>,
}

impl RefreshLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Released when the guard is dropped, on every exit path.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }

    #[cfg(test)]
    pub fn is_held(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
