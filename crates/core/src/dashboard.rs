use crate::domain::dashboard::DashboardView;
use crate::refresh::SnapshotCoordinator;
use crate::storage::users::UserDataStore;
use std::sync::Arc;
use uuid::Uuid;

/// Composes the economic snapshot with one user's records. Unlike the snapshot, per-user
/// data has no substitute, so the first failing fetch fails the whole view.
#[derive(Clone)]
pub struct DashboardAggregator {
    coordinator: Arc<SnapshotCoordinator>,
    users: Arc<dyn UserDataStore>,
}

impl DashboardAggregator {
    pub fn new(coordinator: Arc<SnapshotCoordinator>, users: Arc<dyn UserDataStore>) -> Self {
        Self { coordinator, users }
    }

    pub async fn fetch_dashboard(&self, user_id: Uuid) -> anyhow::Result<DashboardView> {
        let economy = self.coordinator.fetch_snapshot();
        let per_user = async {
            tokio::try_join!(
                self.users.accounts(user_id),
                self.users.budgets(user_id),
                self.users.recent_transactions(user_id),
                self.users.settings(user_id),
            )
        };

        let (economy, per_user) = tokio::join!(economy, per_user);
        let (accounts, budgets, transactions, settings) = per_user?;

        Ok(DashboardView {
            user_id,
            accounts,
            budgets,
            transactions,
            settings,
            economy,
        })
    }
}
