use crate::domain::dashboard::{Account, Budget, Transaction, UserSettings};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

const RECENT_TRANSACTIONS_LIMIT: i64 = 50;

/// Per-user financial records read by the dashboard.
#[async_trait::async_trait]
pub trait UserDataStore: Send + Sync {
    async fn accounts(&self, user_id: Uuid) -> anyhow::Result<Vec<Account>>;

    async fn budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<Budget>>;

    async fn recent_transactions(&self, user_id: Uuid) -> anyhow::Result<Vec<Transaction>>;

    async fn settings(&self, user_id: Uuid) -> anyhow::Result<UserSettings>;
}

#[derive(Debug, Clone)]
pub struct PgUserDataStore {
    pool: sqlx::PgPool,
}

impl PgUserDataStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserDataStore for PgUserDataStore {
    async fn accounts(&self, user_id: Uuid) -> anyhow::Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, i64)>(
            "SELECT id, name, kind, balance_cents \
             FROM accounts \
             WHERE user_id = $1 \
             ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select accounts failed (user_id={user_id})"))?;

        Ok(rows
            .into_iter()
            .map(|(id, name, kind, balance_cents)| Account {
                id,
                name,
                kind,
                balance_cents,
            })
            .collect())
    }

    async fn budgets(&self, user_id: Uuid) -> anyhow::Result<Vec<Budget>> {
        let rows = sqlx::query_as::<_, (Uuid, String, i64, NaiveDate)>(
            "SELECT id, category, limit_cents, period_start \
             FROM budgets \
             WHERE user_id = $1 \
             ORDER BY period_start DESC, category ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select budgets failed (user_id={user_id})"))?;

        Ok(rows
            .into_iter()
            .map(|(id, category, limit_cents, period_start)| Budget {
                id,
                category,
                limit_cents,
                period_start,
            })
            .collect())
    }

    async fn recent_transactions(&self, user_id: Uuid) -> anyhow::Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, NaiveDate, String, Option<String>, i64)>(
            "SELECT id, account_id, posted_on, description, category, amount_cents \
             FROM transactions \
             WHERE user_id = $1 \
             ORDER BY posted_on DESC \
             LIMIT $2",
        )
        .bind(user_id)
        .bind(RECENT_TRANSACTIONS_LIMIT)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select transactions failed (user_id={user_id})"))?;

        Ok(rows
            .into_iter()
            .map(
                |(id, account_id, posted_on, description, category, amount_cents)| Transaction {
                    id,
                    account_id,
                    posted_on,
                    description,
                    category,
                    amount_cents,
                },
            )
            .collect())
    }

    async fn settings(&self, user_id: Uuid) -> anyhow::Result<UserSettings> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            "SELECT currency, theme, updated_at FROM user_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select user_settings failed (user_id={user_id})"))?;

        // Users who never saved settings get the defaults.
        Ok(match row {
            Some((currency, theme, updated_at)) => UserSettings {
                currency,
                theme,
                updated_at: Some(updated_at),
            },
            None => UserSettings::default(),
        })
    }
}
