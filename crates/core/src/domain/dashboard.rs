use crate::domain::snapshot::CompositeSnapshot;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub user_id: Uuid,
    pub accounts: Vec<Account>,
    pub budgets: Vec<Budget>,
    pub transactions: Vec<Transaction>,
    pub settings: UserSettings,
    pub economy: CompositeSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub balance_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub category: String,
    pub limit_cents: i64,
    pub period_start: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub posted_on: NaiveDate,
    pub description: String,
    pub category: Option<String>,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub currency: String,
    pub theme: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            theme: "light".to_string(),
            updated_at: None,
        }
    }
}
