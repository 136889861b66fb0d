use serde::{Deserialize, Serialize};

/// Color assigned when the user picks none.
pub const DEFAULT_ACCOUNT_COLOR: &str = "#FF6384";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub balance_cents: i64,
    pub color: String,
    pub created_at: String,
}

/// Create/update payload. Fields are optional so the handler can report
/// exactly which ones are missing instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountPayload {
    pub name: Option<String>,
    pub balance: Option<f64>,
    pub color: Option<String>,
}

/// Accounts eligible as the other side of a transfer: everything except the
/// already-selected one.
pub fn selectable_counterparts(accounts: &[Account], selected: Option<i64>) -> Vec<&Account> {
    accounts
        .iter()
        .filter(|a| Some(a.id) != selected)
        .collect()
}
