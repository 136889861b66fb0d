use serde::{Deserialize, Serialize};

use crate::form_utils::deserialize_optional_i64;

/// A completed transfer between two accounts. Always backed by exactly two
/// transactions: the debit leg on `from_account_id` and the credit leg on
/// `to_account_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub amount_cents: i64,
    pub description: Option<String>,
    pub date: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub from_transaction_id: i64,
    pub to_transaction_id: i64,
    pub created_at: String,
}

/// Transfer joined with both account names for history views.
#[derive(Debug, Clone, Serialize)]
pub struct TransferWithAccounts {
    #[serde(flatten)]
    pub transfer: Transfer,
    pub from_account_name: String,
    pub to_account_name: String,
}

/// Create payload. `amount` arrives in dollars.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransferPayload {
    #[serde(deserialize_with = "deserialize_optional_i64")]
    pub from_account_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_optional_i64")]
    pub to_account_id: Option<i64>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub date: Option<String>,
}
