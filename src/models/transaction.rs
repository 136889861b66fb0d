use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::form_utils::deserialize_optional_i64;

/// Datetime format used in the database.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub amount_cents: i64,
    pub description: String,
    pub date: String,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub transfer_id: Option<i64>,
    pub created_at: String,
}

impl Transaction {
    /// Transfer legs are managed through the transfer endpoints only.
    pub fn is_transfer(&self) -> bool {
        self.transfer_id.is_some()
    }

    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, DATE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&self.date, "%Y-%m-%d %H:%M:%S"))
            .ok()
    }
}

/// Transaction joined with its category and account for list views.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionWithRelations {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category_name: Option<String>,
    pub category_type: Option<String>,
    pub category_emoji: Option<String>,
    pub account_name: String,
}

/// Create/update payload with optional fields so validation can name the
/// missing ones. `amount` arrives in dollars and is converted to cents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionPayload {
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub date: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_i64")]
    pub account_id: Option<i64>,
    #[serde(deserialize_with = "deserialize_optional_i64")]
    pub category_id: Option<i64>,
}
