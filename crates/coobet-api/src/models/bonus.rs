//! Operator-granted bonuses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonusUser {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bonus {
    pub id: u64,
    pub created_at: String,
    /// Decimal amount as sent by the server.
    pub amount: String,
    pub reason_bonus: String,
    pub transaction: Option<u64>,
    pub user: BonusUser,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BonusFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBonus {
    pub email: String,
    pub amount: f64,
    pub reason_bonus: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<u64>,
}
