//! Mobile-money transaction records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    Web,
    Mobile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    InitPayment,
}

/// Betting application a transaction is credited to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppDetails {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub enable: bool,
    #[serde(default)]
    pub minimun_deposit: f64,
    #[serde(default)]
    pub max_deposit: f64,
    #[serde(default)]
    pub minimun_with: f64,
    #[serde(default)]
    pub max_win: f64,
    #[serde(default)]
    pub active_for_deposit: bool,
    #[serde(default)]
    pub active_for_with: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub amount: f64,
    pub phone_number: String,
    pub app_details: Option<AppDetails>,
    pub app: String,
    pub user_app_id: String,
    pub network: u64,
    pub source: TransactionSource,
    pub type_trans: TransactionType,
    pub status: TransactionStatus,
    pub reference: String,
    pub created_at: String,
    #[serde(default)]
    pub validated_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Query filters for the transaction history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_trans: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<TransactionSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDeposit {
    pub amount: f64,
    pub phone_number: String,
    pub app: String,
    pub user_app_id: String,
    pub network: u64,
    pub source: TransactionSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWithdrawal {
    pub amount: f64,
    pub phone_number: String,
    pub app: String,
    pub user_app_id: String,
    pub network: u64,
    /// Field name is fixed by the server.
    #[serde(rename = "withdriwal_code")]
    pub withdrawal_code: String,
    pub source: TransactionSource,
}

/// Manual status values accepted by the change-status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualStatus {
    Accept,
    Error,
    #[serde(rename = "timeouf", alias = "timeout")]
    Timeout,
    InitPayment,
    Pending,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeTransactionStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ManualStatus>,
    pub reference: String,
}

/// Provider-side status lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatusReport {
    pub code: i64,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}
