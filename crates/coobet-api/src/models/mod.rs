//! Wire types exchanged with the back-office API.

mod auth;
mod bonus;
mod page;
mod transaction;

pub use auth::{
    CredentialPair, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, UserProfile,
};
pub use bonus::{Bonus, BonusFilters, BonusUser, CreateBonus};
pub use page::Page;
pub use transaction::{
    AppDetails, ChangeTransactionStatus, CreateDeposit, CreateWithdrawal, ManualStatus,
    Transaction, TransactionFilters, TransactionSource, TransactionStatus,
    TransactionStatusReport, TransactionType,
};
