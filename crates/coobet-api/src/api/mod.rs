//! Typed endpoints layered on [`crate::ApiClient`].

pub mod auth;
pub mod bonuses;
pub mod transactions;

pub use auth::{LOGIN_SUCCESS_MESSAGE, LOGOUT_SUCCESS_MESSAGE};
pub use bonuses::{BONUS_FAILURE, BONUSES_KEY};
pub use transactions::{
    DEPOSIT_FAILURE, DEPOSITS_KEY, TRANSACTIONS_KEY, WITHDRAWAL_FAILURE,
};
