//! Authenticated HTTP client for the Coobet back-office API.
//!
//! # Architecture
//!
//! - [`ApiClient`]: request dispatcher, attaches the bearer credential and runs
//!   the response hooks
//! - [`Session`]: credential store mirrored into client-local storage and cookies
//! - [`RefreshCoordinator`]: single-flight refresh-and-replay on 401
//! - [`classify`]: failure classification, message extraction and language heuristic
//! - [`Notifier`] / [`Navigator`]: toast and redirect collaborators
//!
//! # Example
//!
//! ```no_run
//! use coobet_api::{ApiClient, ClientConfig, models::TransactionFilters};
//!
//! # async fn run() -> coobet_api::Result<()> {
//! let client = ApiClient::new(ClientConfig::from_env()?)?;
//! client.login("user@x.com", "secret").await?;
//! let page = client.list_transactions(&TransactionFilters::default()).await?;
//! println!("{} transactions", page.count);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod classify;
mod client;
mod config;
mod error;
pub mod models;
pub mod notify;
mod refresh;
pub mod request;
pub mod session;
pub mod transport;

pub use cache::{QueryCache, QueryKey};
pub use classify::{Classification, FailureKind, FailureMessages, Language};
pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ApiError, Result};
pub use notify::{Navigator, Notifier, Toast, ToastLevel, TracingNavigator, TracingNotifier};
pub use refresh::{RefreshCoordinator, RefreshPhase};
pub use request::{MAX_RETRIES, Method, RequestAttempt, RequestDescriptor};
pub use session::{Session, SessionSnapshot};
pub use transport::{HttpResponse, ReqwestTransport, ResponseBody, Transport};
