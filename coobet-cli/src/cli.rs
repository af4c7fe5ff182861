use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use coobet_api::models::{ManualStatus, TransactionSource, TransactionStatus, TransactionType};
use serde::de::DeserializeOwned;

#[derive(Parser, Debug)]
#[command(author, version, about = "Coobet back-office API client", long_about = None)]
pub struct Args {
    /// Directory holding the persisted session mirrors
    #[arg(long, global = true, env = "COOBET_SESSION_DIR", default_value = ".coobet")]
    pub session_dir: PathBuf,

    /// API origin, overrides COOBET_API_BASE_URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log filter directive, e.g. `debug` or `coobet_api=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and persist the session
    Login {
        /// Email address or phone number
        email_or_phone: String,

        #[arg(long, env = "COOBET_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Revoke the refresh credential and wipe the local session
    Logout,

    /// Print the profile stored at login
    Whoami,

    /// Print the server-readable cookie mirror as Set-Cookie lines
    Cookies {
        /// Print a single `Cookie` request header value instead
        #[arg(long)]
        header: bool,
    },

    /// Mobile-money transactions
    #[command(subcommand)]
    Transactions(TransactionCommands),

    /// Operator bonuses
    #[command(subcommand)]
    Bonuses(BonusCommands),

    /// Send an arbitrary authenticated request
    Request {
        /// HTTP method, e.g. GET or POST
        method: String,

        /// Path relative to the API origin
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TransactionCommands {
    /// List the transaction history
    List(TransactionListArgs),

    /// Query the provider status of a transaction
    Status { reference: String },

    /// Create a deposit
    Deposit(NewTransactionArgs),

    /// Create a withdrawal
    Withdraw {
        #[command(flatten)]
        transaction: NewTransactionArgs,

        /// Withdrawal code issued by the betting application
        #[arg(long)]
        code: String,
    },

    /// Manually change the status of a transaction
    SetStatus {
        reference: String,

        /// accept, error, timeout, init_payment or pending
        #[arg(long, value_parser = parse_wire::<ManualStatus>)]
        status: Option<ManualStatus>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct TransactionListArgs {
    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub page_size: Option<u32>,

    #[arg(long, value_parser = parse_wire::<TransactionStatus>)]
    pub status: Option<TransactionStatus>,

    /// deposit or withdrawal
    #[arg(long = "type", value_parser = parse_wire::<TransactionType>)]
    pub type_trans: Option<TransactionType>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub app: Option<String>,

    #[arg(long, value_parser = parse_wire::<TransactionSource>)]
    pub source: Option<TransactionSource>,
}

#[derive(ClapArgs, Debug)]
pub struct NewTransactionArgs {
    #[arg(long)]
    pub amount: f64,

    #[arg(long)]
    pub phone: String,

    /// Betting application id
    #[arg(long)]
    pub app: String,

    /// Customer id on the betting application
    #[arg(long)]
    pub user_app_id: String,

    /// Mobile-money network id
    #[arg(long)]
    pub network: u64,

    #[arg(long, default_value = "web", value_parser = parse_wire::<TransactionSource>)]
    pub source: TransactionSource,
}

#[derive(Subcommand, Debug)]
pub enum BonusCommands {
    /// List bonuses
    List {
        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,

        #[arg(long)]
        search: Option<String>,

        /// Filter by user id
        #[arg(long)]
        user: Option<String>,
    },

    /// Grant a bonus to a user
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        amount: f64,

        #[arg(long)]
        reason: String,

        /// Transaction the bonus is attached to
        #[arg(long)]
        transaction: Option<u64>,
    },
}

/// Parse a value using its JSON wire name, e.g. `init_payment`.
fn parse_wire<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| format!("unknown value {raw:?}"))
}
