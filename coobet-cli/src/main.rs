mod cli;
mod commands;
mod output;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use coobet_api::{ApiClient, ClientConfig, Session};
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;
use crate::output::{StderrNavigator, StderrNotifier};

const DEFAULT_LOG_FILTER: &str = "coobet_api=info,coobet_cli=info";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    if let Err(e) = run(args).await {
        error!("Application error: {e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let client = open_client(&args)?;
    commands::execute(&client, &args.session_dir, args.command).await
}

/// Client backed by the session mirrors under `--session-dir`.
fn open_client(args: &Args) -> anyhow::Result<ApiClient> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url)?;
    }

    let session = Session::persistent(&config, &args.session_dir).with_context(|| {
        format!(
            "Failed to open session directory {}",
            args.session_dir.display()
        )
    })?;

    Ok(ApiClient::builder(config)
        .session(Arc::new(session))
        .notifier(Arc::new(StderrNotifier))
        .navigator(Arc::new(StderrNavigator))
        .build()?)
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
