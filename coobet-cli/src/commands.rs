use std::path::Path;

use anyhow::{Context, bail};
use coobet_api::models::{
    BonusFilters, ChangeTransactionStatus, CreateBonus, CreateDeposit, CreateWithdrawal,
    TransactionFilters,
};
use coobet_api::session::{COOKIE_JAR_FILE, CookieJar};
use coobet_api::{ApiClient, Method, ResponseBody};
use serde_json::Value;
use tracing::debug;

use crate::cli::{BonusCommands, Commands, NewTransactionArgs, TransactionCommands};
use crate::output::{print_json, print_next_page_hint};

pub async fn execute(
    client: &ApiClient,
    session_dir: &Path,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Login {
            email_or_phone,
            password,
        } => {
            let user = client.login(&email_or_phone, &password).await?;
            print_json(&user)?;
        }

        Commands::Logout => client.logout().await?,

        Commands::Whoami => {
            let snapshot = client.session().snapshot();
            match snapshot.user {
                Some(user) if snapshot.access_token.is_some() => print_json(&user)?,
                _ => bail!("Not logged in"),
            }
        }

        Commands::Cookies { header } => {
            let jar = CookieJar::open(
                session_dir.join(COOKIE_JAR_FILE),
                client.config().secure_cookies,
            )?;
            if header {
                match jar.header_value() {
                    Some(value) => println!("{value}"),
                    None => bail!("No live cookies"),
                }
            } else {
                for line in jar.set_cookie_headers() {
                    println!("Set-Cookie: {line}");
                }
            }
        }

        Commands::Transactions(command) => transactions(client, command).await?,

        Commands::Bonuses(command) => bonuses(client, command).await?,

        Commands::Request { method, path, body } => {
            let method: Method = method
                .to_ascii_uppercase()
                .parse()
                .with_context(|| format!("Invalid HTTP method: {method}"))?;
            let body = body
                .map(|raw| serde_json::from_str::<Value>(&raw))
                .transpose()
                .context("--body must be valid JSON")?;

            debug!(%method, %path, "Sending raw request");
            let response = client.send(method, &path, body).await?;
            match response.body {
                ResponseBody::Json(value) => print_json(&value)?,
                ResponseBody::Text(text) => println!("{text}"),
                ResponseBody::Empty => println!("{}", response.status),
            }
        }
    }
    Ok(())
}

async fn transactions(client: &ApiClient, command: TransactionCommands) -> anyhow::Result<()> {
    match command {
        TransactionCommands::List(args) => {
            let filters = TransactionFilters {
                page: args.page,
                page_size: args.page_size,
                type_trans: args.type_trans,
                status: args.status,
                search: args.search,
                app: args.app,
                source: args.source,
            };
            let page = client.list_transactions(&filters).await?;
            print_json(&page)?;
            print_next_page_hint(&page, args.page);
        }
        TransactionCommands::Status { reference } => {
            print_json(&client.transaction_status(&reference).await?)?;
        }
        TransactionCommands::Deposit(args) => {
            print_json(&client.create_deposit(&deposit(args)).await?)?;
        }
        TransactionCommands::Withdraw { transaction, code } => {
            let input = CreateWithdrawal {
                amount: transaction.amount,
                phone_number: transaction.phone,
                app: transaction.app,
                user_app_id: transaction.user_app_id,
                network: transaction.network,
                withdrawal_code: code,
                source: transaction.source,
            };
            print_json(&client.create_withdrawal(&input).await?)?;
        }
        TransactionCommands::SetStatus { reference, status } => {
            let input = ChangeTransactionStatus { status, reference };
            print_json(&client.change_transaction_status(&input).await?)?;
        }
    }
    Ok(())
}

async fn bonuses(client: &ApiClient, command: BonusCommands) -> anyhow::Result<()> {
    match command {
        BonusCommands::List {
            page,
            page_size,
            search,
            user,
        } => {
            let filters = BonusFilters {
                page,
                page_size,
                search,
                user,
            };
            let result = client.list_bonuses(&filters).await?;
            print_json(&result)?;
            print_next_page_hint(&result, page);
        }
        BonusCommands::Create {
            email,
            amount,
            reason,
            transaction,
        } => {
            let input = CreateBonus {
                email,
                amount,
                reason_bonus: reason,
                transaction,
            };
            print_json(&client.create_bonus(&input).await?)?;
        }
    }
    Ok(())
}

fn deposit(args: NewTransactionArgs) -> CreateDeposit {
    CreateDeposit {
        amount: args.amount,
        phone_number: args.phone,
        app: args.app,
        user_app_id: args.user_app_id,
        network: args.network,
        source: args.source,
    }
}
