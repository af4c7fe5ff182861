//! Mobile-money transaction endpoints.

use serde_json::{Value, json};
use tracing::instrument;

use crate::cache::QueryKey;
use crate::classify::FailureMessages;
use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{
    ChangeTransactionStatus, CreateDeposit, CreateWithdrawal, Page, Transaction,
    TransactionFilters, TransactionStatusReport,
};

pub const TRANSACTIONS_KEY: &str = "transactions";
pub const DEPOSITS_KEY: &str = "deposits";

const HISTORY_PATH: &str = "/mobcash/transaction-history";
const CREATE_DEPOSIT_PATH: &str = "/mobcash/create-deposit";
const CREATE_WITHDRAWAL_PATH: &str = "/mobcash/create-withdrawal";
const STATUS_PATH: &str = "/mobcash/show-transaction-status";
const CHANGE_STATUS_PATH: &str = "/mobcash/change-transaction-status-manuel";

pub const DEPOSIT_FAILURE: FailureMessages =
    FailureMessages::new(&[], "Erreur lors de la création du dépôt");
pub const WITHDRAWAL_FAILURE: FailureMessages =
    FailureMessages::new(&[], "Erreur lors de la création du retrait");

impl ApiClient {
    /// Transaction history page, served from the query cache when present.
    #[instrument(skip(self))]
    pub async fn list_transactions(&self, filters: &TransactionFilters) -> Result<Page<Transaction>> {
        let key = QueryKey::with_params(TRANSACTIONS_KEY, filters)?;
        if let Some(page) = self.session.cache().get(&key) {
            return Ok(page);
        }

        let page: Page<Transaction> = self.get_with_query(HISTORY_PATH, filters).await?;
        self.session.cache().insert(key, &page)?;
        Ok(page)
    }

    #[instrument(skip(self, input), fields(app = %input.app))]
    pub async fn create_deposit(&self, input: &CreateDeposit) -> Result<Transaction> {
        let transaction: Transaction = self
            .mutate(CREATE_DEPOSIT_PATH, input, &DEPOSIT_FAILURE)
            .await?;
        self.notify_success("Dépôt créé avec succès!");
        self.invalidate_transactions();
        Ok(transaction)
    }

    #[instrument(skip(self, input), fields(app = %input.app))]
    pub async fn create_withdrawal(&self, input: &CreateWithdrawal) -> Result<Transaction> {
        let transaction: Transaction = self
            .mutate(CREATE_WITHDRAWAL_PATH, input, &WITHDRAWAL_FAILURE)
            .await?;
        self.notify_success("Retrait créé avec succès!");
        self.invalidate_transactions();
        Ok(transaction)
    }

    /// Ask the payment provider for the live status of a transaction.
    #[instrument(skip(self))]
    pub async fn transaction_status(&self, reference: &str) -> Result<TransactionStatusReport> {
        self.get_with_query(STATUS_PATH, &json!({ "reference": reference }))
            .await
    }

    #[instrument(skip(self, input), fields(reference = %input.reference))]
    pub async fn change_transaction_status(&self, input: &ChangeTransactionStatus) -> Result<Value> {
        let result: Value = self.post(CHANGE_STATUS_PATH, input).await?;
        self.notify_success("Statut de la transaction mis à jour avec succès!");
        self.invalidate_queries(&[TRANSACTIONS_KEY]);
        Ok(result)
    }

    fn invalidate_transactions(&self) {
        self.invalidate_queries(&[TRANSACTIONS_KEY]);
        self.invalidate_queries(&[DEPOSITS_KEY]);
    }
}
