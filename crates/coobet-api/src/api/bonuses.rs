use tracing::instrument;

use crate::cache::QueryKey;
use crate::classify::FailureMessages;
use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{Bonus, BonusFilters, CreateBonus, Page};

pub const BONUSES_KEY: &str = "bonuses";

const BONUS_PATH: &str = "/mobcash/bonus";
const CREATE_BONUS_PATH: &str = "/mobcash/create-bonus";

pub const BONUS_FAILURE: FailureMessages = FailureMessages::new(
    &["email", "amount", "reason_bonus"],
    "Erreur lors de la création du bonus",
);

impl ApiClient {
    #[instrument(skip(self))]
    pub async fn list_bonuses(&self, filters: &BonusFilters) -> Result<Page<Bonus>> {
        let key = QueryKey::with_params(BONUSES_KEY, filters)?;
        if let Some(page) = self.session.cache().get(&key) {
            return Ok(page);
        }

        let page: Page<Bonus> = self.get_with_query(BONUS_PATH, filters).await?;
        self.session.cache().insert(key, &page)?;
        Ok(page)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_bonus(&self, input: &CreateBonus) -> Result<Bonus> {
        let bonus: Bonus = self.mutate(CREATE_BONUS_PATH, input, &BONUS_FAILURE).await?;
        self.notify_success("Bonus créé avec succès!");
        self.invalidate_queries(&[BONUSES_KEY]);
        Ok(bonus)
    }
}
