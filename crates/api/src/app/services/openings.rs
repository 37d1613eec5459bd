use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::info;

use contaflow_accounting::movement::by_account;
use contaflow_accounting::opening::{carry_forward, earnings_account, opening_amounts, summarize};
use contaflow_accounting::{AccountKind, NewOpeningBalance, OpeningBalance, OpeningSummary};
use contaflow_core::{AccountId, DomainError, OpeningBalanceId, PeriodId};
use contaflow_infra::store::{AccountStore, LedgerStore, OpeningStore};

use super::{AppServices, now};
use crate::app::errors::{ServiceError, ServiceResult};

impl AppServices {
    pub async fn create_opening_balance(
        &self,
        input: NewOpeningBalance,
        actor: &str,
    ) -> ServiceResult<OpeningBalance> {
        self.require_period(input.period_id).await?;
        let account = self.require_account(input.account_id).await?;
        let already_active = self
            .store()
            .list_opening_balances(input.period_id)
            .await?
            .iter()
            .any(|b| b.is_active() && b.account_id == account.id);
        let balance = OpeningBalance::create(input, &account, already_active, actor, now())?;
        self.store().insert_opening_balance(&balance).await?;
        info!(
            opening_id = %balance.id,
            period_id = %balance.period_id,
            account = %account.code,
            amount = %balance.amount,
            "opening balance created"
        );
        Ok(balance)
    }

    pub async fn list_opening_balances(&self, period_id: PeriodId) -> ServiceResult<Vec<OpeningBalance>> {
        self.require_period(period_id).await?;
        Ok(self.store().list_opening_balances(period_id).await?)
    }

    pub async fn get_opening_balance(&self, id: OpeningBalanceId) -> ServiceResult<OpeningBalance> {
        self.store()
            .get_opening_balance(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("opening balance {id}")))
    }

    pub async fn update_opening_balance(
        &self,
        id: OpeningBalanceId,
        amount: Option<Decimal>,
        notes: Option<String>,
        actor: &str,
    ) -> ServiceResult<OpeningBalance> {
        let mut balance = self.get_opening_balance(id).await?;
        let account = self.require_account(balance.account_id).await?;
        balance.update(amount, notes, &account, actor, now())?;
        self.store().update_opening_balance(&balance).await?;
        Ok(balance)
    }

    pub async fn deactivate_opening_balance(&self, id: OpeningBalanceId, actor: &str) -> ServiceResult<OpeningBalance> {
        let mut balance = self.get_opening_balance(id).await?;
        balance.deactivate(actor, now())?;
        self.store().update_opening_balance(&balance).await?;
        info!(opening_id = %id, "opening balance deactivated");
        Ok(balance)
    }

    /// Returns how many balances were deactivated.
    pub async fn deactivate_all_opening_balances(&self, period_id: PeriodId, actor: &str) -> ServiceResult<u64> {
        self.require_period(period_id).await?;
        let count = self
            .store()
            .deactivate_opening_balances(period_id, actor, now())
            .await?;
        info!(period_id = %period_id, count, "opening balances deactivated");
        Ok(count)
    }

    /// Seed `target` with the closing balances of `source`.
    pub async fn carry_forward_opening_balances(
        &self,
        source: PeriodId,
        target: PeriodId,
        earnings_account_id: Option<AccountId>,
        actor: &str,
    ) -> ServiceResult<Vec<OpeningBalance>> {
        if source == target {
            return Err(DomainError::validation("source and target periods must differ").into());
        }
        let source_period = self.require_period(source).await?;
        self.require_period(target).await?;

        let accounts = self.store().list_accounts().await?;
        let source_openings = opening_amounts(&self.store().list_opening_balances(source).await?);
        let movements = by_account(
            self.store()
                .account_movements(source, source_period.end_date)
                .await?,
        );
        let target_has_active = self
            .store()
            .list_opening_balances(target)
            .await?
            .iter()
            .any(OpeningBalance::is_active);

        let earnings = earnings_account(&accounts, earnings_account_id)?;

        let balances = carry_forward(
            target,
            &accounts,
            &source_openings,
            &movements,
            earnings,
            target_has_active,
            actor,
            now(),
        )?;
        self.store().insert_opening_balances(&balances).await?;
        info!(
            source = %source,
            target = %target,
            count = balances.len(),
            "opening balances carried forward"
        );
        Ok(balances)
    }

    pub async fn opening_summary(&self, period_id: PeriodId) -> ServiceResult<OpeningSummary> {
        let balances = self.list_opening_balances(period_id).await?;
        let kinds: HashMap<AccountId, AccountKind> = self
            .store()
            .list_accounts()
            .await?
            .into_iter()
            .map(|a| (a.id, a.kind))
            .collect();
        Ok(summarize(period_id, &balances, &kinds))
    }
}
