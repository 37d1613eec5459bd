use tracing::{info, warn};

use contaflow_accounting::adjustment::next_number;
use contaflow_accounting::{
    Adjustment, AdjustmentFilter, AdjustmentUpdate, NewAdjustment, NewPeriod, NewTransaction,
    Period, Transaction, TransactionStatus,
};
use contaflow_core::{AdjustmentId, PeriodId, TransactionId};
use contaflow_infra::store::{AdjustmentStore, JournalStore, PeriodStore};

use super::{AppServices, now};
use crate::app::errors::{ServiceError, ServiceResult};

impl AppServices {
    pub async fn create_period(&self, input: NewPeriod) -> ServiceResult<Period> {
        let period = Period::create(input, now())?;
        self.store().insert_period(&period).await?;
        info!(period_id = %period.id, start = %period.start_date, end = %period.end_date, "period created");
        Ok(period)
    }

    pub async fn list_periods(&self) -> ServiceResult<Vec<Period>> {
        Ok(self.store().list_periods().await?)
    }

    pub async fn get_period(&self, id: PeriodId) -> ServiceResult<Period> {
        self.require_period(id).await
    }

    pub async fn close_period(&self, id: PeriodId) -> ServiceResult<Period> {
        let mut period = self.require_period(id).await?;
        period.close()?;
        self.store().update_period(&period).await?;
        info!(period_id = %id, "period closed");
        Ok(period)
    }

    pub async fn reopen_period(&self, id: PeriodId) -> ServiceResult<Period> {
        let mut period = self.require_period(id).await?;
        period.reopen()?;
        self.store().update_period(&period).await?;
        info!(period_id = %id, "period reopened");
        Ok(period)
    }

    pub async fn post_transaction(&self, input: NewTransaction, actor: &str) -> ServiceResult<Transaction> {
        let period = self.require_period(input.period_id).await?;
        let accounts = self.accounts_by_id().await?;
        let transaction = Transaction::post(input, &period, &accounts, actor, now())?;
        self.store().insert_transaction(&transaction).await?;
        info!(
            transaction_id = %transaction.id,
            period_id = %period.id,
            total = %transaction.total_debit(),
            "transaction posted"
        );
        Ok(transaction)
    }

    pub async fn list_transactions(&self, period_id: Option<PeriodId>) -> ServiceResult<Vec<Transaction>> {
        Ok(self.store().list_transactions(period_id).await?)
    }

    pub async fn get_transaction(&self, id: TransactionId) -> ServiceResult<Transaction> {
        self.store()
            .get_transaction(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("transaction {id}")))
    }

    pub async fn void_transaction(&self, id: TransactionId) -> ServiceResult<Transaction> {
        let mut transaction = self.get_transaction(id).await?;
        transaction.void()?;
        self.store()
            .set_transaction_status(id, TransactionStatus::Voided)
            .await?;
        warn!(transaction_id = %id, "transaction voided");
        Ok(transaction)
    }

    pub async fn create_adjustment(&self, input: NewAdjustment, actor: &str) -> ServiceResult<Adjustment> {
        let period = self.require_period(input.period_id).await?;
        let accounts = self.accounts_by_id().await?;
        let numbers = self.store().adjustment_numbers().await?;
        let generated = next_number(numbers.iter().map(String::as_str));
        let adjustment = Adjustment::create(input, &period, &accounts, generated, actor, now())?;
        self.store().insert_adjustment(&adjustment).await?;
        info!(adjustment_id = %adjustment.id, number = %adjustment.number, "adjusting entry created");
        Ok(adjustment)
    }

    pub async fn list_adjustments(&self, filter: &AdjustmentFilter) -> ServiceResult<Vec<Adjustment>> {
        let rows = self.store().list_adjustments(filter.period_id).await?;
        Ok(filter.apply(rows))
    }

    pub async fn get_adjustment(&self, id: AdjustmentId) -> ServiceResult<Adjustment> {
        self.store()
            .get_adjustment(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("adjusting entry {id}")))
    }

    pub async fn update_adjustment(&self, id: AdjustmentId, update: AdjustmentUpdate) -> ServiceResult<Adjustment> {
        let mut adjustment = self.get_adjustment(id).await?;
        let period = self.require_period(adjustment.period_id).await?;
        adjustment.apply_update(update, &period)?;
        self.store().update_adjustment(&adjustment).await?;
        Ok(adjustment)
    }

    pub async fn approve_adjustment(&self, id: AdjustmentId, actor: &str) -> ServiceResult<Adjustment> {
        let mut adjustment = self.get_adjustment(id).await?;
        adjustment.approve(actor, now())?;
        self.store().update_adjustment(&adjustment).await?;
        info!(adjustment_id = %id, approved_by = actor, "adjusting entry approved");
        Ok(adjustment)
    }

    pub async fn void_adjustment(&self, id: AdjustmentId, actor: &str) -> ServiceResult<Adjustment> {
        let mut adjustment = self.get_adjustment(id).await?;
        adjustment.void(actor, now())?;
        self.store().update_adjustment(&adjustment).await?;
        warn!(adjustment_id = %id, voided_by = actor, "adjusting entry voided");
        Ok(adjustment)
    }
}
