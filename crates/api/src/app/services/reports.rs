//! Trial balance, general ledger, financial statements and company settings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use contaflow_accounting::general_ledger::{account_ledger, period_ledger, roll_forward};
use contaflow_accounting::movement::by_account;
use contaflow_accounting::opening::opening_amounts;
use contaflow_accounting::statements::{balance_sheet, income_statement};
use contaflow_accounting::trial_balance::{analyze, resolve_cutoff, validate};
use contaflow_accounting::{
    AccountActivity, AccountKind, AccountLedger, BalanceSheet, BalanceStatus, BalanceValidation,
    CompanySettings, CompanySettingsUpdate, IncomeStatement, LedgerQuery, Period, ReportHeader,
    StatementKind, StatementRecord, TrialBalance,
};
use contaflow_core::{AccountId, PeriodId, StatementId, TrialBalanceId};
use contaflow_infra::store::{AccountStore, LedgerStore, OpeningStore, ReportStore};

use super::{AppServices, now};
use crate::app::errors::{ServiceError, ServiceResult};

/// A statement as returned to the caller, with the history record id when it
/// was saved.
#[derive(Debug, Clone, Serialize)]
pub struct SavedStatement<T> {
    #[serde(flatten)]
    pub statement: T,
    pub record_id: Option<StatementId>,
}

impl AppServices {
    pub async fn generate_trial_balance(
        &self,
        period_id: PeriodId,
        until: Option<NaiveDate>,
        actor: &str,
    ) -> ServiceResult<TrialBalance> {
        let period = self.require_period(period_id).await?;
        let until = resolve_cutoff(&period, until)?;
        let accounts = self.store().list_accounts().await?;
        let openings = opening_amounts(&self.store().list_opening_balances(period_id).await?);
        let movements = by_account(self.store().account_movements(period_id, until).await?);

        let trial_balance = TrialBalance::generate(&period, until, &accounts, &openings, &movements, actor, now());
        self.store().insert_trial_balance(&trial_balance).await?;

        if trial_balance.status == BalanceStatus::Unbalanced {
            warn!(
                period_id = %period_id,
                %until,
                movement_difference = %trial_balance.totals.movement_difference,
                balance_difference = %trial_balance.totals.balance_difference,
                "trial balance is unbalanced"
            );
        } else {
            info!(period_id = %period_id, %until, rows = trial_balance.rows.len(), "trial balance generated");
        }
        Ok(trial_balance)
    }

    pub async fn validate_trial_balance(
        &self,
        period_id: PeriodId,
        until: Option<NaiveDate>,
    ) -> ServiceResult<BalanceValidation> {
        let period = self.require_period(period_id).await?;
        let until = resolve_cutoff(&period, until)?;
        let entries = self.store().entry_totals(period_id, until).await?;
        Ok(validate(period_id, until, &entries))
    }

    pub async fn trial_balance_analysis(
        &self,
        period_id: PeriodId,
        kind: Option<AccountKind>,
    ) -> ServiceResult<Vec<AccountActivity>> {
        let period = self.require_period(period_id).await?;
        let accounts = self.store().list_accounts().await?;
        let openings = opening_amounts(&self.store().list_opening_balances(period_id).await?);
        let movements = by_account(self.store().account_movements(period_id, period.end_date).await?);
        Ok(analyze(&accounts, &openings, &movements, kind))
    }

    pub async fn list_trial_balances(&self, period_id: PeriodId) -> ServiceResult<Vec<TrialBalance>> {
        self.require_period(period_id).await?;
        Ok(self.store().list_trial_balances(period_id).await?)
    }

    pub async fn get_trial_balance(&self, id: TrialBalanceId) -> ServiceResult<TrialBalance> {
        self.store()
            .get_trial_balance(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("trial balance {id}")))
    }

    /// Ledger of one account. With a period, the period's active opening
    /// balance is the starting point; otherwise the ledger starts at zero.
    /// Movements before `from` are folded into that starting balance.
    pub async fn account_ledger(&self, account_id: AccountId, query: LedgerQuery) -> ServiceResult<AccountLedger> {
        let account = self.require_account(account_id).await?;
        let mut opening = match query.period_id {
            Some(period_id) => {
                self.require_period(period_id).await?;
                opening_amounts(&self.store().list_opening_balances(period_id).await?)
                    .get(&account_id)
                    .copied()
                    .unwrap_or(Decimal::ZERO)
            }
            None => Decimal::ZERO,
        };
        let query = LedgerQuery {
            account_id: Some(account_id),
            ..query
        };
        if let Some(before) = query.from.and_then(|f| f.pred_opt()) {
            let earlier = self
                .store()
                .posted_lines(&LedgerQuery {
                    from: None,
                    to: Some(before),
                    ..query.clone()
                })
                .await?;
            opening = roll_forward(&account, opening, &earlier);
        }
        let lines = self.store().posted_lines(&query).await?;
        Ok(account_ledger(&account, opening, &lines))
    }

    pub async fn period_ledger(&self, period_id: PeriodId) -> ServiceResult<Vec<AccountLedger>> {
        self.require_period(period_id).await?;
        let accounts = self.store().list_accounts().await?;
        let openings = opening_amounts(&self.store().list_opening_balances(period_id).await?);
        let lines = self
            .store()
            .posted_lines(&LedgerQuery {
                account_id: None,
                period_id: Some(period_id),
                from: None,
                to: None,
            })
            .await?;
        Ok(period_ledger(&accounts, &openings, &lines))
    }

    async fn report_header(&self, period: &Period) -> ServiceResult<ReportHeader> {
        let company = self.company_settings().await?;
        Ok(ReportHeader::new(&company, period, now().date_naive()))
    }

    pub async fn balance_sheet(&self, period_id: PeriodId) -> ServiceResult<BalanceSheet> {
        let period = self.require_period(period_id).await?;
        let header = self.report_header(&period).await?;
        let accounts = self.store().list_accounts().await?;
        let classifications = self.store().manual_classifications().await?;
        let openings = opening_amounts(&self.store().list_opening_balances(period_id).await?);
        let movements = by_account(self.store().account_movements(period_id, period.end_date).await?);
        let sheet = balance_sheet(header, &accounts, &classifications, &openings, &movements);
        if !sheet.balanced {
            warn!(period_id = %period_id, difference = %sheet.difference, "balance sheet does not balance");
        }
        Ok(sheet)
    }

    pub async fn income_statement(&self, period_id: PeriodId) -> ServiceResult<IncomeStatement> {
        let period = self.require_period(period_id).await?;
        let header = self.report_header(&period).await?;
        let accounts = self.store().list_accounts().await?;
        let movements = self.store().category_movements(period_id).await?;
        Ok(income_statement(header, &accounts, &movements))
    }

    pub async fn balance_sheet_report(
        &self,
        period_id: PeriodId,
        save: bool,
        actor: &str,
    ) -> ServiceResult<SavedStatement<BalanceSheet>> {
        let sheet = self.balance_sheet(period_id).await?;
        let record_id = if save {
            let record = StatementRecord::from_balance_sheet(&sheet, actor, now())?;
            self.store().insert_statement(&record).await?;
            Some(record.id)
        } else {
            None
        };
        Ok(SavedStatement {
            statement: sheet,
            record_id,
        })
    }

    pub async fn income_statement_report(
        &self,
        period_id: PeriodId,
        save: bool,
        actor: &str,
    ) -> ServiceResult<SavedStatement<IncomeStatement>> {
        let statement = self.income_statement(period_id).await?;
        let record_id = if save {
            let record = StatementRecord::from_income_statement(&statement, actor, now())?;
            self.store().insert_statement(&record).await?;
            Some(record.id)
        } else {
            None
        };
        Ok(SavedStatement {
            statement,
            record_id,
        })
    }

    /// Generate a statement and store it in the period's history.
    pub async fn save_statement(
        &self,
        period_id: PeriodId,
        kind: StatementKind,
        actor: &str,
    ) -> ServiceResult<StatementRecord> {
        let record = match kind {
            StatementKind::BalanceSheet => {
                StatementRecord::from_balance_sheet(&self.balance_sheet(period_id).await?, actor, now())?
            }
            StatementKind::IncomeStatement => {
                StatementRecord::from_income_statement(&self.income_statement(period_id).await?, actor, now())?
            }
        };
        self.store().insert_statement(&record).await?;
        info!(period_id = %period_id, kind = kind.as_str(), record_id = %record.id, "statement saved");
        Ok(record)
    }

    pub async fn statement_history(&self, period_id: PeriodId) -> ServiceResult<Vec<StatementRecord>> {
        self.require_period(period_id).await?;
        Ok(self.store().list_statements(period_id).await?)
    }

    pub async fn get_statement(&self, id: StatementId) -> ServiceResult<StatementRecord> {
        self.store()
            .get_statement(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("statement {id}")))
    }

    /// Stored settings, creating the defaults on first read.
    pub async fn company_settings(&self) -> ServiceResult<CompanySettings> {
        if let Some(settings) = self.store().get_settings().await? {
            return Ok(settings);
        }
        let settings = CompanySettings::defaults(now());
        self.store().save_settings(&settings).await?;
        Ok(settings)
    }

    pub async fn update_company_settings(&self, update: CompanySettingsUpdate) -> ServiceResult<CompanySettings> {
        let mut settings = self.company_settings().await?;
        settings.apply_update(update, now())?;
        self.store().save_settings(&settings).await?;
        info!(company = %settings.name, "company settings updated");
        Ok(settings)
    }
}
