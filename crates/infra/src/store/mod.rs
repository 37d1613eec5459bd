//! Persistence ports and their implementations.
//!
//! Stores hand plain rows to the domain crates. Filtering, ordering and paging
//! of list results happen in the domain `*Filter` types; the store only
//! narrows by the coarse keys named in each method.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use contaflow_accounting::{
    Account, AccountManual, AccountMovement, Adjustment, BalanceClassification, CategoryMovement,
    CompanySettings, EntryTotals, LedgerQuery, OpeningBalance, Period, PostedLine, StatementRecord,
    Transaction, TransactionStatus, TrialBalance,
};
use contaflow_core::{
    AccountId, AdjustmentId, ClientId, DomainResult, InvoiceId, OpeningBalanceId, PeriodId,
    ProductId, StatementId, TransactionId, TrialBalanceId,
};
use contaflow_invoicing::{Client, Invoice, InvoicingSettings, Product};

use crate::error::StoreResult;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Builds an invoice, plus its sale transaction when posting is enabled,
/// from the number allocated by the store.
pub type InvoiceBuilder =
    Box<dyn FnOnce(String) -> DomainResult<(Invoice, Option<Transaction>)> + Send>;

#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Conflict when the code is taken.
    async fn insert_account(&self, account: &Account) -> StoreResult<()>;
    async fn update_account(&self, account: &Account) -> StoreResult<()>;
    /// Also removes the account manual.
    async fn delete_account(&self, id: AccountId) -> StoreResult<()>;
    async fn get_account(&self, id: AccountId) -> StoreResult<Option<Account>>;
    async fn list_accounts(&self) -> StoreResult<Vec<Account>>;
    async fn account_has_children(&self, id: AccountId) -> StoreResult<bool>;
    /// Lines in any transaction or adjusting entry, whatever its status.
    async fn account_has_postings(&self, id: AccountId) -> StoreResult<bool>;

    async fn get_manual(&self, account_id: AccountId) -> StoreResult<Option<AccountManual>>;
    /// Conflict when the account already has a manual.
    async fn insert_manual(&self, manual: &AccountManual) -> StoreResult<()>;
    async fn update_manual(&self, manual: &AccountManual) -> StoreResult<()>;
    async fn delete_manual(&self, account_id: AccountId) -> StoreResult<()>;
    async fn manual_classifications(&self) -> StoreResult<HashMap<AccountId, BalanceClassification>>;
}

#[async_trait::async_trait]
pub trait PeriodStore: Send + Sync {
    async fn insert_period(&self, period: &Period) -> StoreResult<()>;
    async fn update_period(&self, period: &Period) -> StoreResult<()>;
    async fn get_period(&self, id: PeriodId) -> StoreResult<Option<Period>>;
    /// Newest start date first.
    async fn list_periods(&self) -> StoreResult<Vec<Period>>;
}

#[async_trait::async_trait]
pub trait JournalStore: Send + Sync {
    /// Header and lines in one unit.
    async fn insert_transaction(&self, transaction: &Transaction) -> StoreResult<()>;
    async fn get_transaction(&self, id: TransactionId) -> StoreResult<Option<Transaction>>;
    /// Ordered by date, then id.
    async fn list_transactions(&self, period_id: Option<PeriodId>) -> StoreResult<Vec<Transaction>>;
    async fn set_transaction_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait OpeningStore: Send + Sync {
    /// Conflict when the account already has an active balance in the period.
    async fn insert_opening_balance(&self, balance: &OpeningBalance) -> StoreResult<()>;
    /// All or nothing.
    async fn insert_opening_balances(&self, balances: &[OpeningBalance]) -> StoreResult<()>;
    async fn update_opening_balance(&self, balance: &OpeningBalance) -> StoreResult<()>;
    async fn get_opening_balance(&self, id: OpeningBalanceId) -> StoreResult<Option<OpeningBalance>>;
    async fn list_opening_balances(&self, period_id: PeriodId) -> StoreResult<Vec<OpeningBalance>>;
    /// Returns how many balances were deactivated.
    async fn deactivate_opening_balances(
        &self,
        period_id: PeriodId,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<u64>;
}

#[async_trait::async_trait]
pub trait AdjustmentStore: Send + Sync {
    /// Conflict when the number is taken.
    async fn insert_adjustment(&self, adjustment: &Adjustment) -> StoreResult<()>;
    /// Header, status and approval fields; lines are immutable.
    async fn update_adjustment(&self, adjustment: &Adjustment) -> StoreResult<()>;
    async fn get_adjustment(&self, id: AdjustmentId) -> StoreResult<Option<Adjustment>>;
    async fn list_adjustments(&self, period_id: Option<PeriodId>) -> StoreResult<Vec<Adjustment>>;
    async fn adjustment_numbers(&self) -> StoreResult<Vec<String>>;
}

/// Aggregations over posted transactions and active adjusting entries.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Per-account totals of lines dated up to `until` within the period.
    async fn account_movements(
        &self,
        period_id: PeriodId,
        until: NaiveDate,
    ) -> StoreResult<Vec<AccountMovement>>;
    /// Per account and category; adjusting entries group under their kind.
    async fn category_movements(&self, period_id: PeriodId) -> StoreResult<Vec<CategoryMovement>>;
    async fn entry_totals(&self, period_id: PeriodId, until: NaiveDate) -> StoreResult<Vec<EntryTotals>>;
    async fn posted_lines(&self, query: &LedgerQuery) -> StoreResult<Vec<PostedLine>>;
}

#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert_trial_balance(&self, trial_balance: &TrialBalance) -> StoreResult<()>;
    async fn get_trial_balance(&self, id: TrialBalanceId) -> StoreResult<Option<TrialBalance>>;
    /// Newest first.
    async fn list_trial_balances(&self, period_id: PeriodId) -> StoreResult<Vec<TrialBalance>>;
    async fn insert_statement(&self, record: &StatementRecord) -> StoreResult<()>;
    async fn get_statement(&self, id: StatementId) -> StoreResult<Option<StatementRecord>>;
    /// Newest first.
    async fn list_statements(&self, period_id: PeriodId) -> StoreResult<Vec<StatementRecord>>;
    async fn get_settings(&self) -> StoreResult<Option<CompanySettings>>;
    async fn save_settings(&self, settings: &CompanySettings) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait ClientStore: Send + Sync {
    /// Conflict when the code is taken.
    async fn insert_client(&self, client: &Client) -> StoreResult<()>;
    async fn update_client(&self, client: &Client) -> StoreResult<()>;
    async fn get_client(&self, id: ClientId) -> StoreResult<Option<Client>>;
    async fn list_clients(&self) -> StoreResult<Vec<Client>>;
    async fn client_codes(&self) -> StoreResult<Vec<String>>;
    /// Whether an active client other than `except` uses the tax id.
    async fn tax_id_in_use(&self, tax_id: &str, except: Option<ClientId>) -> StoreResult<bool>;
}

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    /// Conflict when the code is taken.
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    async fn update_product(&self, product: &Product) -> StoreResult<()>;
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn get_product_by_code(&self, code: &str) -> StoreResult<Option<Product>>;
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
}

#[async_trait::async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Allocate the next number of `series`, build the invoice and persist it
    /// together with its sale transaction. The number is only consumed when
    /// everything is stored.
    async fn create_invoice(&self, series: &str, build: InvoiceBuilder) -> StoreResult<Invoice>;
    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>>;
    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>>;
    /// Persist a paid invoice and its payment transaction. Conflict when the
    /// stored invoice is no longer open.
    async fn record_payment(&self, invoice: &Invoice, payment: Option<&Transaction>) -> StoreResult<()>;
    /// Persist a voided invoice and void its linked transactions. Conflict
    /// when the stored invoice is already voided.
    async fn void_invoice(&self, invoice: &Invoice) -> StoreResult<()>;
    /// Flip issued invoices due before `as_of` to overdue; returns them.
    async fn mark_overdue(&self, as_of: NaiveDate, now: DateTime<Utc>) -> StoreResult<Vec<Invoice>>;
    async fn get_invoicing_settings(&self) -> StoreResult<Option<InvoicingSettings>>;
    async fn save_invoicing_settings(&self, settings: &InvoicingSettings) -> StoreResult<()>;
}

/// Everything the application needs from persistence.
pub trait Store:
    AccountStore
    + PeriodStore
    + JournalStore
    + OpeningStore
    + AdjustmentStore
    + LedgerStore
    + ReportStore
    + ClientStore
    + ProductStore
    + InvoiceStore
{
}

impl<T> Store for T where
    T: AccountStore
        + PeriodStore
        + JournalStore
        + OpeningStore
        + AdjustmentStore
        + LedgerStore
        + ReportStore
        + ClientStore
        + ProductStore
        + InvoiceStore
{
}
