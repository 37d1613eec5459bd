//! In-memory store for tests and local development.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use contaflow_accounting::{
    Account, AccountManual, AccountMovement, Adjustment, AdjustmentStatus, BalanceClassification,
    CategoryMovement, CompanySettings, EntrySource, EntryTotals, LedgerQuery, OpeningBalance,
    OpeningStatus, Period, PostedLine, StatementRecord, Transaction, TransactionStatus,
    TrialBalance,
};
use contaflow_core::{
    AccountId, AdjustmentId, ClientId, InvoiceId, OpeningBalanceId, PeriodId, ProductId,
    StatementId, TransactionId, TrialBalanceId,
};
use contaflow_invoicing::invoice::format_number;
use contaflow_invoicing::{Client, Invoice, InvoiceStatus, InvoicingSettings, Product};

use super::{
    AccountStore, AdjustmentStore, ClientStore, InvoiceBuilder, InvoiceStore, JournalStore,
    LedgerStore, OpeningStore, PeriodStore, ProductStore, ReportStore,
};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    manuals: HashMap<AccountId, AccountManual>,
    periods: HashMap<PeriodId, Period>,
    transactions: HashMap<TransactionId, Transaction>,
    openings: HashMap<OpeningBalanceId, OpeningBalance>,
    adjustments: HashMap<AdjustmentId, Adjustment>,
    trial_balances: HashMap<TrialBalanceId, TrialBalance>,
    statements: HashMap<StatementId, StatementRecord>,
    settings: Option<CompanySettings>,
    clients: HashMap<ClientId, Client>,
    products: HashMap<ProductId, Product>,
    invoices: HashMap<InvoiceId, Invoice>,
    invoicing_settings: Option<InvoicingSettings>,
    /// Last number issued per invoice series.
    sequences: HashMap<String, i64>,
}

/// A line of a posted transaction or active adjusting entry.
struct LedgerRow<'a> {
    source: EntrySource,
    entry_id: Uuid,
    line_id: Uuid,
    account_id: AccountId,
    period_id: PeriodId,
    date: NaiveDate,
    reference: Option<&'a str>,
    description: &'a str,
    category: &'a str,
    debit: Decimal,
    credit: Decimal,
}

impl State {
    fn ledger_rows(&self) -> Vec<LedgerRow<'_>> {
        let mut rows = Vec::new();
        for tx in self.transactions.values().filter(|t| t.is_posted()) {
            for line in &tx.lines {
                rows.push(LedgerRow {
                    source: EntrySource::Transaction,
                    entry_id: tx.id.into(),
                    line_id: line.id.into(),
                    account_id: line.account_id,
                    period_id: tx.period_id,
                    date: tx.date,
                    reference: tx.reference.as_deref(),
                    description: &tx.description,
                    category: &tx.category,
                    debit: line.debit,
                    credit: line.credit,
                });
            }
        }
        for adj in self.adjustments.values().filter(|a| a.is_active()) {
            for line in &adj.lines {
                rows.push(LedgerRow {
                    source: EntrySource::Adjustment,
                    entry_id: adj.id.into(),
                    line_id: line.id.into(),
                    account_id: line.account_id,
                    period_id: adj.period_id,
                    date: adj.date,
                    reference: Some(&adj.number),
                    description: &adj.description,
                    category: &adj.kind,
                    debit: line.debit,
                    credit: line.credit,
                });
            }
        }
        rows
    }

    fn has_active_opening(&self, period_id: PeriodId, account_id: AccountId, except: Option<OpeningBalanceId>) -> bool {
        self.openings.values().any(|b| {
            b.period_id == period_id
                && b.account_id == account_id
                && b.status == OpeningStatus::Active
                && Some(b.id) != except
        })
    }
}

/// Thread-safe in-memory implementation of every store port.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Database("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Database("in-memory store lock poisoned".to_string()))
    }
}

fn missing(what: &str, id: impl std::fmt::Display) -> StoreError {
    StoreError::not_found(format!("{what} {id}"))
}

#[async_trait::async_trait]
impl AccountStore for InMemoryStore {
    async fn insert_account(&self, account: &Account) -> StoreResult<()> {
        let mut s = self.write()?;
        if s.accounts.values().any(|a| a.code == account.code) {
            return Err(StoreError::conflict(format!(
                "account code {} already exists",
                account.code
            )));
        }
        s.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> StoreResult<()> {
        let mut s = self.write()?;
        match s.accounts.get_mut(&account.id) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(missing("account", account.id)),
        }
    }

    async fn delete_account(&self, id: AccountId) -> StoreResult<()> {
        let mut s = self.write()?;
        if s.accounts.remove(&id).is_none() {
            return Err(missing("account", id));
        }
        s.manuals.remove(&id);
        Ok(())
    }

    async fn get_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    async fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let mut out: Vec<Account> = self.read()?.accounts.values().cloned().collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(out)
    }

    async fn account_has_children(&self, id: AccountId) -> StoreResult<bool> {
        Ok(self.read()?.accounts.values().any(|a| a.parent_id == Some(id)))
    }

    async fn account_has_postings(&self, id: AccountId) -> StoreResult<bool> {
        let s = self.read()?;
        let in_journal = s
            .transactions
            .values()
            .any(|t| t.lines.iter().any(|l| l.account_id == id));
        let in_adjustments = s
            .adjustments
            .values()
            .any(|a| a.lines.iter().any(|l| l.account_id == id));
        Ok(in_journal || in_adjustments)
    }

    async fn get_manual(&self, account_id: AccountId) -> StoreResult<Option<AccountManual>> {
        Ok(self.read()?.manuals.get(&account_id).cloned())
    }

    async fn insert_manual(&self, manual: &AccountManual) -> StoreResult<()> {
        let mut s = self.write()?;
        if s.manuals.contains_key(&manual.account_id) {
            return Err(StoreError::conflict(format!(
                "account {} already has a manual",
                manual.account_id
            )));
        }
        s.manuals.insert(manual.account_id, manual.clone());
        Ok(())
    }

    async fn update_manual(&self, manual: &AccountManual) -> StoreResult<()> {
        let mut s = self.write()?;
        match s.manuals.get_mut(&manual.account_id) {
            Some(slot) => {
                *slot = manual.clone();
                Ok(())
            }
            None => Err(missing("manual for account", manual.account_id)),
        }
    }

    async fn delete_manual(&self, account_id: AccountId) -> StoreResult<()> {
        match self.write()?.manuals.remove(&account_id) {
            Some(_) => Ok(()),
            None => Err(missing("manual for account", account_id)),
        }
    }

    async fn manual_classifications(&self) -> StoreResult<HashMap<AccountId, BalanceClassification>> {
        Ok(self
            .read()?
            .manuals
            .values()
            .filter_map(|m| m.classification.map(|c| (m.account_id, c)))
            .collect())
    }
}

#[async_trait::async_trait]
impl PeriodStore for InMemoryStore {
    async fn insert_period(&self, period: &Period) -> StoreResult<()> {
        self.write()?.periods.insert(period.id, period.clone());
        Ok(())
    }

    async fn update_period(&self, period: &Period) -> StoreResult<()> {
        let mut s = self.write()?;
        match s.periods.get_mut(&period.id) {
            Some(slot) => {
                *slot = period.clone();
                Ok(())
            }
            None => Err(missing("period", period.id)),
        }
    }

    async fn get_period(&self, id: PeriodId) -> StoreResult<Option<Period>> {
        Ok(self.read()?.periods.get(&id).cloned())
    }

    async fn list_periods(&self) -> StoreResult<Vec<Period>> {
        let mut out: Vec<Period> = self.read()?.periods.values().cloned().collect();
        out.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(out)
    }
}

#[async_trait::async_trait]
impl JournalStore for InMemoryStore {
    async fn insert_transaction(&self, transaction: &Transaction) -> StoreResult<()> {
        self.write()?
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn get_transaction(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        Ok(self.read()?.transactions.get(&id).cloned())
    }

    async fn list_transactions(&self, period_id: Option<PeriodId>) -> StoreResult<Vec<Transaction>> {
        let mut out: Vec<Transaction> = self
            .read()?
            .transactions
            .values()
            .filter(|t| period_id.is_none_or(|p| p == t.period_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn set_transaction_status(&self, id: TransactionId, status: TransactionStatus) -> StoreResult<()> {
        let mut s = self.write()?;
        match s.transactions.get_mut(&id) {
            Some(tx) => {
                tx.status = status;
                Ok(())
            }
            None => Err(missing("transaction", id)),
        }
    }
}

#[async_trait::async_trait]
impl OpeningStore for InMemoryStore {
    async fn insert_opening_balance(&self, balance: &OpeningBalance) -> StoreResult<()> {
        let mut s = self.write()?;
        if balance.status == OpeningStatus::Active
            && s.has_active_opening(balance.period_id, balance.account_id, None)
        {
            return Err(StoreError::conflict(
                "the account already has an active opening balance in this period",
            ));
        }
        s.openings.insert(balance.id, balance.clone());
        Ok(())
    }

    async fn insert_opening_balances(&self, balances: &[OpeningBalance]) -> StoreResult<()> {
        let mut s = self.write()?;
        for (idx, b) in balances.iter().enumerate() {
            let clash_in_batch = balances[..idx]
                .iter()
                .any(|o| o.period_id == b.period_id && o.account_id == b.account_id);
            if clash_in_batch || s.has_active_opening(b.period_id, b.account_id, None) {
                return Err(StoreError::conflict(format!(
                    "account {} already has an active opening balance in this period",
                    b.account_id
                )));
            }
        }
        for b in balances {
            s.openings.insert(b.id, b.clone());
        }
        Ok(())
    }

    async fn update_opening_balance(&self, balance: &OpeningBalance) -> StoreResult<()> {
        let mut s = self.write()?;
        if !s.openings.contains_key(&balance.id) {
            return Err(missing("opening balance", balance.id));
        }
        if balance.status == OpeningStatus::Active
            && s.has_active_opening(balance.period_id, balance.account_id, Some(balance.id))
        {
            return Err(StoreError::conflict(
                "the account already has an active opening balance in this period",
            ));
        }
        s.openings.insert(balance.id, balance.clone());
        Ok(())
    }

    async fn get_opening_balance(&self, id: OpeningBalanceId) -> StoreResult<Option<OpeningBalance>> {
        Ok(self.read()?.openings.get(&id).cloned())
    }

    async fn list_opening_balances(&self, period_id: PeriodId) -> StoreResult<Vec<OpeningBalance>> {
        let mut out: Vec<OpeningBalance> = self
            .read()?
            .openings
            .values()
            .filter(|b| b.period_id == period_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn deactivate_opening_balances(
        &self,
        period_id: PeriodId,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let mut s = self.write()?;
        let mut count = 0;
        for b in s
            .openings
            .values_mut()
            .filter(|b| b.period_id == period_id && b.is_active())
        {
            b.status = OpeningStatus::Inactive;
            b.updated_by = Some(updated_by.to_string());
            b.updated_at = now;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait::async_trait]
impl AdjustmentStore for InMemoryStore {
    async fn insert_adjustment(&self, adjustment: &Adjustment) -> StoreResult<()> {
        let mut s = self.write()?;
        if s.adjustments.values().any(|a| a.number == adjustment.number) {
            return Err(StoreError::conflict(format!(
                "adjusting entry {} already exists",
                adjustment.number
            )));
        }
        s.adjustments.insert(adjustment.id, adjustment.clone());
        Ok(())
    }

    async fn update_adjustment(&self, adjustment: &Adjustment) -> StoreResult<()> {
        let mut s = self.write()?;
        match s.adjustments.get_mut(&adjustment.id) {
            Some(slot) => {
                let lines = std::mem::take(&mut slot.lines);
                *slot = Adjustment {
                    lines,
                    ..adjustment.clone()
                };
                Ok(())
            }
            None => Err(missing("adjusting entry", adjustment.id)),
        }
    }

    async fn get_adjustment(&self, id: AdjustmentId) -> StoreResult<Option<Adjustment>> {
        Ok(self.read()?.adjustments.get(&id).cloned())
    }

    async fn list_adjustments(&self, period_id: Option<PeriodId>) -> StoreResult<Vec<Adjustment>> {
        Ok(self
            .read()?
            .adjustments
            .values()
            .filter(|a| period_id.is_none_or(|p| p == a.period_id))
            .cloned()
            .collect())
    }

    async fn adjustment_numbers(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .read()?
            .adjustments
            .values()
            .map(|a| a.number.clone())
            .collect())
    }
}

#[async_trait::async_trait]
impl LedgerStore for InMemoryStore {
    async fn account_movements(&self, period_id: PeriodId, until: NaiveDate) -> StoreResult<Vec<AccountMovement>> {
        let s = self.read()?;
        let mut by_account: HashMap<AccountId, AccountMovement> = HashMap::new();
        for row in s
            .ledger_rows()
            .into_iter()
            .filter(|r| r.period_id == period_id && r.date <= until)
        {
            let m = by_account
                .entry(row.account_id)
                .or_insert_with(|| AccountMovement::empty(row.account_id));
            m.debit += row.debit;
            m.credit += row.credit;
            m.line_count += 1;
        }
        Ok(by_account.into_values().collect())
    }

    async fn category_movements(&self, period_id: PeriodId) -> StoreResult<Vec<CategoryMovement>> {
        let s = self.read()?;
        let mut grouped: HashMap<(AccountId, String), (Decimal, Decimal)> = HashMap::new();
        for row in s.ledger_rows().into_iter().filter(|r| r.period_id == period_id) {
            let slot = grouped
                .entry((row.account_id, row.category.to_string()))
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            slot.0 += row.debit;
            slot.1 += row.credit;
        }
        Ok(grouped
            .into_iter()
            .map(|((account_id, category), (debit, credit))| CategoryMovement {
                account_id,
                category,
                debit,
                credit,
            })
            .collect())
    }

    async fn entry_totals(&self, period_id: PeriodId, until: NaiveDate) -> StoreResult<Vec<EntryTotals>> {
        let s = self.read()?;
        let mut by_entry: HashMap<Uuid, EntryTotals> = HashMap::new();
        for row in s
            .ledger_rows()
            .into_iter()
            .filter(|r| r.period_id == period_id && r.date <= until)
        {
            let e = by_entry.entry(row.entry_id).or_insert_with(|| EntryTotals {
                source: row.source,
                entry_id: row.entry_id,
                date: row.date,
                description: row.description.to_string(),
                debit: Decimal::ZERO,
                credit: Decimal::ZERO,
            });
            e.debit += row.debit;
            e.credit += row.credit;
        }
        let mut out: Vec<EntryTotals> = by_entry.into_values().collect();
        out.sort_by(|a, b| a.date.cmp(&b.date).then(a.entry_id.cmp(&b.entry_id)));
        Ok(out)
    }

    async fn posted_lines(&self, query: &LedgerQuery) -> StoreResult<Vec<PostedLine>> {
        let s = self.read()?;
        Ok(s.ledger_rows()
            .into_iter()
            .filter(|r| query.account_id.is_none_or(|a| a == r.account_id))
            .filter(|r| query.period_id.is_none_or(|p| p == r.period_id))
            .filter(|r| query.includes_date(r.date))
            .map(|r| PostedLine {
                source: r.source,
                entry_id: r.entry_id,
                line_id: r.line_id,
                account_id: r.account_id,
                date: r.date,
                reference: r.reference.map(str::to_string),
                description: r.description.to_string(),
                debit: r.debit,
                credit: r.credit,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl ReportStore for InMemoryStore {
    async fn insert_trial_balance(&self, trial_balance: &TrialBalance) -> StoreResult<()> {
        self.write()?
            .trial_balances
            .insert(trial_balance.id, trial_balance.clone());
        Ok(())
    }

    async fn get_trial_balance(&self, id: TrialBalanceId) -> StoreResult<Option<TrialBalance>> {
        Ok(self.read()?.trial_balances.get(&id).cloned())
    }

    async fn list_trial_balances(&self, period_id: PeriodId) -> StoreResult<Vec<TrialBalance>> {
        let mut out: Vec<TrialBalance> = self
            .read()?
            .trial_balances
            .values()
            .filter(|t| t.period_id == period_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.generated_on.cmp(&a.generated_on).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn insert_statement(&self, record: &StatementRecord) -> StoreResult<()> {
        self.write()?.statements.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_statement(&self, id: StatementId) -> StoreResult<Option<StatementRecord>> {
        Ok(self.read()?.statements.get(&id).cloned())
    }

    async fn list_statements(&self, period_id: PeriodId) -> StoreResult<Vec<StatementRecord>> {
        let mut out: Vec<StatementRecord> = self
            .read()?
            .statements
            .values()
            .filter(|r| r.period_id == period_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.generated_at.cmp(&a.generated_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn get_settings(&self) -> StoreResult<Option<CompanySettings>> {
        Ok(self.read()?.settings.clone())
    }

    async fn save_settings(&self, settings: &CompanySettings) -> StoreResult<()> {
        self.write()?.settings = Some(settings.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ClientStore for InMemoryStore {
    async fn insert_client(&self, client: &Client) -> StoreResult<()> {
        let mut s = self.write()?;
        if s.clients.values().any(|c| c.code == client.code) {
            return Err(StoreError::conflict(format!(
                "client code {} already exists",
                client.code
            )));
        }
        s.clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn update_client(&self, client: &Client) -> StoreResult<()> {
        let mut s = self.write()?;
        match s.clients.get_mut(&client.id) {
            Some(slot) => {
                *slot = client.clone();
                Ok(())
            }
            None => Err(missing("client", client.id)),
        }
    }

    async fn get_client(&self, id: ClientId) -> StoreResult<Option<Client>> {
        Ok(self.read()?.clients.get(&id).cloned())
    }

    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        Ok(self.read()?.clients.values().cloned().collect())
    }

    async fn client_codes(&self) -> StoreResult<Vec<String>> {
        Ok(self.read()?.clients.values().map(|c| c.code.clone()).collect())
    }

    async fn tax_id_in_use(&self, tax_id: &str, except: Option<ClientId>) -> StoreResult<bool> {
        Ok(self.read()?.clients.values().any(|c| {
            c.is_active() && c.tax_id.as_deref() == Some(tax_id) && Some(c.id) != except
        }))
    }
}

#[async_trait::async_trait]
impl ProductStore for InMemoryStore {
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut s = self.write()?;
        if s.products.values().any(|p| p.code == product.code) {
            return Err(StoreError::conflict(format!(
                "product code {} already exists",
                product.code
            )));
        }
        s.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let mut s = self.write()?;
        match s.products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product.clone();
                Ok(())
            }
            None => Err(missing("product", product.id)),
        }
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn get_product_by_code(&self, code: &str) -> StoreResult<Option<Product>> {
        Ok(self
            .read()?
            .products
            .values()
            .find(|p| p.code == code)
            .cloned())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }
}

#[async_trait::async_trait]
impl InvoiceStore for InMemoryStore {
    async fn create_invoice(&self, series: &str, build: InvoiceBuilder) -> StoreResult<Invoice> {
        let mut s = self.write()?;
        let next = s.sequences.get(series).copied().unwrap_or(0) + 1;
        let (invoice, transaction) = build(format_number(series, next))?;

        if s.invoices.values().any(|i| i.number == invoice.number) {
            return Err(StoreError::conflict(format!(
                "invoice {} already exists",
                invoice.number
            )));
        }
        if let Some(tx) = transaction {
            s.transactions.insert(tx.id, tx);
        }
        s.sequences.insert(series.to_string(), next);
        s.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        Ok(self.read()?.invoices.get(&id).cloned())
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        Ok(self.read()?.invoices.values().cloned().collect())
    }

    async fn record_payment(&self, invoice: &Invoice, payment: Option<&Transaction>) -> StoreResult<()> {
        let mut s = self.write()?;
        let stored = s
            .invoices
            .get(&invoice.id)
            .ok_or_else(|| missing("invoice", invoice.id))?;
        if !stored.status.is_open() {
            return Err(StoreError::conflict(format!(
                "invoice {} is no longer open",
                stored.number
            )));
        }
        if let Some(tx) = payment {
            s.transactions.insert(tx.id, tx.clone());
        }
        s.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn void_invoice(&self, invoice: &Invoice) -> StoreResult<()> {
        let mut s = self.write()?;
        let stored = s
            .invoices
            .get(&invoice.id)
            .ok_or_else(|| missing("invoice", invoice.id))?;
        if stored.status == InvoiceStatus::Voided {
            return Err(StoreError::conflict(format!(
                "invoice {} is already voided",
                stored.number
            )));
        }
        for tx_id in &invoice.transaction_ids {
            if let Some(tx) = s.transactions.get_mut(tx_id) {
                tx.status = TransactionStatus::Voided;
            }
        }
        s.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn mark_overdue(&self, as_of: NaiveDate, now: DateTime<Utc>) -> StoreResult<Vec<Invoice>> {
        let mut s = self.write()?;
        let mut changed = Vec::new();
        for invoice in s.invoices.values_mut() {
            if invoice.mark_overdue(as_of, now) {
                changed.push(invoice.clone());
            }
        }
        changed.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(changed)
    }

    async fn get_invoicing_settings(&self) -> StoreResult<Option<InvoicingSettings>> {
        Ok(self.read()?.invoicing_settings.clone())
    }

    async fn save_invoicing_settings(&self, settings: &InvoicingSettings) -> StoreResult<()> {
        self.write()?.invoicing_settings = Some(settings.clone());
        Ok(())
    }
}
