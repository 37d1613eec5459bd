//! Accounting tables: chart, periods, journal, openings, adjustments, reports.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use tracing::{Span, instrument};
use uuid::Uuid;

use contaflow_accounting::{
    Account, AccountKind, AccountManual, AccountMovement, AccountStatus, Adjustment, AdjustmentLine,
    AdjustmentStatus, BalanceClassification, BalanceStatus, CategoryMovement, CompanySettings,
    EntrySource, EntryTotals, JournalLine, LedgerQuery, OpeningBalance, OpeningStatus, Period,
    PeriodKind, PeriodStatus, PostedLine, Side, StatementKind, StatementRecord, Transaction,
    TransactionKind, TransactionStatus, TrialBalance,
};
use contaflow_core::{
    AccountId, AdjustmentId, JournalLineId, ManualId, OpeningBalanceId, PeriodId, StatementId,
    TransactionId, TrialBalanceId,
};

use super::{PostgresStore, col, enum_col, expect_one, map_sqlx_error};
use crate::error::{StoreError, StoreResult};
use crate::store::{
    AccountStore, AdjustmentStore, JournalStore, LedgerStore, OpeningStore, PeriodStore,
    ReportStore,
};

fn account_from_row(row: &PgRow) -> StoreResult<Account> {
    Ok(Account {
        id: AccountId::from_uuid(col(row, "id")?),
        code: col(row, "code")?,
        name: col(row, "name")?,
        kind: enum_col(row, "kind", AccountKind::parse)?,
        parent_id: col::<Option<Uuid>>(row, "parent_id")?.map(AccountId::from_uuid),
        level: col(row, "level")?,
        accepts_postings: col(row, "accepts_postings")?,
        status: enum_col(row, "status", AccountStatus::parse)?,
        created_at: col(row, "created_at")?,
    })
}

fn manual_from_row(row: &PgRow) -> StoreResult<AccountManual> {
    let classification = match col::<Option<String>>(row, "classification")? {
        Some(raw) => Some(
            BalanceClassification::parse(&raw)
                .map_err(|e| StoreError::Serialization(format!("column classification: {e}")))?,
        ),
        None => None,
    };
    Ok(AccountManual {
        id: ManualId::from_uuid(col(row, "id")?),
        account_id: AccountId::from_uuid(col(row, "account_id")?),
        description: col(row, "description")?,
        nature: enum_col(row, "nature", Side::parse)?,
        classification,
        usage: col(row, "usage")?,
        examples: col(row, "examples")?,
        related_accounts: col(row, "related_accounts")?,
        regulation: col(row, "regulation")?,
        updated_by: col(row, "updated_by")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn period_from_row(row: &PgRow) -> StoreResult<Period> {
    Ok(Period {
        id: PeriodId::from_uuid(col(row, "id")?),
        start_date: col(row, "start_date")?,
        end_date: col(row, "end_date")?,
        kind: enum_col(row, "kind", PeriodKind::parse)?,
        status: enum_col(row, "status", PeriodStatus::parse)?,
        description: col(row, "description")?,
        created_at: col(row, "created_at")?,
    })
}

fn transaction_from_row(row: &PgRow, lines: Vec<JournalLine>) -> StoreResult<Transaction> {
    Ok(Transaction {
        id: TransactionId::from_uuid(col(row, "id")?),
        date: col(row, "date")?,
        description: col(row, "description")?,
        kind: enum_col(row, "kind", TransactionKind::parse)?,
        category: col(row, "category")?,
        currency: col(row, "currency")?,
        period_id: PeriodId::from_uuid(col(row, "period_id")?),
        reference: col(row, "reference")?,
        notes: col(row, "notes")?,
        created_by: col(row, "created_by")?,
        status: enum_col(row, "status", TransactionStatus::parse)?,
        created_at: col(row, "created_at")?,
        lines,
    })
}

fn opening_from_row(row: &PgRow) -> StoreResult<OpeningBalance> {
    Ok(OpeningBalance {
        id: OpeningBalanceId::from_uuid(col(row, "id")?),
        period_id: PeriodId::from_uuid(col(row, "period_id")?),
        account_id: AccountId::from_uuid(col(row, "account_id")?),
        amount: col(row, "amount")?,
        side: enum_col(row, "side", Side::parse)?,
        notes: col(row, "notes")?,
        status: enum_col(row, "status", OpeningStatus::parse)?,
        created_by: col(row, "created_by")?,
        updated_by: col(row, "updated_by")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn adjustment_from_row(row: &PgRow, lines: Vec<AdjustmentLine>) -> StoreResult<Adjustment> {
    Ok(Adjustment {
        id: AdjustmentId::from_uuid(col(row, "id")?),
        number: col(row, "number")?,
        date: col(row, "date")?,
        description: col(row, "description")?,
        kind: col(row, "kind")?,
        reason: col(row, "reason")?,
        period_id: PeriodId::from_uuid(col(row, "period_id")?),
        status: enum_col(row, "status", AdjustmentStatus::parse)?,
        approved_by: col(row, "approved_by")?,
        approved_at: col(row, "approved_at")?,
        voided_by: col(row, "voided_by")?,
        voided_at: col(row, "voided_at")?,
        created_by: col(row, "created_by")?,
        created_at: col(row, "created_at")?,
        lines,
    })
}

fn trial_balance_from_row(row: &PgRow) -> StoreResult<TrialBalance> {
    Ok(TrialBalance {
        id: TrialBalanceId::from_uuid(col(row, "id")?),
        period_id: PeriodId::from_uuid(col(row, "period_id")?),
        generated_on: col(row, "generated_on")?,
        until: col(row, "cutoff_date")?,
        status: enum_col(row, "status", BalanceStatus::parse)?,
        totals: serde_json::from_value(col(row, "totals")?)?,
        rows: serde_json::from_value(col(row, "row_data")?)?,
        generated_by: col(row, "generated_by")?,
    })
}

fn statement_from_row(row: &PgRow) -> StoreResult<StatementRecord> {
    Ok(StatementRecord {
        id: StatementId::from_uuid(col(row, "id")?),
        period_id: PeriodId::from_uuid(col(row, "period_id")?),
        kind: enum_col(row, "kind", StatementKind::parse)?,
        content: col(row, "content")?,
        summary: serde_json::from_value(col(row, "summary")?)?,
        generated_by: col(row, "generated_by")?,
        generated_at: col(row, "generated_at")?,
    })
}

impl PostgresStore {
    async fn journal_lines_for(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<JournalLine>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, transaction_id, account_id, debit, credit, description
            FROM journal_lines
            WHERE transaction_id = ANY($1)
            ORDER BY transaction_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("load_journal_lines", e))?;

        let mut out: HashMap<Uuid, Vec<JournalLine>> = HashMap::new();
        for row in &rows {
            let owner: Uuid = col(row, "transaction_id")?;
            out.entry(owner).or_default().push(JournalLine {
                id: JournalLineId::from_uuid(col(row, "id")?),
                account_id: AccountId::from_uuid(col(row, "account_id")?),
                debit: col(row, "debit")?,
                credit: col(row, "credit")?,
                description: col(row, "description")?,
            });
        }
        Ok(out)
    }

    async fn adjustment_lines_for(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<AdjustmentLine>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, adjustment_id, account_id, debit, credit, description
            FROM adjustment_lines
            WHERE adjustment_id = ANY($1)
            ORDER BY adjustment_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("load_adjustment_lines", e))?;

        let mut out: HashMap<Uuid, Vec<AdjustmentLine>> = HashMap::new();
        for row in &rows {
            let owner: Uuid = col(row, "adjustment_id")?;
            out.entry(owner).or_default().push(AdjustmentLine {
                id: JournalLineId::from_uuid(col(row, "id")?),
                account_id: AccountId::from_uuid(col(row, "account_id")?),
                debit: col(row, "debit")?,
                credit: col(row, "credit")?,
                description: col(row, "description")?,
            });
        }
        Ok(out)
    }

    async fn transactions_from_rows(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Transaction>> {
        let ids = rows
            .iter()
            .map(|r| col::<Uuid>(r, "id"))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut lines = self.journal_lines_for(&ids).await?;
        rows.iter()
            .zip(&ids)
            .map(|(row, id)| transaction_from_row(row, lines.remove(id).unwrap_or_default()))
            .collect()
    }

    async fn adjustments_from_rows(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Adjustment>> {
        let ids = rows
            .iter()
            .map(|r| col::<Uuid>(r, "id"))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut lines = self.adjustment_lines_for(&ids).await?;
        rows.iter()
            .zip(&ids)
            .map(|(row, id)| adjustment_from_row(row, lines.remove(id).unwrap_or_default()))
            .collect()
    }
}

pub(crate) async fn insert_transaction_in(
    db: &mut sqlx::PgConnection,
    transaction: &Transaction,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, date, description, kind, category, currency, period_id,
            reference, notes, created_by, status, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(transaction.id.as_uuid())
    .bind(transaction.date)
    .bind(&transaction.description)
    .bind(transaction.kind.as_str())
    .bind(&transaction.category)
    .bind(&transaction.currency)
    .bind(transaction.period_id.as_uuid())
    .bind(&transaction.reference)
    .bind(&transaction.notes)
    .bind(&transaction.created_by)
    .bind(transaction.status.as_str())
    .bind(transaction.created_at)
    .execute(&mut *db)
    .await
    .map_err(|e| map_sqlx_error("insert_transaction", e))?;

    for (position, line) in transaction.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO journal_lines (id, transaction_id, position, account_id, debit, credit, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(line.id.as_uuid())
        .bind(transaction.id.as_uuid())
        .bind(position as i32)
        .bind(line.account_id.as_uuid())
        .bind(line.debit)
        .bind(line.credit)
        .bind(&line.description)
        .execute(&mut *db)
        .await
        .map_err(|e| map_sqlx_error("insert_journal_line", e))?;
    }
    Ok(())
}

async fn insert_opening_in(db: &mut sqlx::PgConnection, balance: &OpeningBalance) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO opening_balances (
            id, period_id, account_id, amount, side, notes, status,
            created_by, updated_by, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(balance.id.as_uuid())
    .bind(balance.period_id.as_uuid())
    .bind(balance.account_id.as_uuid())
    .bind(balance.amount)
    .bind(balance.side.as_str())
    .bind(&balance.notes)
    .bind(balance.status.as_str())
    .bind(&balance.created_by)
    .bind(&balance.updated_by)
    .bind(balance.created_at)
    .bind(balance.updated_at)
    .execute(&mut *db)
    .await
    .map_err(|e| map_sqlx_error("insert_opening_balance", e))?;
    Ok(())
}

#[async_trait::async_trait]
impl AccountStore for PostgresStore {
    #[instrument(skip(self, account), fields(code = %account.code), err)]
    async fn insert_account(&self, account: &Account) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, code, name, kind, parent_id, level, accepts_postings, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.kind.as_str())
        .bind(account.parent_id.map(Uuid::from))
        .bind(account.level)
        .bind(account.accepts_postings)
        .bind(account.status.as_str())
        .bind(account.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;
        Ok(())
    }

    #[instrument(skip(self, account), fields(account_id = %account.id), err)]
    async fn update_account(&self, account: &Account) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = $2, kind = $3, parent_id = $4, level = $5, accepts_postings = $6, status = $7
            WHERE id = $1
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.name)
        .bind(account.kind.as_str())
        .bind(account.parent_id.map(Uuid::from))
        .bind(account.level)
        .bind(account.accepts_postings)
        .bind(account.status.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_account", e))?;
        expect_one(result.rows_affected(), "account")
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn delete_account(&self, id: AccountId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_account", e))?;
        expect_one(result.rows_affected(), "account")
    }

    async fn get_account(&self, id: AccountId) -> StoreResult<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, kind, parent_id, level, accepts_postings, status, created_at
            FROM accounts WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_account", e))?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, kind, parent_id, level, accepts_postings, status, created_at
            FROM accounts ORDER BY code
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_accounts", e))?;
        rows.iter().map(account_from_row).collect()
    }

    async fn account_has_children(&self, id: AccountId) -> StoreResult<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM accounts WHERE parent_id = $1) AS found")
            .bind(id.as_uuid())
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_sqlx_error("account_has_children", e))?;
        col(&row, "found")
    }

    async fn account_has_postings(&self, id: AccountId) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (SELECT 1 FROM journal_lines WHERE account_id = $1)
                OR EXISTS (SELECT 1 FROM adjustment_lines WHERE account_id = $1) AS found
            "#,
        )
        .bind(id.as_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("account_has_postings", e))?;
        col(&row, "found")
    }

    async fn get_manual(&self, account_id: AccountId) -> StoreResult<Option<AccountManual>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, description, nature, classification, usage, examples,
                   related_accounts, regulation, updated_by, created_at, updated_at
            FROM account_manuals WHERE account_id = $1
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_manual", e))?;
        row.as_ref().map(manual_from_row).transpose()
    }

    #[instrument(skip(self, manual), fields(account_id = %manual.account_id), err)]
    async fn insert_manual(&self, manual: &AccountManual) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO account_manuals (
                id, account_id, description, nature, classification, usage, examples,
                related_accounts, regulation, updated_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(manual.id.as_uuid())
        .bind(manual.account_id.as_uuid())
        .bind(&manual.description)
        .bind(manual.nature.as_str())
        .bind(manual.classification.map(BalanceClassification::as_str))
        .bind(&manual.usage)
        .bind(&manual.examples)
        .bind(&manual.related_accounts)
        .bind(&manual.regulation)
        .bind(&manual.updated_by)
        .bind(manual.created_at)
        .bind(manual.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_manual", e))?;
        Ok(())
    }

    #[instrument(skip(self, manual), fields(account_id = %manual.account_id), err)]
    async fn update_manual(&self, manual: &AccountManual) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE account_manuals
            SET description = $2, nature = $3, classification = $4, usage = $5, examples = $6,
                related_accounts = $7, regulation = $8, updated_by = $9, updated_at = $10
            WHERE account_id = $1
            "#,
        )
        .bind(manual.account_id.as_uuid())
        .bind(&manual.description)
        .bind(manual.nature.as_str())
        .bind(manual.classification.map(BalanceClassification::as_str))
        .bind(&manual.usage)
        .bind(&manual.examples)
        .bind(&manual.related_accounts)
        .bind(&manual.regulation)
        .bind(&manual.updated_by)
        .bind(manual.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_manual", e))?;
        expect_one(result.rows_affected(), "account manual")
    }

    #[instrument(skip(self), fields(account_id = %account_id), err)]
    async fn delete_manual(&self, account_id: AccountId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM account_manuals WHERE account_id = $1")
            .bind(account_id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_manual", e))?;
        expect_one(result.rows_affected(), "account manual")
    }

    async fn manual_classifications(&self) -> StoreResult<HashMap<AccountId, BalanceClassification>> {
        let rows = sqlx::query(
            "SELECT account_id, classification FROM account_manuals WHERE classification IS NOT NULL",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("manual_classifications", e))?;
        rows.iter()
            .map(|row| {
                Ok((
                    AccountId::from_uuid(col(row, "account_id")?),
                    enum_col(row, "classification", BalanceClassification::parse)?,
                ))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl PeriodStore for PostgresStore {
    #[instrument(skip(self, period), fields(period_id = %period.id), err)]
    async fn insert_period(&self, period: &Period) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO periods (id, start_date, end_date, kind, status, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(period.id.as_uuid())
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(period.kind.as_str())
        .bind(period.status.as_str())
        .bind(&period.description)
        .bind(period.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_period", e))?;
        Ok(())
    }

    #[instrument(skip(self, period), fields(period_id = %period.id), err)]
    async fn update_period(&self, period: &Period) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE periods
            SET start_date = $2, end_date = $3, kind = $4, status = $5, description = $6
            WHERE id = $1
            "#,
        )
        .bind(period.id.as_uuid())
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(period.kind.as_str())
        .bind(period.status.as_str())
        .bind(&period.description)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_period", e))?;
        expect_one(result.rows_affected(), "period")
    }

    async fn get_period(&self, id: PeriodId) -> StoreResult<Option<Period>> {
        let row = sqlx::query(
            "SELECT id, start_date, end_date, kind, status, description, created_at FROM periods WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_period", e))?;
        row.as_ref().map(period_from_row).transpose()
    }

    async fn list_periods(&self) -> StoreResult<Vec<Period>> {
        let rows = sqlx::query(
            r#"
            SELECT id, start_date, end_date, kind, status, description, created_at
            FROM periods ORDER BY start_date DESC, id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_periods", e))?;
        rows.iter().map(period_from_row).collect()
    }
}

#[async_trait::async_trait]
impl JournalStore for PostgresStore {
    #[instrument(
        skip(self, transaction),
        fields(transaction_id = %transaction.id, lines = transaction.lines.len()),
        err
    )]
    async fn insert_transaction(&self, transaction: &Transaction) -> StoreResult<()> {
        let mut db = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        insert_transaction_in(&mut db, transaction).await?;
        db.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    async fn get_transaction(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, description, kind, category, currency, period_id, reference, notes,
                   created_by, status, created_at
            FROM transactions WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_transaction", e))?;
        Ok(self.transactions_from_rows(rows).await?.into_iter().next())
    }

    async fn list_transactions(&self, period_id: Option<PeriodId>) -> StoreResult<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, date, description, kind, category, currency, period_id, reference, notes,
                   created_by, status, created_at
            FROM transactions
            WHERE ($1::uuid IS NULL OR period_id = $1)
            ORDER BY date, id
            "#,
        )
        .bind(period_id.map(Uuid::from))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_transactions", e))?;
        self.transactions_from_rows(rows).await
    }

    #[instrument(skip(self), fields(transaction_id = %id, status = status.as_str()), err)]
    async fn set_transaction_status(&self, id: TransactionId, status: TransactionStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE transactions SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("set_transaction_status", e))?;
        expect_one(result.rows_affected(), "transaction")
    }
}

#[async_trait::async_trait]
impl OpeningStore for PostgresStore {
    #[instrument(skip(self, balance), fields(period_id = %balance.period_id, account_id = %balance.account_id), err)]
    async fn insert_opening_balance(&self, balance: &OpeningBalance) -> StoreResult<()> {
        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire_connection", e))?;
        insert_opening_in(&mut conn, balance).await
    }

    #[instrument(skip(self, balances), fields(count = balances.len()), err)]
    async fn insert_opening_balances(&self, balances: &[OpeningBalance]) -> StoreResult<()> {
        let mut db = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        for balance in balances {
            insert_opening_in(&mut db, balance).await?;
        }
        db.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, balance), fields(opening_id = %balance.id), err)]
    async fn update_opening_balance(&self, balance: &OpeningBalance) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE opening_balances
            SET amount = $2, side = $3, notes = $4, status = $5, updated_by = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(balance.id.as_uuid())
        .bind(balance.amount)
        .bind(balance.side.as_str())
        .bind(&balance.notes)
        .bind(balance.status.as_str())
        .bind(&balance.updated_by)
        .bind(balance.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_opening_balance", e))?;
        expect_one(result.rows_affected(), "opening balance")
    }

    async fn get_opening_balance(&self, id: OpeningBalanceId) -> StoreResult<Option<OpeningBalance>> {
        let row = sqlx::query(
            r#"
            SELECT id, period_id, account_id, amount, side, notes, status, created_by, updated_by,
                   created_at, updated_at
            FROM opening_balances WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_opening_balance", e))?;
        row.as_ref().map(opening_from_row).transpose()
    }

    async fn list_opening_balances(&self, period_id: PeriodId) -> StoreResult<Vec<OpeningBalance>> {
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.period_id, o.account_id, o.amount, o.side, o.notes, o.status,
                   o.created_by, o.updated_by, o.created_at, o.updated_at
            FROM opening_balances o
            JOIN accounts a ON a.id = o.account_id
            WHERE o.period_id = $1
            ORDER BY a.code, o.created_at
            "#,
        )
        .bind(period_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_opening_balances", e))?;
        rows.iter().map(opening_from_row).collect()
    }

    #[instrument(skip(self, now), fields(period_id = %period_id), err)]
    async fn deactivate_opening_balances(
        &self,
        period_id: PeriodId,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE opening_balances
            SET status = 'inactive', updated_by = $2, updated_at = $3
            WHERE period_id = $1 AND status = 'active'
            "#,
        )
        .bind(period_id.as_uuid())
        .bind(updated_by)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("deactivate_opening_balances", e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl AdjustmentStore for PostgresStore {
    #[instrument(skip(self, adjustment), fields(number = %adjustment.number), err)]
    async fn insert_adjustment(&self, adjustment: &Adjustment) -> StoreResult<()> {
        let mut db = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO adjustments (
                id, number, date, description, kind, reason, period_id, status,
                approved_by, approved_at, voided_by, voided_at, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(adjustment.id.as_uuid())
        .bind(&adjustment.number)
        .bind(adjustment.date)
        .bind(&adjustment.description)
        .bind(&adjustment.kind)
        .bind(&adjustment.reason)
        .bind(adjustment.period_id.as_uuid())
        .bind(adjustment.status.as_str())
        .bind(&adjustment.approved_by)
        .bind(adjustment.approved_at)
        .bind(&adjustment.voided_by)
        .bind(adjustment.voided_at)
        .bind(&adjustment.created_by)
        .bind(adjustment.created_at)
        .execute(&mut *db)
        .await
        .map_err(|e| map_sqlx_error("insert_adjustment", e))?;

        for (position, line) in adjustment.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO adjustment_lines (id, adjustment_id, position, account_id, debit, credit, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(adjustment.id.as_uuid())
            .bind(position as i32)
            .bind(line.account_id.as_uuid())
            .bind(line.debit)
            .bind(line.credit)
            .bind(&line.description)
            .execute(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("insert_adjustment_line", e))?;
        }

        db.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, adjustment), fields(adjustment_id = %adjustment.id), err)]
    async fn update_adjustment(&self, adjustment: &Adjustment) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE adjustments
            SET date = $2, description = $3, kind = $4, reason = $5, status = $6,
                approved_by = $7, approved_at = $8, voided_by = $9, voided_at = $10
            WHERE id = $1
            "#,
        )
        .bind(adjustment.id.as_uuid())
        .bind(adjustment.date)
        .bind(&adjustment.description)
        .bind(&adjustment.kind)
        .bind(&adjustment.reason)
        .bind(adjustment.status.as_str())
        .bind(&adjustment.approved_by)
        .bind(adjustment.approved_at)
        .bind(&adjustment.voided_by)
        .bind(adjustment.voided_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_adjustment", e))?;
        expect_one(result.rows_affected(), "adjusting entry")
    }

    async fn get_adjustment(&self, id: AdjustmentId) -> StoreResult<Option<Adjustment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, number, date, description, kind, reason, period_id, status, approved_by,
                   approved_at, voided_by, voided_at, created_by, created_at
            FROM adjustments WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_adjustment", e))?;
        Ok(self.adjustments_from_rows(rows).await?.into_iter().next())
    }

    async fn list_adjustments(&self, period_id: Option<PeriodId>) -> StoreResult<Vec<Adjustment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, number, date, description, kind, reason, period_id, status, approved_by,
                   approved_at, voided_by, voided_at, created_by, created_at
            FROM adjustments
            WHERE ($1::uuid IS NULL OR period_id = $1)
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(period_id.map(Uuid::from))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_adjustments", e))?;
        self.adjustments_from_rows(rows).await
    }

    async fn adjustment_numbers(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT number FROM adjustments")
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("adjustment_numbers", e))?;
        rows.iter().map(|r| col(r, "number")).collect()
    }
}

#[async_trait::async_trait]
impl LedgerStore for PostgresStore {
    #[instrument(skip(self), fields(period_id = %period_id, accounts = tracing::field::Empty), err)]
    async fn account_movements(&self, period_id: PeriodId, until: NaiveDate) -> StoreResult<Vec<AccountMovement>> {
        let rows = sqlx::query(
            r#"
            SELECT account_id,
                   COALESCE(SUM(debit), 0) AS debit,
                   COALESCE(SUM(credit), 0) AS credit,
                   COUNT(*) AS line_count
            FROM ledger_lines
            WHERE period_id = $1 AND date <= $2
            GROUP BY account_id
            "#,
        )
        .bind(period_id.as_uuid())
        .bind(until)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("account_movements", e))?;

        Span::current().record("accounts", rows.len());
        rows.iter()
            .map(|row| {
                Ok(AccountMovement {
                    account_id: AccountId::from_uuid(col(row, "account_id")?),
                    debit: col(row, "debit")?,
                    credit: col(row, "credit")?,
                    line_count: col(row, "line_count")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(period_id = %period_id), err)]
    async fn category_movements(&self, period_id: PeriodId) -> StoreResult<Vec<CategoryMovement>> {
        let rows = sqlx::query(
            r#"
            SELECT account_id, category,
                   COALESCE(SUM(debit), 0) AS debit,
                   COALESCE(SUM(credit), 0) AS credit
            FROM ledger_lines
            WHERE period_id = $1
            GROUP BY account_id, category
            "#,
        )
        .bind(period_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("category_movements", e))?;

        rows.iter()
            .map(|row| {
                Ok(CategoryMovement {
                    account_id: AccountId::from_uuid(col(row, "account_id")?),
                    category: col(row, "category")?,
                    debit: col(row, "debit")?,
                    credit: col(row, "credit")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(period_id = %period_id), err)]
    async fn entry_totals(&self, period_id: PeriodId, until: NaiveDate) -> StoreResult<Vec<EntryTotals>> {
        let rows = sqlx::query(
            r#"
            SELECT source, entry_id, date, description,
                   COALESCE(SUM(debit), 0) AS debit,
                   COALESCE(SUM(credit), 0) AS credit
            FROM ledger_lines
            WHERE period_id = $1 AND date <= $2
            GROUP BY source, entry_id, date, description
            ORDER BY date, entry_id
            "#,
        )
        .bind(period_id.as_uuid())
        .bind(until)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("entry_totals", e))?;

        rows.iter()
            .map(|row| {
                Ok(EntryTotals {
                    source: enum_col(row, "source", EntrySource::parse)?,
                    entry_id: col(row, "entry_id")?,
                    date: col(row, "date")?,
                    description: col(row, "description")?,
                    debit: col(row, "debit")?,
                    credit: col(row, "credit")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self, query), err)]
    async fn posted_lines(&self, query: &LedgerQuery) -> StoreResult<Vec<PostedLine>> {
        let rows = sqlx::query(
            r#"
            SELECT source, entry_id, line_id, account_id, date, reference, description, debit, credit
            FROM ledger_lines
            WHERE ($1::uuid IS NULL OR account_id = $1)
              AND ($2::uuid IS NULL OR period_id = $2)
              AND ($3::date IS NULL OR date >= $3)
              AND ($4::date IS NULL OR date <= $4)
            ORDER BY date, entry_id, position
            "#,
        )
        .bind(query.account_id.map(Uuid::from))
        .bind(query.period_id.map(Uuid::from))
        .bind(query.from)
        .bind(query.to)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("posted_lines", e))?;

        rows.iter()
            .map(|row| {
                Ok(PostedLine {
                    source: enum_col(row, "source", EntrySource::parse)?,
                    entry_id: col(row, "entry_id")?,
                    line_id: col(row, "line_id")?,
                    account_id: AccountId::from_uuid(col(row, "account_id")?),
                    date: col(row, "date")?,
                    reference: col(row, "reference")?,
                    description: col(row, "description")?,
                    debit: col(row, "debit")?,
                    credit: col(row, "credit")?,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ReportStore for PostgresStore {
    #[instrument(skip(self, trial_balance), fields(period_id = %trial_balance.period_id), err)]
    async fn insert_trial_balance(&self, trial_balance: &TrialBalance) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO trial_balances (id, period_id, generated_on, cutoff_date, status, totals, row_data, generated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(trial_balance.id.as_uuid())
        .bind(trial_balance.period_id.as_uuid())
        .bind(trial_balance.generated_on)
        .bind(trial_balance.until)
        .bind(trial_balance.status.as_str())
        .bind(serde_json::to_value(&trial_balance.totals)?)
        .bind(serde_json::to_value(&trial_balance.rows)?)
        .bind(&trial_balance.generated_by)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_trial_balance", e))?;
        Ok(())
    }

    async fn get_trial_balance(&self, id: TrialBalanceId) -> StoreResult<Option<TrialBalance>> {
        let row = sqlx::query(
            r#"
            SELECT id, period_id, generated_on, cutoff_date, status, totals, row_data, generated_by
            FROM trial_balances WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_trial_balance", e))?;
        row.as_ref().map(trial_balance_from_row).transpose()
    }

    async fn list_trial_balances(&self, period_id: PeriodId) -> StoreResult<Vec<TrialBalance>> {
        let rows = sqlx::query(
            r#"
            SELECT id, period_id, generated_on, cutoff_date, status, totals, row_data, generated_by
            FROM trial_balances WHERE period_id = $1
            ORDER BY generated_on DESC, id DESC
            "#,
        )
        .bind(period_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_trial_balances", e))?;
        rows.iter().map(trial_balance_from_row).collect()
    }

    #[instrument(skip(self, record), fields(period_id = %record.period_id, kind = record.kind.as_str()), err)]
    async fn insert_statement(&self, record: &StatementRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO statements (id, period_id, kind, content, summary, generated_by, generated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.period_id.as_uuid())
        .bind(record.kind.as_str())
        .bind(&record.content)
        .bind(serde_json::to_value(&record.summary)?)
        .bind(&record.generated_by)
        .bind(record.generated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_statement", e))?;
        Ok(())
    }

    async fn get_statement(&self, id: StatementId) -> StoreResult<Option<StatementRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, period_id, kind, content, summary, generated_by, generated_at
            FROM statements WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_statement", e))?;
        row.as_ref().map(statement_from_row).transpose()
    }

    async fn list_statements(&self, period_id: PeriodId) -> StoreResult<Vec<StatementRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, period_id, kind, content, summary, generated_by, generated_at
            FROM statements WHERE period_id = $1
            ORDER BY generated_at DESC, id DESC
            "#,
        )
        .bind(period_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_statements", e))?;
        rows.iter().map(statement_from_row).collect()
    }

    async fn get_settings(&self) -> StoreResult<Option<CompanySettings>> {
        let row = sqlx::query(
            "SELECT name, tax_id, address, phone, email, currency, updated_at FROM company_settings WHERE id = 1",
        )
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_settings", e))?;
        row.as_ref()
            .map(|row| {
                Ok(CompanySettings {
                    name: col(row, "name")?,
                    tax_id: col(row, "tax_id")?,
                    address: col(row, "address")?,
                    phone: col(row, "phone")?,
                    email: col(row, "email")?,
                    currency: col(row, "currency")?,
                    updated_at: col(row, "updated_at")?,
                })
            })
            .transpose()
    }

    #[instrument(skip(self, settings), err)]
    async fn save_settings(&self, settings: &CompanySettings) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO company_settings (id, name, tax_id, address, phone, email, currency, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                tax_id = EXCLUDED.tax_id,
                address = EXCLUDED.address,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                currency = EXCLUDED.currency,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&settings.name)
        .bind(&settings.tax_id)
        .bind(&settings.address)
        .bind(&settings.phone)
        .bind(&settings.email)
        .bind(&settings.currency)
        .bind(settings.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("save_settings", e))?;
        Ok(())
    }
}
