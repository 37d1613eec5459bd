//! General ledger: chronological postings per account with running balance.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use contaflow_core::{AccountId, PeriodId};

use crate::account::{Account, AccountKind, Side};
use crate::movement::{EntrySource, PostedLine};

/// Selection of postings for one account or one period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerQuery {
    pub account_id: Option<AccountId>,
    pub period_id: Option<PeriodId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl LedgerQuery {
    pub fn includes_date(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|f| date >= f) && self.to.is_none_or(|t| date <= t)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub source: EntrySource,
    pub entry_id: Uuid,
    pub reference: String,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub previous_balance: Decimal,
    pub balance: Decimal,
    /// Column the running balance sits in.
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLedger {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub opening: Decimal,
    pub entries: Vec<LedgerEntry>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub final_balance: Decimal,
    pub side: Side,
}

/// Build the ledger of one account. `lines` may be unordered and may contain
/// lines of other accounts, which are ignored.
pub fn account_ledger(account: &Account, opening: Decimal, lines: &[PostedLine]) -> AccountLedger {
    let mut own: Vec<&PostedLine> = lines.iter().filter(|l| l.account_id == account.id).collect();
    own.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.entry_id.cmp(&b.entry_id))
            .then(a.line_id.cmp(&b.line_id))
    });

    let debit_normal = account.kind.is_debit_normal();
    let mut balance = opening;
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;
    let mut entries = Vec::with_capacity(own.len());

    for line in own {
        let previous_balance = balance;
        balance += if debit_normal {
            line.debit - line.credit
        } else {
            line.credit - line.debit
        };
        total_debit += line.debit;
        total_credit += line.credit;

        let reference = line
            .reference
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("{}-{}", line.source.reference_prefix(), line.entry_id));

        entries.push(LedgerEntry {
            date: line.date,
            source: line.source,
            entry_id: line.entry_id,
            reference,
            description: line.description.clone(),
            debit: line.debit,
            credit: line.credit,
            previous_balance,
            balance,
            side: account.kind.balance_side(balance),
        });
    }

    AccountLedger {
        account_id: account.id,
        code: account.code.clone(),
        name: account.name.clone(),
        kind: account.kind,
        opening,
        entries,
        total_debit,
        total_credit,
        final_balance: balance,
        side: account.kind.balance_side(balance),
    }
}

/// `opening` advanced by the account's lines in `earlier`.
///
/// Used when a ledger starts after the first posting it could show, so the
/// first entry's previous balance includes the skipped movements.
pub fn roll_forward(account: &Account, opening: Decimal, earlier: &[PostedLine]) -> Decimal {
    earlier
        .iter()
        .filter(|l| l.account_id == account.id)
        .fold(opening, |balance, l| {
            if account.kind.is_debit_normal() {
                balance + l.debit - l.credit
            } else {
                balance + l.credit - l.debit
            }
        })
}

/// Ledgers of every account with at least one posting, ordered by code.
pub fn period_ledger(
    accounts: &[Account],
    openings: &HashMap<AccountId, Decimal>,
    lines: &[PostedLine],
) -> Vec<AccountLedger> {
    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));

    sorted
        .into_iter()
        .filter(|a| lines.iter().any(|l| l.account_id == a.id))
        .map(|a| {
            let opening = openings.get(&a.id).copied().unwrap_or(Decimal::ZERO);
            account_ledger(a, opening, lines)
        })
        .collect()
}
