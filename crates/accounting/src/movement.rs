//! Aggregated ledger rows produced by the store and consumed by the reports.
//!
//! Movements always cover posted transactions plus active adjusting entries.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use contaflow_core::{AccountId, DomainError, DomainResult};

use crate::account::AccountKind;

/// Where a ledger line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Transaction,
    Adjustment,
}

impl EntrySource {
    pub fn as_str(self) -> &'static str {
        match self {
            EntrySource::Transaction => "transaction",
            EntrySource::Adjustment => "adjustment",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "transaction" => Ok(EntrySource::Transaction),
            "adjustment" => Ok(EntrySource::Adjustment),
            other => Err(DomainError::validation(format!("unknown entry source '{other}'"))),
        }
    }

    /// Prefix used when an entry carries no reference of its own.
    pub fn reference_prefix(self) -> &'static str {
        match self {
            EntrySource::Transaction => "ASIENTO",
            EntrySource::Adjustment => "AJUSTE",
        }
    }
}

/// Debit/credit totals and line count for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMovement {
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub line_count: i64,
}

impl AccountMovement {
    pub fn empty(account_id: AccountId) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
            line_count: 0,
        }
    }
}

/// Index movements by account.
pub fn by_account(movements: Vec<AccountMovement>) -> HashMap<AccountId, AccountMovement> {
    let mut out: HashMap<AccountId, AccountMovement> = HashMap::new();
    for m in movements {
        let entry = out
            .entry(m.account_id)
            .or_insert_with(|| AccountMovement::empty(m.account_id));
        entry.debit += m.debit;
        entry.credit += m.credit;
        entry.line_count += m.line_count;
    }
    out
}

/// Movements of one account under one category (transaction category or
/// adjustment kind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMovement {
    pub account_id: AccountId,
    pub category: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Debit/credit totals of a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    pub source: EntrySource,
    pub entry_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// One posted line with its entry header, as read for the general ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedLine {
    pub source: EntrySource,
    pub entry_id: Uuid,
    pub line_id: Uuid,
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub reference: Option<String>,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Closing balance in normal-side terms.
///
/// Debit-normal: opening + debit − credit. Credit-normal: opening + credit − debit.
pub fn closing_balance(kind: AccountKind, opening: Decimal, debit: Decimal, credit: Decimal) -> Decimal {
    if kind.is_debit_normal() {
        opening + debit - credit
    } else {
        opening + credit - debit
    }
}

/// Split a normal-side balance into `(debit column, credit column)`.
///
/// Positive balances go to the normal column, negative ones to the opposite
/// column as an absolute value.
pub fn place_in_columns(kind: AccountKind, closing: Decimal) -> (Decimal, Decimal) {
    let positive = closing >= Decimal::ZERO;
    match (kind.is_debit_normal(), positive) {
        (true, true) => (closing, Decimal::ZERO),
        (true, false) => (Decimal::ZERO, closing.abs()),
        (false, true) => (Decimal::ZERO, closing),
        (false, false) => (closing.abs(), Decimal::ZERO),
    }
}
