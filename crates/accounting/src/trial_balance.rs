//! Trial balance: per-account opening, movements and closing balance for a
//! period up to a cut-off date.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use contaflow_core::{
    AccountId, DomainError, DomainResult, PeriodId, TrialBalanceId, round_money, within_tolerance,
};

use crate::account::{Account, AccountKind};
use crate::movement::{
    AccountMovement, EntrySource, EntryTotals, closing_balance, place_in_columns,
};
use crate::period::Period;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    Balanced,
    Unbalanced,
}

impl BalanceStatus {
    pub fn from_differences(movement: Decimal, balance: Decimal) -> Self {
        if within_tolerance(movement) && within_tolerance(balance) {
            BalanceStatus::Balanced
        } else {
            BalanceStatus::Unbalanced
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BalanceStatus::Balanced => "balanced",
            BalanceStatus::Unbalanced => "unbalanced",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "balanced" => Ok(BalanceStatus::Balanced),
            "unbalanced" => Ok(BalanceStatus::Unbalanced),
            other => Err(DomainError::validation(format!(
                "unknown balance status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub opening: Decimal,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Normal-side closing balance (may be negative).
    pub closing: Decimal,
    pub balance_debit: Decimal,
    pub balance_credit: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    pub debit: Decimal,
    pub credit: Decimal,
    pub balance_debit: Decimal,
    pub balance_credit: Decimal,
    pub movement_difference: Decimal,
    pub balance_difference: Decimal,
}

/// Persisted trial balance snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub id: TrialBalanceId,
    pub period_id: PeriodId,
    pub generated_on: DateTime<Utc>,
    pub until: NaiveDate,
    pub status: BalanceStatus,
    pub totals: TrialBalanceTotals,
    pub rows: Vec<TrialBalanceRow>,
    pub generated_by: String,
}

/// Cut-off date: defaults to the period end and must lie inside the period.
pub fn resolve_cutoff(period: &Period, until: Option<NaiveDate>) -> DomainResult<NaiveDate> {
    let until = until.unwrap_or(period.end_date);
    if !period.contains(until) {
        return Err(DomainError::validation(format!(
            "cut-off date {until} must lie within the period {} to {}",
            period.start_date, period.end_date
        )));
    }
    Ok(until)
}

/// Compute rows (ordered by account code) and totals.
///
/// Accounts without an opening balance and without movements are omitted.
pub fn compute_rows(
    accounts: &[Account],
    openings: &HashMap<AccountId, Decimal>,
    movements: &HashMap<AccountId, AccountMovement>,
) -> (Vec<TrialBalanceRow>, TrialBalanceTotals) {
    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));

    let mut rows = Vec::new();
    let mut totals = TrialBalanceTotals::default();

    for account in sorted {
        let opening = openings.get(&account.id).copied().unwrap_or(Decimal::ZERO);
        let (debit, credit) = movements
            .get(&account.id)
            .map(|m| (m.debit, m.credit))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));

        if opening.is_zero() && debit.is_zero() && credit.is_zero() {
            continue;
        }

        let closing = round_money(closing_balance(account.kind, opening, debit, credit));
        let (balance_debit, balance_credit) = place_in_columns(account.kind, closing);

        totals.debit += debit;
        totals.credit += credit;
        totals.balance_debit += balance_debit;
        totals.balance_credit += balance_credit;

        rows.push(TrialBalanceRow {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            kind: account.kind,
            opening,
            debit,
            credit,
            closing,
            balance_debit,
            balance_credit,
        });
    }

    totals.movement_difference = totals.debit - totals.credit;
    totals.balance_difference = totals.balance_debit - totals.balance_credit;
    (rows, totals)
}

impl TrialBalance {
    pub fn generate(
        period: &Period,
        until: NaiveDate,
        accounts: &[Account],
        openings: &HashMap<AccountId, Decimal>,
        movements: &HashMap<AccountId, AccountMovement>,
        generated_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let (rows, totals) = compute_rows(accounts, openings, movements);
        let status = BalanceStatus::from_differences(totals.movement_difference, totals.balance_difference);
        Self {
            id: TrialBalanceId::new(),
            period_id: period.id,
            generated_on: now,
            until,
            status,
            totals,
            rows,
            generated_by: generated_by.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbalancedEntry {
    pub source: EntrySource,
    pub entry_id: Uuid,
    pub date: NaiveDate,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub difference: Decimal,
}

/// Consistency check of a period without persisting a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceValidation {
    pub period_id: PeriodId,
    pub until: NaiveDate,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub difference: Decimal,
    pub status: BalanceStatus,
    pub unbalanced_entries: Vec<UnbalancedEntry>,
}

pub fn validate(period_id: PeriodId, until: NaiveDate, entries: &[EntryTotals]) -> BalanceValidation {
    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;
    let mut unbalanced = Vec::new();

    for e in entries {
        total_debit += e.debit;
        total_credit += e.credit;
        let difference = e.debit - e.credit;
        if !within_tolerance(difference) {
            unbalanced.push(UnbalancedEntry {
                source: e.source,
                entry_id: e.entry_id,
                date: e.date,
                description: e.description.clone(),
                debit: e.debit,
                credit: e.credit,
                difference,
            });
        }
    }

    let difference = total_debit - total_credit;
    let status = if within_tolerance(difference) && unbalanced.is_empty() {
        BalanceStatus::Balanced
    } else {
        BalanceStatus::Unbalanced
    };

    BalanceValidation {
        period_id,
        until,
        total_debit,
        total_credit,
        difference,
        status,
        unbalanced_entries: unbalanced,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountActivity {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub opening: Decimal,
    pub movement_count: i64,
    pub debit: Decimal,
    pub credit: Decimal,
    pub closing: Decimal,
    /// Share of the period's total movement volume, in percent.
    pub activity_share: Decimal,
}

/// Per-account activity ordered by code, optionally restricted to one kind.
///
/// Accounts without opening balance and movements are omitted.
pub fn analyze(
    accounts: &[Account],
    openings: &HashMap<AccountId, Decimal>,
    movements: &HashMap<AccountId, AccountMovement>,
    kind: Option<AccountKind>,
) -> Vec<AccountActivity> {
    let volume: Decimal = movements.values().map(|m| m.debit + m.credit).sum();

    let mut sorted: Vec<&Account> = accounts
        .iter()
        .filter(|a| kind.is_none_or(|k| k == a.kind))
        .collect();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));

    sorted
        .into_iter()
        .filter_map(|account| {
            let opening = openings.get(&account.id).copied().unwrap_or(Decimal::ZERO);
            let m = movements
                .get(&account.id)
                .cloned()
                .unwrap_or_else(|| AccountMovement::empty(account.id));
            if opening.is_zero() && m.line_count == 0 {
                return None;
            }
            let activity_share = if volume.is_zero() {
                Decimal::ZERO
            } else {
                round_money((m.debit + m.credit) / volume * Decimal::ONE_HUNDRED)
            };
            Some(AccountActivity {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                kind: account.kind,
                opening,
                movement_count: m.line_count,
                debit: m.debit,
                credit: m.credit,
                closing: round_money(closing_balance(account.kind, opening, m.debit, m.credit)),
                activity_share,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::NewAccount;
    use crate::period::{NewPeriod, PeriodKind};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period() -> Period {
        Period::create(
            NewPeriod {
                start_date: date(2024, 1, 1),
                end_date: date(2024, 1, 31),
                kind: PeriodKind::Monthly,
                description: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn account(code: &str, kind: AccountKind) -> Account {
        Account::create(
            NewAccount {
                code: code.into(),
                name: code.into(),
                kind,
                parent_id: None,
                accepts_postings: true,
            },
            None,
            Utc::now(),
        )
        .unwrap()
    }

    fn movement(a: &Account, debit: Decimal, credit: Decimal, n: i64) -> (AccountId, AccountMovement) {
        (
            a.id,
            AccountMovement {
                account_id: a.id,
                debit,
                credit,
                line_count: n,
            },
        )
    }

    #[test]
    fn cutoff_defaults_to_period_end_and_must_be_inside() {
        let p = period();
        assert_eq!(resolve_cutoff(&p, None).unwrap(), date(2024, 1, 31));
        assert_eq!(resolve_cutoff(&p, Some(date(2024, 1, 15))).unwrap(), date(2024, 1, 15));
        assert!(matches!(
            resolve_cutoff(&p, Some(date(2024, 2, 1))),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn rows_place_closing_balances_by_nature() {
        let cash = account("1101", AccountKind::Asset);
        let capital = account("3101", AccountKind::Equity);
        let sales = account("4101", AccountKind::Income);
        let rent = account("5101", AccountKind::Expense);
        let unused = account("9999", AccountKind::Expense);
        let accounts = vec![sales.clone(), cash.clone(), capital.clone(), rent.clone(), unused];

        let openings: HashMap<AccountId, Decimal> =
            [(cash.id, dec!(1000)), (capital.id, dec!(1000))].into_iter().collect();
        let movements: HashMap<AccountId, AccountMovement> = [
            movement(&cash, dec!(500), dec!(200), 2),
            movement(&sales, dec!(0), dec!(500), 1),
            movement(&rent, dec!(200), dec!(0), 1),
        ]
        .into_iter()
        .collect();

        let (rows, totals) = compute_rows(&accounts, &openings, &movements);
        let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["1101", "3101", "4101", "5101"]);

        assert_eq!(rows[0].closing, dec!(1300));
        assert_eq!((rows[0].balance_debit, rows[0].balance_credit), (dec!(1300), dec!(0)));
        assert_eq!((rows[1].balance_debit, rows[1].balance_credit), (dec!(0), dec!(1000)));
        assert_eq!((rows[2].balance_debit, rows[2].balance_credit), (dec!(0), dec!(500)));
        assert_eq!((rows[3].balance_debit, rows[3].balance_credit), (dec!(200), dec!(0)));

        assert_eq!(totals.debit, dec!(700));
        assert_eq!(totals.credit, dec!(700));
        assert_eq!(totals.balance_debit, dec!(1500));
        assert_eq!(totals.balance_credit, dec!(1500));
        assert_eq!(
            BalanceStatus::from_differences(totals.movement_difference, totals.balance_difference),
            BalanceStatus::Balanced
        );
    }

    #[test]
    fn overdrawn_asset_goes_to_credit_column() {
        let bank = account("1102", AccountKind::Asset);
        let movements: HashMap<AccountId, AccountMovement> =
            [movement(&bank, dec!(0), dec!(50), 1)].into_iter().collect();
        let (rows, _) = compute_rows(&[bank], &HashMap::new(), &movements);
        assert_eq!(rows[0].closing, dec!(-50));
        assert_eq!((rows[0].balance_debit, rows[0].balance_credit), (dec!(0), dec!(50)));
    }

    #[test]
    fn difference_above_one_cent_is_unbalanced() {
        assert_eq!(
            BalanceStatus::from_differences(dec!(0.01), dec!(-0.01)),
            BalanceStatus::Balanced
        );
        assert_eq!(
            BalanceStatus::from_differences(dec!(0.02), dec!(0)),
            BalanceStatus::Unbalanced
        );
    }

    #[test]
    fn validation_lists_unbalanced_entries() {
        let entries = vec![
            EntryTotals {
                source: EntrySource::Transaction,
                entry_id: Uuid::now_v7(),
                date: date(2024, 1, 2),
                description: "ok".into(),
                debit: dec!(100),
                credit: dec!(100),
            },
            EntryTotals {
                source: EntrySource::Transaction,
                entry_id: Uuid::now_v7(),
                date: date(2024, 1, 3),
                description: "broken".into(),
                debit: dec!(50),
                credit: dec!(40),
            },
        ];
        let v = validate(PeriodId::new(), date(2024, 1, 31), &entries);
        assert_eq!(v.status, BalanceStatus::Unbalanced);
        assert_eq!(v.difference, dec!(10));
        assert_eq!(v.unbalanced_entries.len(), 1);
        assert_eq!(v.unbalanced_entries[0].description, "broken");
    }

    #[test]
    fn analysis_reports_counts_and_shares() {
        let cash = account("1101", AccountKind::Asset);
        let sales = account("4101", AccountKind::Income);
        let movements: HashMap<AccountId, AccountMovement> = [
            movement(&cash, dec!(300), dec!(0), 3),
            movement(&sales, dec!(0), dec!(300), 3),
        ]
        .into_iter()
        .collect();
        let rows = analyze(&[sales.clone(), cash.clone()], &HashMap::new(), &movements, None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "1101");
        assert_eq!(rows[0].movement_count, 3);
        assert_eq!(rows[0].activity_share, dec!(50));

        let only_income = analyze(
            &[sales.clone(), cash],
            &HashMap::new(),
            &movements,
            Some(AccountKind::Income),
        );
        assert_eq!(only_income.len(), 1);
        assert_eq!(only_income[0].closing, dec!(300));
    }

    fn arb_kind() -> impl Strategy<Value = AccountKind> {
        prop::sample::select(AccountKind::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Any set of balanced postings yields a balanced trial balance.
        #[test]
        fn balanced_postings_give_balanced_trial_balance(
            kinds in prop::collection::vec(arb_kind(), 2..8),
            postings in prop::collection::vec((0usize..8, 0usize..8, 1i64..10_000_000i64), 1..30),
        ) {
            let accounts: Vec<Account> = kinds
                .iter()
                .enumerate()
                .map(|(i, k)| account(&format!("{:04}", i + 1), *k))
                .collect();

            let mut movements: HashMap<AccountId, AccountMovement> = HashMap::new();
            for (from, to, cents) in postings {
                let debit_account = &accounts[from % accounts.len()];
                let credit_account = &accounts[to % accounts.len()];
                let amount = Decimal::new(cents, 2);
                let d = movements
                    .entry(debit_account.id)
                    .or_insert_with(|| AccountMovement::empty(debit_account.id));
                d.debit += amount;
                d.line_count += 1;
                let c = movements
                    .entry(credit_account.id)
                    .or_insert_with(|| AccountMovement::empty(credit_account.id));
                c.credit += amount;
                c.line_count += 1;
            }

            let (_, totals) = compute_rows(&accounts, &HashMap::new(), &movements);
            prop_assert_eq!(totals.movement_difference, Decimal::ZERO);
            prop_assert_eq!(totals.balance_difference, Decimal::ZERO);
        }
    }
}
