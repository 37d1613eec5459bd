//! Opening balances per period and account.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_core::{AccountId, DomainError, DomainResult, OpeningBalanceId, PeriodId, round_money};

use crate::account::{Account, AccountKind, Side};
use crate::movement::{AccountMovement, closing_balance};
use crate::statements::is_earnings_account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningStatus {
    Active,
    Inactive,
}

impl OpeningStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OpeningStatus::Active => "active",
            OpeningStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "active" => Ok(OpeningStatus::Active),
            "inactive" => Ok(OpeningStatus::Inactive),
            other => Err(DomainError::validation(format!(
                "unknown opening balance status '{other}'"
            ))),
        }
    }
}

/// Amount is expressed in the account's normal-side terms; `side` is the
/// column it actually sits in, so a negative amount sits opposite the normal
/// side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningBalance {
    pub id: OpeningBalanceId,
    pub period_id: PeriodId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub side: Side,
    pub notes: Option<String>,
    pub status: OpeningStatus,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOpeningBalance {
    pub period_id: PeriodId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub notes: Option<String>,
}

fn ensure_sign(account: &Account, amount: Decimal) -> DomainResult<()> {
    if account.kind.is_debit_normal() && amount < Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "{} accounts cannot have a negative opening balance",
            account.kind.as_str()
        )));
    }
    Ok(())
}

impl OpeningBalance {
    /// `already_active` tells whether the period already holds an active
    /// balance for this account.
    pub fn create(
        input: NewOpeningBalance,
        account: &Account,
        already_active: bool,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if input.account_id != account.id {
            return Err(DomainError::validation("account does not match opening balance"));
        }
        if already_active {
            return Err(DomainError::conflict(format!(
                "an opening balance for account {} already exists in this period",
                account.code
            )));
        }
        ensure_sign(account, input.amount)?;

        Ok(Self {
            id: OpeningBalanceId::new(),
            period_id: input.period_id,
            account_id: account.id,
            amount: round_money(input.amount),
            side: account.kind.balance_side(input.amount),
            notes: input.notes,
            status: OpeningStatus::Active,
            created_by: created_by.to_string(),
            updated_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(
        &mut self,
        amount: Option<Decimal>,
        notes: Option<String>,
        account: &Account,
        updated_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.status == OpeningStatus::Inactive {
            return Err(DomainError::conflict("opening balance is inactive"));
        }
        if let Some(amount) = amount {
            ensure_sign(account, amount)?;
            self.amount = round_money(amount);
            self.side = account.kind.balance_side(self.amount);
        }
        if notes.is_some() {
            self.notes = notes;
        }
        self.updated_by = Some(updated_by.to_string());
        self.updated_at = now;
        Ok(())
    }

    pub fn deactivate(&mut self, updated_by: &str, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status == OpeningStatus::Inactive {
            return Err(DomainError::conflict("opening balance is already inactive"));
        }
        self.status = OpeningStatus::Inactive;
        self.updated_by = Some(updated_by.to_string());
        self.updated_at = now;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == OpeningStatus::Active
    }
}

/// Active opening amounts keyed by account.
pub fn opening_amounts(balances: &[OpeningBalance]) -> HashMap<AccountId, Decimal> {
    let mut out = HashMap::new();
    for b in balances.iter().filter(|b| b.is_active()) {
        *out.entry(b.account_id).or_insert(Decimal::ZERO) += b.amount;
    }
    out
}

/// Pick the equity account that receives the period result on carry-forward.
///
/// An explicit `requested` account must be an active equity account. Without
/// one, the lowest-coded active earnings account ("utilidad", "resultado") is
/// used.
pub fn earnings_account(accounts: &[Account], requested: Option<AccountId>) -> DomainResult<Option<&Account>> {
    if let Some(id) = requested {
        let account = accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| DomainError::not_found(format!("account {id}")))?;
        if account.kind != AccountKind::Equity {
            return Err(DomainError::validation(format!(
                "account {} is not an equity account",
                account.code
            )));
        }
        if !account.is_active() {
            return Err(DomainError::validation(format!("account {} is inactive", account.code)));
        }
        return Ok(Some(account));
    }
    Ok(accounts
        .iter()
        .filter(|a| a.is_active() && is_earnings_account(a))
        .min_by(|a, b| a.code.cmp(&b.code)))
}

/// Build the target period's opening balances from the source period's
/// closing balances.
///
/// Asset, liability and equity accounts carry their closing balance. The
/// source result (income minus expense closings) is added to the earnings
/// account, so the carried balances stay balanced. A non-zero result with no
/// earnings account is rejected. Accounts whose carried balance is zero are
/// skipped.
#[allow(clippy::too_many_arguments)]
pub fn carry_forward(
    target_period: PeriodId,
    accounts: &[Account],
    source_openings: &HashMap<AccountId, Decimal>,
    source_movements: &HashMap<AccountId, AccountMovement>,
    earnings: Option<&Account>,
    target_has_active: bool,
    created_by: &str,
    now: DateTime<Utc>,
) -> DomainResult<Vec<OpeningBalance>> {
    if target_has_active {
        return Err(DomainError::conflict(
            "the target period already has opening balances",
        ));
    }

    let closing_of = |account: &Account| {
        let opening = source_openings
            .get(&account.id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let (debit, credit) = source_movements
            .get(&account.id)
            .map(|m| (m.debit, m.credit))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        round_money(closing_balance(account.kind, opening, debit, credit))
    };

    let mut result = Decimal::ZERO;
    for account in accounts {
        match account.kind {
            AccountKind::Income => result += closing_of(account),
            AccountKind::Expense => result -= closing_of(account),
            _ => {}
        }
    }

    let earnings_id = match earnings {
        Some(a) if a.kind == AccountKind::Equity => Some(a.id),
        Some(a) => {
            return Err(DomainError::validation(format!(
                "account {} is not an equity account",
                a.code
            )));
        }
        None if result.is_zero() => None,
        None => {
            return Err(DomainError::validation(format!(
                "the source period result ({result}) needs an equity earnings account to carry into"
            )));
        }
    };

    let mut sorted: Vec<&Account> = accounts.iter().filter(|a| a.kind.is_permanent()).collect();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));

    let mut out = Vec::new();
    for account in sorted {
        let mut amount = closing_of(account);
        if Some(account.id) == earnings_id {
            amount += result;
        }
        if amount.is_zero() {
            continue;
        }
        out.push(OpeningBalance {
            id: OpeningBalanceId::new(),
            period_id: target_period,
            account_id: account.id,
            amount,
            side: account.kind.balance_side(amount),
            notes: Some("carried forward from previous period".to_string()),
            status: OpeningStatus::Active,
            created_by: created_by.to_string(),
            updated_by: None,
            created_at: now,
            updated_at: now,
        });
    }

    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSummary {
    pub kind: AccountKind,
    pub count: usize,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningSummary {
    pub period_id: PeriodId,
    pub by_kind: Vec<KindSummary>,
    pub count: usize,
    /// Asset and expense balances.
    pub debit_total: Decimal,
    /// Liability, equity and income balances.
    pub credit_total: Decimal,
    pub difference: Decimal,
}

/// Summarise active balances by account kind. Balances whose account is
/// missing from `kinds` are ignored.
pub fn summarize(
    period_id: PeriodId,
    balances: &[OpeningBalance],
    kinds: &HashMap<AccountId, AccountKind>,
) -> OpeningSummary {
    let mut per_kind: HashMap<AccountKind, (usize, Decimal)> = HashMap::new();
    for b in balances.iter().filter(|b| b.is_active()) {
        let Some(kind) = kinds.get(&b.account_id) else {
            continue;
        };
        let slot = per_kind.entry(*kind).or_insert((0, Decimal::ZERO));
        slot.0 += 1;
        slot.1 += b.amount;
    }

    let mut by_kind = Vec::new();
    let mut count = 0;
    let mut debit_total = Decimal::ZERO;
    let mut credit_total = Decimal::ZERO;
    for kind in AccountKind::ALL {
        let Some((n, total)) = per_kind.get(&kind).copied() else {
            continue;
        };
        count += n;
        if kind.is_debit_normal() {
            debit_total += total;
        } else {
            credit_total += total;
        }
        by_kind.push(KindSummary { kind, count: n, total });
    }

    OpeningSummary {
        period_id,
        by_kind,
        count,
        debit_total,
        credit_total,
        difference: debit_total - credit_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::NewAccount;
    use rust_decimal_macros::dec;

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

    fn new_balance(period: PeriodId, a: &Account, amount: Decimal) -> NewOpeningBalance {
        NewOpeningBalance {
            period_id: period,
            account_id: a.id,
            amount,
            notes: None,
        }
    }

    #[test]
    fn side_follows_account_kind() {
        let period = PeriodId::new();
        let cash = account("1101", AccountKind::Asset);
        let capital = account("3101", AccountKind::Equity);
        let b1 = OpeningBalance::create(new_balance(period, &cash, dec!(10)), &cash, false, "u", Utc::now())
            .unwrap();
        let b2 =
            OpeningBalance::create(new_balance(period, &capital, dec!(10)), &capital, false, "u", Utc::now())
                .unwrap();
        assert_eq!(b1.side, Side::Debit);
        assert_eq!(b2.side, Side::Credit);
    }

    #[test]
    fn negative_asset_balance_is_rejected() {
        let cash = account("1101", AccountKind::Asset);
        let err = OpeningBalance::create(
            new_balance(PeriodId::new(), &cash, dec!(-1)),
            &cash,
            false,
            "u",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let loan = account("2201", AccountKind::Liability);
        assert!(
            OpeningBalance::create(
                new_balance(PeriodId::new(), &loan, dec!(-1)),
                &loan,
                false,
                "u",
                Utc::now()
            )
            .is_ok()
        );
    }

    #[test]
    fn duplicate_is_a_conflict() {
        let cash = account("1101", AccountKind::Asset);
        let err = OpeningBalance::create(
            new_balance(PeriodId::new(), &cash, dec!(1)),
            &cash,
            true,
            "u",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    fn movement(account: &Account, debit: Decimal, credit: Decimal) -> (AccountId, AccountMovement) {
        (
            account.id,
            AccountMovement {
                account_id: account.id,
                debit,
                credit,
                line_count: 1,
            },
        )
    }

    #[test]
    fn carry_forward_moves_the_result_into_earnings() {
        let cash = account("1101", AccountKind::Asset);
        let capital = account("3101", AccountKind::Equity);
        let mut retained = account("3201", AccountKind::Equity);
        retained.name = "Utilidades retenidas".into();
        let sales = account("4101", AccountKind::Income);
        let rent = account("5101", AccountKind::Expense);
        let accounts = vec![cash.clone(), capital.clone(), retained.clone(), sales.clone(), rent.clone()];

        let openings: HashMap<AccountId, Decimal> =
            [(cash.id, dec!(1000)), (capital.id, dec!(1000))].into_iter().collect();
        let movements: HashMap<AccountId, AccountMovement> = [
            movement(&cash, dec!(500), dec!(120)),
            movement(&sales, dec!(0), dec!(500)),
            movement(&rent, dec!(120), dec!(0)),
        ]
        .into_iter()
        .collect();

        let earnings = earnings_account(&accounts, None).unwrap();
        assert_eq!(earnings.map(|a| a.id), Some(retained.id));

        let target = PeriodId::new();
        let carried =
            carry_forward(target, &accounts, &openings, &movements, earnings, false, "u", Utc::now()).unwrap();

        let amounts: Vec<(AccountId, Decimal)> = carried.iter().map(|b| (b.account_id, b.amount)).collect();
        assert_eq!(
            amounts,
            vec![(cash.id, dec!(1380)), (capital.id, dec!(1000)), (retained.id, dec!(380))]
        );
        assert!(carried.iter().all(|b| b.period_id == target));

        let kinds: HashMap<AccountId, AccountKind> = accounts.iter().map(|a| (a.id, a.kind)).collect();
        let summary = summarize(target, &carried, &kinds);
        assert_eq!(summary.debit_total, summary.credit_total);
        assert_eq!(summary.difference, Decimal::ZERO);
    }

    #[test]
    fn carry_forward_needs_an_earnings_account_for_a_result() {
        let cash = account("1101", AccountKind::Asset);
        let sales = account("4101", AccountKind::Income);
        let accounts = vec![cash.clone(), sales.clone()];
        let movements: HashMap<AccountId, AccountMovement> =
            [movement(&cash, dec!(50), dec!(0)), movement(&sales, dec!(0), dec!(50))]
                .into_iter()
                .collect();

        assert!(earnings_account(&accounts, None).unwrap().is_none());
        let err = carry_forward(
            PeriodId::new(),
            &accounts,
            &HashMap::new(),
            &movements,
            None,
            false,
            "u",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn requested_earnings_account_must_be_equity() {
        let cash = account("1101", AccountKind::Asset);
        let capital = account("3101", AccountKind::Equity);
        let accounts = vec![cash.clone(), capital.clone()];
        assert!(matches!(
            earnings_account(&accounts, Some(cash.id)),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(
            earnings_account(&accounts, Some(capital.id)).unwrap().map(|a| a.id),
            Some(capital.id)
        );
        assert!(matches!(
            earnings_account(&accounts, Some(AccountId::new())),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn overdrawn_asset_is_carried_on_the_credit_side() {
        let bank = account("1102", AccountKind::Asset);
        let loan = account("2101", AccountKind::Liability);
        let accounts = vec![bank.clone(), loan.clone()];
        let movements: HashMap<AccountId, AccountMovement> =
            [movement(&bank, dec!(0), dec!(200)), movement(&loan, dec!(200), dec!(0))]
                .into_iter()
                .collect();

        let carried = carry_forward(
            PeriodId::new(),
            &accounts,
            &HashMap::new(),
            &movements,
            None,
            false,
            "u",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(carried.len(), 2);
        assert_eq!(carried[0].account_id, bank.id);
        assert_eq!(carried[0].amount, dec!(-200));
        assert_eq!(carried[0].side, Side::Credit);
        assert_eq!(carried[1].amount, dec!(-200));
        assert_eq!(carried[1].side, Side::Debit);
    }

    #[test]
    fn negative_liability_opening_sits_on_the_debit_side() {
        let loan = account("2201", AccountKind::Liability);
        let mut b = OpeningBalance::create(
            new_balance(PeriodId::new(), &loan, dec!(-5)),
            &loan,
            false,
            "u",
            Utc::now(),
        )
        .unwrap();
        assert_eq!(b.side, Side::Debit);
        b.update(Some(dec!(5)), None, &loan, "u", Utc::now()).unwrap();
        assert_eq!(b.side, Side::Credit);
    }

    #[test]
    fn carry_forward_rejects_target_with_balances() {
        let err = carry_forward(
            PeriodId::new(),
            &[],
            &HashMap::new(),
            &HashMap::new(),
            None,
            true,
            "u",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn summary_splits_debit_and_credit_natures() {
        let period = PeriodId::new();
        let cash = account("1101", AccountKind::Asset);
        let bank = account("1102", AccountKind::Asset);
        let capital = account("3101", AccountKind::Equity);
        let balances: Vec<OpeningBalance> = [(&cash, dec!(300)), (&bank, dec!(200)), (&capital, dec!(450))]
            .into_iter()
            .map(|(a, amt)| {
                OpeningBalance::create(new_balance(period, a, amt), a, false, "u", Utc::now()).unwrap()
            })
            .collect();
        let kinds: HashMap<AccountId, AccountKind> = [&cash, &bank, &capital]
            .into_iter()
            .map(|a| (a.id, a.kind))
            .collect();

        let summary = summarize(period, &balances, &kinds);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.debit_total, dec!(500));
        assert_eq!(summary.credit_total, dec!(450));
        assert_eq!(summary.difference, dec!(50));
        assert_eq!(summary.by_kind[0].kind, AccountKind::Asset);
        assert_eq!(summary.by_kind[0].count, 2);
    }
}
