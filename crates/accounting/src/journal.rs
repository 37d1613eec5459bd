//! Journal: transactions and their debit/credit lines.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_core::{
    AccountId, DomainError, DomainResult, JournalLineId, PeriodId, TransactionId, round_money,
    within_tolerance,
};

use crate::account::Account;
use crate::period::Period;

/// Transaction categories accepted by the journal.
pub const CATEGORIES: [&str; 11] = [
    "VENTA",
    "COMPRA",
    "NÓMINA",
    "SERVICIOS",
    "IMPUESTOS",
    "INVERSIÓN",
    "PRÉSTAMO",
    "ACTIVOS",
    "GASTOS ADMINISTRATIVOS",
    "GASTOS OPERATIVOS",
    "OTROS",
];

pub const DEFAULT_CATEGORY: &str = "VENTA";
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(DomainError::validation(format!(
                "unknown transaction kind '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Posted,
    Voided,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Posted => "posted",
            TransactionStatus::Voided => "voided",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "posted" => Ok(TransactionStatus::Posted),
            "voided" => Ok(TransactionStatus::Voided),
            other => Err(DomainError::validation(format!(
                "unknown transaction status '{other}'"
            ))),
        }
    }
}

/// One side of a journal entry (immutable once posted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub id: JournalLineId,
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub date: NaiveDate,
    pub description: String,
    pub kind: TransactionKind,
    pub category: String,
    pub currency: String,
    pub period_id: PeriodId,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<JournalLine>,
}

/// Unvalidated line as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInput {
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
}

impl LineInput {
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: None,
        }
    }

    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub period_id: PeriodId,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<LineInput>,
}

/// Validate the shape of a set of entry lines and return `(debits, credits)`.
///
/// At least two lines; each line carries exactly one positive side; totals
/// agree within one cent.
pub fn check_lines(lines: &[LineInput]) -> DomainResult<(Decimal, Decimal)> {
    if lines.len() < 2 {
        return Err(DomainError::validation("an entry needs at least two lines"));
    }

    let mut debit_total = Decimal::ZERO;
    let mut credit_total = Decimal::ZERO;

    for (idx, line) in lines.iter().enumerate() {
        // Checked on the stored (rounded) amounts.
        let debit = round_money(line.debit);
        let credit = round_money(line.credit);
        if debit < Decimal::ZERO || credit < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "line {}: amounts must not be negative",
                idx + 1
            )));
        }
        if (debit > Decimal::ZERO) == (credit > Decimal::ZERO) {
            return Err(DomainError::validation(format!(
                "line {}: exactly one of debit or credit must be at least 0.01",
                idx + 1
            )));
        }
        debit_total += debit;
        credit_total += credit;
    }

    if !within_tolerance(debit_total - credit_total) {
        return Err(DomainError::invariant(format!(
            "debits must equal credits (debits {debit_total}, credits {credit_total})"
        )));
    }

    Ok((debit_total, credit_total))
}

/// Every referenced account must exist and accept postings.
pub fn check_accounts(
    lines: &[LineInput],
    accounts: &HashMap<AccountId, Account>,
) -> DomainResult<()> {
    for line in lines {
        let account = accounts
            .get(&line.account_id)
            .ok_or_else(|| DomainError::not_found(format!("account {}", line.account_id)))?;
        account.ensure_postable()?;
    }
    Ok(())
}

pub fn normalize_category(category: Option<&str>) -> DomainResult<String> {
    let category = category
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    if !CATEGORIES.contains(&category.as_str()) {
        return Err(DomainError::validation(format!(
            "unknown category '{category}'"
        )));
    }
    Ok(category)
}

pub fn normalize_currency(currency: Option<&str>) -> DomainResult<String> {
    let currency = currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::validation(
            "currency must be a three-letter code",
        ));
    }
    Ok(currency)
}

impl Transaction {
    /// Validate and build a posted transaction.
    ///
    /// `accounts` must contain every account referenced by the lines.
    pub fn post(
        input: NewTransaction,
        period: &Period,
        accounts: &HashMap<AccountId, Account>,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if input.period_id != period.id {
            return Err(DomainError::validation("period does not match transaction"));
        }
        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation("description must not be empty"));
        }
        period.ensure_contains(input.date)?;
        period.ensure_open()?;
        check_lines(&input.lines)?;
        check_accounts(&input.lines, accounts)?;
        let category = normalize_category(input.category.as_deref())?;
        let currency = normalize_currency(input.currency.as_deref())?;

        let lines = input
            .lines
            .into_iter()
            .map(|l| JournalLine {
                id: JournalLineId::new(),
                account_id: l.account_id,
                debit: round_money(l.debit),
                credit: round_money(l.credit),
                description: l.description,
            })
            .collect();

        Ok(Self {
            id: TransactionId::new(),
            date: input.date,
            description,
            kind: input.kind,
            category,
            currency,
            period_id: period.id,
            reference: input.reference,
            notes: input.notes,
            created_by: created_by.to_string(),
            status: TransactionStatus::Posted,
            created_at: now,
            lines,
        })
    }

    pub fn is_posted(&self) -> bool {
        self.status == TransactionStatus::Posted
    }

    pub fn void(&mut self) -> DomainResult<()> {
        if self.status == TransactionStatus::Voided {
            return Err(DomainError::conflict("transaction is already voided"));
        }
        self.status = TransactionStatus::Voided;
        Ok(())
    }

    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountKind, AccountStatus, NewAccount};
    use crate::period::{NewPeriod, PeriodKind};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_period() -> Period {
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

    fn test_account(code: &str, kind: AccountKind) -> Account {
        Account::create(
            NewAccount {
                code: code.to_string(),
                name: code.to_string(),
                kind,
                parent_id: None,
                accepts_postings: true,
            },
            None,
            Utc::now(),
        )
        .unwrap()
    }

    fn chart() -> (Account, Account, HashMap<AccountId, Account>) {
        let cash = test_account("1101", AccountKind::Asset);
        let sales = test_account("4101", AccountKind::Income);
        let map = [(cash.id, cash.clone()), (sales.id, sales.clone())]
            .into_iter()
            .collect();
        (cash, sales, map)
    }

    fn sale(period: &Period, cash: &Account, sales: &Account, amount: Decimal) -> NewTransaction {
        NewTransaction {
            date: date(2024, 1, 10),
            description: "Cash sale".into(),
            kind: TransactionKind::Income,
            category: None,
            currency: Some("usd".into()),
            period_id: period.id,
            reference: None,
            notes: None,
            lines: vec![
                LineInput::debit(cash.id, amount),
                LineInput::credit(sales.id, amount),
            ],
        }
    }

    #[test]
    fn balanced_transaction_is_posted() {
        let period = test_period();
        let (cash, sales, accounts) = chart();
        let tx = Transaction::post(
            sale(&period, &cash, &sales, dec!(100)),
            &period,
            &accounts,
            "tester",
            Utc::now(),
        )
        .unwrap();
        assert_eq!(tx.status, TransactionStatus::Posted);
        assert_eq!(tx.category, "VENTA");
        assert_eq!(tx.currency, "USD");
        assert_eq!(tx.total_debit(), dec!(100));
        assert_eq!(tx.total_credit(), dec!(100));
    }

    #[test]
    fn unbalanced_entry_is_rejected() {
        let period = test_period();
        let (cash, sales, accounts) = chart();
        let mut input = sale(&period, &cash, &sales, dec!(100));
        input.lines[1].credit = dec!(90);
        let err = Transaction::post(input, &period, &accounts, "tester", Utc::now()).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("debits must equal credits") => {}
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn one_cent_difference_is_tolerated() {
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(100.00)),
            LineInput::credit(AccountId::new(), dec!(99.99)),
        ];
        assert!(check_lines(&lines).is_ok());
    }

    #[test]
    fn line_with_both_sides_is_rejected() {
        let a = AccountId::new();
        let lines = vec![
            LineInput {
                account_id: a,
                debit: dec!(10),
                credit: dec!(10),
                description: None,
            },
            LineInput::credit(a, dec!(0.01)),
        ];
        assert!(matches!(check_lines(&lines), Err(DomainError::Validation(_))));
    }

    #[test]
    fn sub_cent_line_is_rejected() {
        let cash = AccountId::new();
        let sales = AccountId::new();
        let lines = vec![
            LineInput::debit(cash, dec!(10)),
            LineInput::credit(sales, dec!(10)),
            LineInput::debit(cash, dec!(0.004)),
        ];
        match check_lines(&lines) {
            Err(DomainError::Validation(msg)) => assert!(msg.starts_with("line 3")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn half_cent_line_rounds_up_and_is_checked_rounded() {
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(0.005)),
            LineInput::credit(AccountId::new(), dec!(0.01)),
        ];
        assert_eq!(check_lines(&lines).unwrap(), (dec!(0.01), dec!(0.01)));
    }

    #[test]
    fn posted_lines_never_round_to_zero() {
        let period = test_period();
        let (cash, sales, accounts) = chart();
        let mut input = sale(&period, &cash, &sales, dec!(10));
        input.lines.push(LineInput::credit(sales.id, dec!(0.001)));
        let err = Transaction::post(input, &period, &accounts, "tester", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn single_line_is_rejected() {
        let lines = vec![LineInput::debit(AccountId::new(), dec!(1))];
        assert!(matches!(check_lines(&lines), Err(DomainError::Validation(_))));
    }

    #[test]
    fn closed_period_is_rejected() {
        let mut period = test_period();
        period.close().unwrap();
        let (cash, sales, accounts) = chart();
        let err = Transaction::post(
            sale(&period, &cash, &sales, dec!(5)),
            &period,
            &accounts,
            "tester",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn date_outside_period_is_rejected() {
        let period = test_period();
        let (cash, sales, accounts) = chart();
        let mut input = sale(&period, &cash, &sales, dec!(5));
        input.date = date(2024, 2, 1);
        let err = Transaction::post(input, &period, &accounts, "tester", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unknown_or_inactive_account_is_rejected() {
        let period = test_period();
        let (cash, sales, mut accounts) = chart();
        let mut input = sale(&period, &cash, &sales, dec!(5));
        input.lines[0].account_id = AccountId::new();
        let err = Transaction::post(input, &period, &accounts, "tester", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        if let Some(a) = accounts.get_mut(&cash.id) {
            a.status = AccountStatus::Inactive;
        }
        let err = Transaction::post(
            sale(&period, &cash, &sales, dec!(5)),
            &period,
            &accounts,
            "tester",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(normalize_category(Some("gastos operativos")).is_ok());
        assert!(normalize_category(Some("LOTTERY")).is_err());
        assert_eq!(normalize_category(None).unwrap(), "VENTA");
    }

    #[test]
    fn currency_must_have_three_letters() {
        assert_eq!(normalize_currency(Some("eur")).unwrap(), "EUR");
        assert!(normalize_currency(Some("EURO")).is_err());
    }

    #[test]
    fn void_twice_is_a_conflict() {
        let period = test_period();
        let (cash, sales, accounts) = chart();
        let mut tx = Transaction::post(
            sale(&period, &cash, &sales, dec!(5)),
            &period,
            &accounts,
            "tester",
            Utc::now(),
        )
        .unwrap();
        tx.void().unwrap();
        assert!(matches!(tx.void(), Err(DomainError::Conflict(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Splitting one debit across several credit lines always balances.
        #[test]
        fn split_credits_balance(parts in prop::collection::vec(1i64..1_000_000i64, 1..10)) {
            let total: i64 = parts.iter().sum();
            let mut lines = vec![LineInput::debit(AccountId::new(), Decimal::new(total, 2))];
            for p in &parts {
                lines.push(LineInput::credit(AccountId::new(), Decimal::new(*p, 2)));
            }
            let (debits, credits) = check_lines(&lines).unwrap();
            prop_assert_eq!(debits, credits);
        }
    }
}
