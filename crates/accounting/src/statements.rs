//! Financial statements: balance sheet and income statement.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_core::{
    AccountId, DomainError, DomainResult, PeriodId, StatementId, round_money, within_tolerance,
};

use crate::account::{Account, AccountKind, BalanceClassification};
use crate::movement::{AccountMovement, CategoryMovement, closing_balance};
use crate::period::{Period, PeriodKind};
use crate::settings::CompanySettings;

/// Expense category treated as cost of sales for the gross result.
pub const COST_OF_SALES_CATEGORY: &str = "COMPRA";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyHeader {
    pub name: String,
    pub tax_id: String,
    pub address: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodHeader {
    pub id: PeriodId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: PeriodKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub company: CompanyHeader,
    pub period: PeriodHeader,
    pub generated_on: NaiveDate,
}

impl ReportHeader {
    pub fn new(company: &CompanySettings, period: &Period, generated_on: NaiveDate) -> Self {
        Self {
            company: CompanyHeader {
                name: company.name.clone(),
                tax_id: company.tax_id.clone(),
                address: company.address.clone(),
                currency: company.currency.clone(),
            },
            period: PeriodHeader {
                id: period.id,
                start_date: period.start_date,
                end_date: period.end_date,
                kind: period.kind,
            },
            generated_on,
        }
    }
}

/// Balance-sheet bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceGroup {
    CurrentAssets,
    NonCurrentAssets,
    CurrentLiabilities,
    NonCurrentLiabilities,
    Capital,
    Earnings,
}

const CURRENT_ASSET_WORDS: [&str; 3] = ["caja", "banco", "efectivo"];
const CURRENT_LIABILITY_WORDS: [&str; 2] = ["por pagar", "acumulado"];
const EARNINGS_WORDS: [&str; 2] = ["utilidad", "resultado"];

fn name_contains_any(name: &str, words: &[&str]) -> bool {
    let name = name.to_lowercase();
    words.iter().any(|w| name.contains(w))
}

/// Equity accounts holding accumulated results.
pub fn is_earnings_account(account: &Account) -> bool {
    account.kind == AccountKind::Equity && name_contains_any(&account.name, &EARNINGS_WORDS)
}

/// Bucket for a balance-sheet account; `None` for income and expense accounts.
///
/// A manual classification wins over the name heuristic for assets and
/// liabilities.
pub fn classify(account: &Account, manual: Option<BalanceClassification>) -> Option<BalanceGroup> {
    match account.kind {
        AccountKind::Asset => {
            let current = match manual {
                Some(c) => c == BalanceClassification::Current,
                None => name_contains_any(&account.name, &CURRENT_ASSET_WORDS),
            };
            Some(if current {
                BalanceGroup::CurrentAssets
            } else {
                BalanceGroup::NonCurrentAssets
            })
        }
        AccountKind::Liability => {
            let current = match manual {
                Some(c) => c == BalanceClassification::Current,
                None => name_contains_any(&account.name, &CURRENT_LIABILITY_WORDS),
            };
            Some(if current {
                BalanceGroup::CurrentLiabilities
            } else {
                BalanceGroup::NonCurrentLiabilities
            })
        }
        AccountKind::Equity => Some(if is_earnings_account(account) {
            BalanceGroup::Earnings
        } else {
            BalanceGroup::Capital
        }),
        AccountKind::Income | AccountKind::Expense => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// `None` for computed lines such as the period result.
    pub account_id: Option<AccountId>,
    pub code: String,
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub lines: Vec<StatementLine>,
    pub total: Decimal,
}

impl Section {
    fn push(&mut self, line: StatementLine) {
        self.total += line.amount;
        self.lines.push(line);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub header: ReportHeader,
    pub current_assets: Section,
    pub non_current_assets: Section,
    pub total_assets: Decimal,
    pub current_liabilities: Section,
    pub non_current_liabilities: Section,
    pub total_liabilities: Decimal,
    pub capital: Section,
    pub earnings: Section,
    pub total_equity: Decimal,
    pub total_liabilities_and_equity: Decimal,
    pub net_result: Decimal,
    pub difference: Decimal,
    pub balanced: bool,
}

fn closing_of(
    account: &Account,
    openings: &HashMap<AccountId, Decimal>,
    movements: &HashMap<AccountId, AccountMovement>,
) -> Decimal {
    let opening = openings.get(&account.id).copied().unwrap_or(Decimal::ZERO);
    let (debit, credit) = movements
        .get(&account.id)
        .map(|m| (m.debit, m.credit))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO));
    round_money(closing_balance(account.kind, opening, debit, credit))
}

/// Balance sheet from opening balances plus period movements.
///
/// Accounts with a zero closing balance are left out. The period result
/// (income − expense) is appended to earnings.
pub fn balance_sheet(
    header: ReportHeader,
    accounts: &[Account],
    classifications: &HashMap<AccountId, BalanceClassification>,
    openings: &HashMap<AccountId, Decimal>,
    movements: &HashMap<AccountId, AccountMovement>,
) -> BalanceSheet {
    let mut sorted: Vec<&Account> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));

    let mut current_assets = Section::default();
    let mut non_current_assets = Section::default();
    let mut current_liabilities = Section::default();
    let mut non_current_liabilities = Section::default();
    let mut capital = Section::default();
    let mut earnings = Section::default();
    let mut net_result = Decimal::ZERO;

    for account in sorted {
        let closing = closing_of(account, openings, movements);
        match account.kind {
            AccountKind::Income => {
                net_result += closing;
                continue;
            }
            AccountKind::Expense => {
                net_result -= closing;
                continue;
            }
            _ => {}
        }
        if closing.is_zero() {
            continue;
        }
        let Some(group) = classify(account, classifications.get(&account.id).copied()) else {
            continue;
        };
        let line = StatementLine {
            account_id: Some(account.id),
            code: account.code.clone(),
            name: account.name.clone(),
            amount: closing,
        };
        match group {
            BalanceGroup::CurrentAssets => current_assets.push(line),
            BalanceGroup::NonCurrentAssets => non_current_assets.push(line),
            BalanceGroup::CurrentLiabilities => current_liabilities.push(line),
            BalanceGroup::NonCurrentLiabilities => non_current_liabilities.push(line),
            BalanceGroup::Capital => capital.push(line),
            BalanceGroup::Earnings => earnings.push(line),
        }
    }

    if !net_result.is_zero() {
        earnings.push(StatementLine {
            account_id: None,
            code: String::new(),
            name: "Net result for the period".to_string(),
            amount: net_result,
        });
    }

    let total_assets = current_assets.total + non_current_assets.total;
    let total_liabilities = current_liabilities.total + non_current_liabilities.total;
    let total_equity = capital.total + earnings.total;
    let total_liabilities_and_equity = total_liabilities + total_equity;
    let difference = total_assets - total_liabilities_and_equity;

    BalanceSheet {
        header,
        current_assets,
        non_current_assets,
        total_assets,
        current_liabilities,
        non_current_liabilities,
        total_liabilities,
        capital,
        earnings,
        total_equity,
        total_liabilities_and_equity,
        net_result,
        difference,
        balanced: within_tolerance(difference),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub category: String,
    pub lines: Vec<StatementLine>,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub header: ReportHeader,
    pub income: Vec<CategoryGroup>,
    pub expenses: Vec<CategoryGroup>,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub cost_of_sales: Decimal,
    pub gross_result: Decimal,
    pub net_result: Decimal,
}

fn group_by_category(
    accounts: &HashMap<AccountId, &Account>,
    movements: &[CategoryMovement],
    kind: AccountKind,
) -> Vec<CategoryGroup> {
    let mut grouped: BTreeMap<String, BTreeMap<String, StatementLine>> = BTreeMap::new();
    for m in movements {
        let Some(account) = accounts.get(&m.account_id) else {
            continue;
        };
        if account.kind != kind {
            continue;
        }
        let amount = match kind {
            AccountKind::Income => m.credit - m.debit,
            _ => m.debit - m.credit,
        };
        let line = grouped
            .entry(m.category.clone())
            .or_default()
            .entry(account.code.clone())
            .or_insert_with(|| StatementLine {
                account_id: Some(account.id),
                code: account.code.clone(),
                name: account.name.clone(),
                amount: Decimal::ZERO,
            });
        line.amount += amount;
    }

    grouped
        .into_iter()
        .filter_map(|(category, lines)| {
            let lines: Vec<StatementLine> = lines
                .into_values()
                .filter(|l| !l.amount.is_zero())
                .map(|mut l| {
                    l.amount = round_money(l.amount);
                    l
                })
                .collect();
            if lines.is_empty() {
                return None;
            }
            let total = lines.iter().map(|l| l.amount).sum();
            Some(CategoryGroup {
                category,
                lines,
                total,
            })
        })
        .collect()
}

/// Income and expense movements of the period grouped by category.
pub fn income_statement(
    header: ReportHeader,
    accounts: &[Account],
    movements: &[CategoryMovement],
) -> IncomeStatement {
    let by_id: HashMap<AccountId, &Account> = accounts.iter().map(|a| (a.id, a)).collect();
    let income = group_by_category(&by_id, movements, AccountKind::Income);
    let expenses = group_by_category(&by_id, movements, AccountKind::Expense);

    let total_income: Decimal = income.iter().map(|g| g.total).sum();
    let total_expenses: Decimal = expenses.iter().map(|g| g.total).sum();
    let cost_of_sales: Decimal = expenses
        .iter()
        .filter(|g| g.category == COST_OF_SALES_CATEGORY)
        .map(|g| g.total)
        .sum();

    IncomeStatement {
        header,
        income,
        expenses,
        total_income,
        total_expenses,
        cost_of_sales,
        gross_result: total_income - cost_of_sales,
        net_result: total_income - total_expenses,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::BalanceSheet => "balance_sheet",
            StatementKind::IncomeStatement => "income_statement",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "balance_sheet" => Ok(StatementKind::BalanceSheet),
            "income_statement" => Ok(StatementKind::IncomeStatement),
            other => Err(DomainError::validation(format!(
                "unknown statement kind '{other}'"
            ))),
        }
    }
}

/// A saved statement with its headline figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub id: StatementId,
    pub period_id: PeriodId,
    pub kind: StatementKind,
    pub content: serde_json::Value,
    pub summary: BTreeMap<String, Decimal>,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
}

fn to_content<T: Serialize>(statement: &T) -> DomainResult<serde_json::Value> {
    serde_json::to_value(statement)
        .map_err(|e| DomainError::invariant(format!("statement could not be serialized: {e}")))
}

impl StatementRecord {
    pub fn from_balance_sheet(
        sheet: &BalanceSheet,
        generated_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let summary = BTreeMap::from([
            ("total_assets".to_string(), sheet.total_assets),
            ("total_liabilities".to_string(), sheet.total_liabilities),
            ("total_equity".to_string(), sheet.total_equity),
            (
                "total_liabilities_and_equity".to_string(),
                sheet.total_liabilities_and_equity,
            ),
        ]);
        Ok(Self {
            id: StatementId::new(),
            period_id: sheet.header.period.id,
            kind: StatementKind::BalanceSheet,
            content: to_content(sheet)?,
            summary,
            generated_by: generated_by.to_string(),
            generated_at: now,
        })
    }

    pub fn from_income_statement(
        statement: &IncomeStatement,
        generated_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let summary = BTreeMap::from([
            ("total_income".to_string(), statement.total_income),
            ("total_expenses".to_string(), statement.total_expenses),
            ("gross_result".to_string(), statement.gross_result),
            ("net_result".to_string(), statement.net_result),
        ]);
        Ok(Self {
            id: StatementId::new(),
            period_id: statement.header.period.id,
            kind: StatementKind::IncomeStatement,
            content: to_content(statement)?,
            summary,
            generated_by: generated_by.to_string(),
            generated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::NewAccount;
    use crate::period::NewPeriod;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn header() -> ReportHeader {
        let period = Period::create(
            NewPeriod {
                start_date: date(2024, 1, 1),
                end_date: date(2024, 12, 31),
                kind: PeriodKind::Annual,
                description: None,
            },
            Utc::now(),
        )
        .unwrap();
        ReportHeader::new(&CompanySettings::defaults(Utc::now()), &period, date(2025, 1, 5))
    }

    fn account(code: &str, name: &str, kind: AccountKind) -> Account {
        Account::create(
            NewAccount {
                code: code.into(),
                name: name.into(),
                kind,
                parent_id: None,
                accepts_postings: true,
            },
            None,
            Utc::now(),
        )
        .unwrap()
    }

    fn mv(a: &Account, debit: Decimal, credit: Decimal) -> (AccountId, AccountMovement) {
        (
            a.id,
            AccountMovement {
                account_id: a.id,
                debit,
                credit,
                line_count: 1,
            },
        )
    }

    #[test]
    fn name_heuristic_classification() {
        let cash = account("1101", "Caja General", AccountKind::Asset);
        let building = account("1201", "Edificios", AccountKind::Asset);
        let suppliers = account("2101", "Cuentas por pagar", AccountKind::Liability);
        let loan = account("2201", "Préstamo bancario LP", AccountKind::Liability);
        let retained = account("3201", "Utilidades retenidas", AccountKind::Equity);
        let stock = account("3101", "Capital social", AccountKind::Equity);
        let sales = account("4101", "Ventas", AccountKind::Income);

        assert_eq!(classify(&cash, None), Some(BalanceGroup::CurrentAssets));
        assert_eq!(classify(&building, None), Some(BalanceGroup::NonCurrentAssets));
        assert_eq!(classify(&suppliers, None), Some(BalanceGroup::CurrentLiabilities));
        assert_eq!(classify(&loan, None), Some(BalanceGroup::NonCurrentLiabilities));
        assert_eq!(classify(&retained, None), Some(BalanceGroup::Earnings));
        assert_eq!(classify(&stock, None), Some(BalanceGroup::Capital));
        assert_eq!(classify(&sales, None), None);
    }

    #[test]
    fn manual_classification_overrides_name() {
        let receivables = account("1103", "Clientes", AccountKind::Asset);
        assert_eq!(classify(&receivables, None), Some(BalanceGroup::NonCurrentAssets));
        assert_eq!(
            classify(&receivables, Some(BalanceClassification::Current)),
            Some(BalanceGroup::CurrentAssets)
        );
    }

    #[test]
    fn balance_sheet_includes_opening_only_accounts_and_net_result() {
        let cash = account("1101", "Caja", AccountKind::Asset);
        let land = account("1201", "Terrenos", AccountKind::Asset);
        let capital = account("3101", "Capital social", AccountKind::Equity);
        let sales = account("4101", "Ventas", AccountKind::Income);
        let rent = account("5101", "Alquileres", AccountKind::Expense);
        let accounts = vec![cash.clone(), land.clone(), capital.clone(), sales.clone(), rent.clone()];

        let openings: HashMap<AccountId, Decimal> = [
            (cash.id, dec!(1000)),
            (land.id, dec!(5000)),
            (capital.id, dec!(6000)),
        ]
        .into_iter()
        .collect();
        let movements: HashMap<AccountId, AccountMovement> = [
            mv(&cash, dec!(800), dec!(300)),
            mv(&sales, dec!(0), dec!(800)),
            mv(&rent, dec!(300), dec!(0)),
        ]
        .into_iter()
        .collect();

        let sheet = balance_sheet(header(), &accounts, &HashMap::new(), &openings, &movements);
        assert_eq!(sheet.current_assets.total, dec!(1500));
        assert_eq!(sheet.non_current_assets.lines.len(), 1);
        assert_eq!(sheet.total_assets, dec!(6500));
        assert_eq!(sheet.net_result, dec!(500));
        assert_eq!(sheet.earnings.lines.len(), 1);
        assert!(sheet.earnings.lines[0].account_id.is_none());
        assert_eq!(sheet.total_equity, dec!(6500));
        assert_eq!(sheet.total_liabilities_and_equity, dec!(6500));
        assert!(sheet.balanced);
    }

    #[test]
    fn income_statement_groups_by_category() {
        let sales = account("4101", "Ventas", AccountKind::Income);
        let purchases = account("5101", "Costo de ventas", AccountKind::Expense);
        let wages = account("5201", "Sueldos", AccountKind::Expense);
        let cash = account("1101", "Caja", AccountKind::Asset);
        let movements = vec![
            CategoryMovement {
                account_id: sales.id,
                category: "VENTA".into(),
                debit: dec!(0),
                credit: dec!(1000),
            },
            CategoryMovement {
                account_id: purchases.id,
                category: "COMPRA".into(),
                debit: dec!(400),
                credit: dec!(0),
            },
            CategoryMovement {
                account_id: wages.id,
                category: "NÓMINA".into(),
                debit: dec!(250),
                credit: dec!(0),
            },
            CategoryMovement {
                account_id: cash.id,
                category: "VENTA".into(),
                debit: dec!(1000),
                credit: dec!(0),
            },
        ];
        let st = income_statement(header(), &[sales, purchases, wages, cash], &movements);
        assert_eq!(st.income.len(), 1);
        assert_eq!(st.income[0].category, "VENTA");
        assert_eq!(st.expenses.len(), 2);
        assert_eq!(st.total_income, dec!(1000));
        assert_eq!(st.total_expenses, dec!(650));
        assert_eq!(st.cost_of_sales, dec!(400));
        assert_eq!(st.gross_result, dec!(600));
        assert_eq!(st.net_result, dec!(350));
    }

    #[test]
    fn record_keeps_headline_figures() {
        let sheet = balance_sheet(header(), &[], &HashMap::new(), &HashMap::new(), &HashMap::new());
        let record = StatementRecord::from_balance_sheet(&sheet, "u", Utc::now()).unwrap();
        assert_eq!(record.kind, StatementKind::BalanceSheet);
        assert_eq!(record.summary["total_assets"], Decimal::ZERO);
        assert!(record.content.get("header").is_some());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Balanced openings plus balanced postings always give a balanced sheet.
        #[test]
        fn balanced_books_give_balanced_sheet(
            cash_open in 0i64..10_000_000,
            loan_open in 0i64..10_000_000,
            sales in 0i64..1_000_000,
            rent in 0i64..1_000_000,
        ) {
            let cash = account("1101", "Banco", AccountKind::Asset);
            let loan = account("2201", "Préstamo", AccountKind::Liability);
            let capital = account("3101", "Capital", AccountKind::Equity);
            let income = account("4101", "Ventas", AccountKind::Income);
            let expense = account("5101", "Alquiler", AccountKind::Expense);
            let accounts = vec![cash.clone(), loan.clone(), capital.clone(), income.clone(), expense.clone()];

            let cash_open = Decimal::new(cash_open, 2);
            let loan_open = Decimal::new(loan_open, 2);
            let capital_open = cash_open - loan_open;
            let openings: HashMap<AccountId, Decimal> = [
                (cash.id, cash_open),
                (loan.id, loan_open),
                (capital.id, capital_open),
            ]
            .into_iter()
            .collect();

            let sales = Decimal::new(sales, 2);
            let rent = Decimal::new(rent, 2);
            let movements: HashMap<AccountId, AccountMovement> = [
                mv(&cash, sales, rent),
                mv(&income, Decimal::ZERO, sales),
                mv(&expense, rent, Decimal::ZERO),
            ]
            .into_iter()
            .collect();

            let sheet = balance_sheet(header(), &accounts, &HashMap::new(), &openings, &movements);
            prop_assert!(sheet.balanced);
            prop_assert_eq!(sheet.total_assets, sheet.total_liabilities_and_equity);
        }
    }
}
