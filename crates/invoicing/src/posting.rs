//! Ledger entries produced by invoices and their payments.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use contaflow_accounting::journal::DEFAULT_CATEGORY;
use contaflow_accounting::{Account, LineInput, NewTransaction, TransactionKind};
use contaflow_core::{AccountId, DomainError, DomainResult, PeriodId};

use crate::invoice::Invoice;
use crate::settings::InvoicingSettings;

/// Lowest-coded active account accepting postings whose code starts with `prefix`.
pub fn find_account<'a>(accounts: &'a [Account], prefix: &str) -> Option<&'a Account> {
    accounts
        .iter()
        .filter(|a| a.is_active() && a.accepts_postings && a.code.starts_with(prefix))
        .min_by(|a, b| a.code.cmp(&b.code))
}

fn require(accounts: &[Account], prefix: &str, label: &str) -> DomainResult<AccountId> {
    find_account(accounts, prefix)
        .map(|a| a.id)
        .ok_or_else(|| DomainError::validation(format!("no {label} account with code prefix {prefix}")))
}

/// Dr receivables (total), Cr sales (taxable), Cr VAT payable (tax, when any).
pub fn sale_entry(
    invoice: &Invoice,
    period_id: PeriodId,
    settings: &InvoicingSettings,
    accounts: &[Account],
) -> DomainResult<NewTransaction> {
    let totals = &invoice.totals;
    if totals.total <= Decimal::ZERO {
        return Err(DomainError::validation(
            "invoice total must be greater than zero to post it",
        ));
    }
    let receivables = require(accounts, &settings.receivables_prefix, "receivables")?;
    let sales = require(accounts, &settings.sales_prefix, "sales")?;

    let mut lines = vec![LineInput::debit(receivables, totals.total)];
    if totals.taxable > Decimal::ZERO {
        lines.push(LineInput::credit(sales, totals.taxable));
    }
    if totals.tax > Decimal::ZERO {
        let vat = require(accounts, &settings.vat_payable_prefix, "VAT payable")?;
        lines.push(LineInput::credit(vat, totals.tax));
    }

    Ok(NewTransaction {
        date: invoice.issue_date,
        description: format!("Invoice {} - {}", invoice.number, invoice.client_name),
        kind: TransactionKind::Income,
        category: Some(DEFAULT_CATEGORY.to_string()),
        currency: None,
        period_id,
        reference: Some(invoice.number.clone()),
        notes: None,
        lines,
    })
}

/// Dr cash, Cr receivables for the invoice total.
pub fn payment_entry(
    invoice: &Invoice,
    paid_on: NaiveDate,
    period_id: PeriodId,
    settings: &InvoicingSettings,
    accounts: &[Account],
) -> DomainResult<NewTransaction> {
    let cash = require(accounts, &settings.cash_prefix, "cash")?;
    let receivables = require(accounts, &settings.receivables_prefix, "receivables")?;
    let total = invoice.totals.total;

    Ok(NewTransaction {
        date: paid_on,
        description: format!("Payment of invoice {}", invoice.number),
        kind: TransactionKind::Income,
        category: Some(DEFAULT_CATEGORY.to_string()),
        currency: None,
        period_id,
        reference: Some(invoice.number.clone()),
        notes: None,
        lines: vec![LineInput::debit(cash, total), LineInput::credit(receivables, total)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::tests::{client, date, line, new_invoice, product};
    use crate::invoice::{Invoice, format_number};
    use chrono::Utc;
    use contaflow_accounting::journal::check_lines;
    use contaflow_accounting::{AccountKind, NewAccount};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn account(code: &str, kind: AccountKind) -> Account {
        Account::create(
            NewAccount {
                code: code.into(),
                name: format!("Account {code}"),
                kind,
                parent_id: None,
                accepts_postings: true,
            },
            None,
            Utc::now(),
        )
        .unwrap()
    }

    fn chart() -> Vec<Account> {
        vec![
            account("110101", AccountKind::Asset),
            account("110301", AccountKind::Asset),
            account("210401", AccountKind::Liability),
            account("410101", AccountKind::Income),
        ]
    }

    fn invoice_for(price: Decimal, qty: Decimal, applies_vat: bool) -> Invoice {
        let c = client();
        let p = product("P1", price, applies_vat);
        let products: HashMap<_, _> = [(p.id, p.clone())].into_iter().collect();
        Invoice::draft(new_invoice(&c, vec![line(&p, qty)]), "A", &c, &products, "u", Utc::now())
            .unwrap()
            .into_invoice(format_number("A", 1))
    }

    #[test]
    fn sale_entry_splits_total_into_sales_and_vat() {
        let accounts = chart();
        let inv = invoice_for(dec!(100), dec!(1), true);
        let tx = sale_entry(&inv, contaflow_core::PeriodId::new(), &InvoicingSettings::default(), &accounts).unwrap();

        assert_eq!(tx.lines.len(), 3);
        assert_eq!(tx.lines[0].debit, dec!(113));
        assert_eq!(tx.lines[0].account_id, accounts[1].id);
        assert_eq!(tx.lines[1].credit, dec!(100));
        assert_eq!(tx.lines[1].account_id, accounts[3].id);
        assert_eq!(tx.lines[2].credit, dec!(13));
        assert_eq!(tx.lines[2].account_id, accounts[2].id);
        assert_eq!(tx.reference.as_deref(), Some("A-00000001"));
        check_lines(&tx.lines).unwrap();
    }

    #[test]
    fn vat_account_only_needed_when_taxed() {
        let accounts: Vec<Account> = chart()
            .into_iter()
            .filter(|a| !a.code.starts_with("2104"))
            .collect();
        let exempt = invoice_for(dec!(50), dec!(2), false);
        let tx = sale_entry(&exempt, contaflow_core::PeriodId::new(), &InvoicingSettings::default(), &accounts).unwrap();
        assert_eq!(tx.lines.len(), 2);

        let taxed = invoice_for(dec!(50), dec!(2), true);
        assert!(sale_entry(&taxed, contaflow_core::PeriodId::new(), &InvoicingSettings::default(), &accounts).is_err());
    }

    #[test]
    fn payment_entry_moves_receivable_to_cash() {
        let accounts = chart();
        let inv = invoice_for(dec!(10), dec!(3), true);
        let tx = payment_entry(
            &inv,
            date(2024, 3, 10),
            contaflow_core::PeriodId::new(),
            &InvoicingSettings::default(),
            &accounts,
        )
        .unwrap();
        assert_eq!(tx.lines[0].account_id, accounts[0].id);
        assert_eq!(tx.lines[0].debit, dec!(33.90));
        assert_eq!(tx.lines[1].account_id, accounts[1].id);
        assert_eq!(tx.lines[1].credit, dec!(33.90));
    }

    #[test]
    fn inactive_accounts_are_skipped() {
        let mut accounts = chart();
        accounts[1].status = contaflow_accounting::AccountStatus::Inactive;
        let inv = invoice_for(dec!(10), dec!(1), true);
        let err = sale_entry(&inv, contaflow_core::PeriodId::new(), &InvoicingSettings::default(), &accounts)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn sale_entry_is_balanced(
            price_cents in 1i64..10_000_000,
            qty_milli in 1i64..100_000,
            vat in any::<bool>(),
        ) {
            let accounts = chart();
            let inv = invoice_for(Decimal::new(price_cents, 2), Decimal::new(qty_milli, 3), vat);
            prop_assume!(inv.totals.total > Decimal::ZERO);
            let tx = sale_entry(&inv, contaflow_core::PeriodId::new(), &InvoicingSettings::default(), &accounts).unwrap();
            let (debit, credit) = check_lines(&tx.lines).unwrap();
            prop_assert_eq!(debit, credit);
            prop_assert_eq!(debit, inv.totals.total);
        }
    }
}
