//! Invoices: line totals, numbering and status lifecycle.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_core::{
    ClientId, DomainError, DomainResult, InvoiceId, InvoiceLineId, ProductId, TransactionId,
    percent_of, round_money,
};

use crate::client::Client;
use crate::product::Product;

pub const DEFAULT_SERIES: &str = "A";

/// `{series}-{seq:08}`, e.g. `A-00000042`.
pub fn format_number(series: &str, sequence: i64) -> String {
    format!("{series}-{sequence:08}")
}

/// Invoice status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Issued,
    Paid,
    Voided,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Voided => "voided",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "issued" => Ok(InvoiceStatus::Issued),
            "paid" => Ok(InvoiceStatus::Paid),
            "voided" => Ok(InvoiceStatus::Voided),
            "overdue" => Ok(InvoiceStatus::Overdue),
            other => Err(DomainError::validation(format!("unknown invoice status '{other}'"))),
        }
    }

    /// Still awaiting payment.
    pub fn is_open(self) -> bool {
        matches!(self, InvoiceStatus::Issued | InvoiceStatus::Overdue)
    }

    /// Counts as a sale (not voided).
    pub fn is_billed(self) -> bool {
        self != InvoiceStatus::Voided
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub product_id: ProductId,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// quantity × unit price.
    pub gross: Decimal,
    pub discount: Decimal,
    /// gross − discount; the taxable base.
    pub subtotal: Decimal,
    pub vat_rate: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Sum of gross line amounts.
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub taxable: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl InvoiceTotals {
    pub fn from_lines(lines: &[InvoiceLine]) -> Self {
        let mut t = InvoiceTotals::default();
        for l in lines {
            t.subtotal += l.gross;
            t.discount += l.discount;
            t.taxable += l.subtotal;
            t.tax += l.tax;
        }
        t.total = t.taxable + t.tax;
        t
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub number: String,
    pub series: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub client_id: ClientId,
    /// Client name at issue time.
    pub client_name: String,
    pub status: InvoiceStatus,
    pub applies_vat: bool,
    pub payment_method: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub totals: InvoiceTotals,
    pub lines: Vec<InvoiceLine>,
    /// Ledger transactions created for this invoice (sale, payment).
    pub transaction_ids: Vec<TransactionId>,
    pub paid_on: Option<NaiveDate>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoiceLine {
    pub product_id: ProductId,
    /// Defaults to the product name.
    pub description: Option<String>,
    pub quantity: Decimal,
    /// Defaults to the product sale price.
    pub unit_price: Option<Decimal>,
    pub discount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub issue_date: NaiveDate,
    /// Defaults to issue date plus the client's credit days.
    pub due_date: Option<NaiveDate>,
    pub client_id: ClientId,
    pub applies_vat: bool,
    pub payment_method: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<NewInvoiceLine>,
}

/// Validated invoice content awaiting its number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub series: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub client_id: ClientId,
    pub client_name: String,
    pub applies_vat: bool,
    pub payment_method: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub totals: InvoiceTotals,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

fn build_line(input: NewInvoiceLine, product: &Product, invoice_vat: bool, idx: usize) -> DomainResult<InvoiceLine> {
    if !product.is_active() {
        return Err(DomainError::validation(format!(
            "line {}: product {} is not active",
            idx + 1,
            product.code
        )));
    }
    if input.quantity <= Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "line {}: quantity must be greater than zero",
            idx + 1
        )));
    }
    let unit_price = input.unit_price.unwrap_or(product.sale_price).round_dp(4);
    if unit_price < Decimal::ZERO {
        return Err(DomainError::validation(format!(
            "line {}: unit price must not be negative",
            idx + 1
        )));
    }
    let quantity = input.quantity.round_dp(3);
    let gross = round_money(quantity * unit_price);
    let discount = round_money(input.discount);
    if discount < Decimal::ZERO || discount > gross {
        return Err(DomainError::validation(format!(
            "line {}: discount must be between zero and the line amount",
            idx + 1
        )));
    }
    let subtotal = gross - discount;
    let vat_rate = if invoice_vat && product.applies_vat {
        product.vat_rate
    } else {
        Decimal::ZERO
    };
    let tax = percent_of(subtotal, vat_rate);
    let description = input
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| product.name.clone());

    Ok(InvoiceLine {
        id: InvoiceLineId::new(),
        product_id: product.id,
        description,
        quantity,
        unit_price,
        gross,
        discount,
        subtotal,
        vat_rate,
        tax,
        total: subtotal + tax,
    })
}

impl Invoice {
    /// Validate input and compute line and invoice totals.
    ///
    /// `products` must contain every product referenced by the lines.
    pub fn draft(
        input: NewInvoice,
        series: &str,
        client: &Client,
        products: &HashMap<ProductId, Product>,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<InvoiceDraft> {
        if input.client_id != client.id {
            return Err(DomainError::validation("client does not match invoice"));
        }
        if !client.is_active() {
            return Err(DomainError::validation(format!(
                "client {} is not active",
                client.code
            )));
        }
        if input.lines.is_empty() {
            return Err(DomainError::validation("an invoice needs at least one line"));
        }
        let series = series.trim();
        if series.is_empty() {
            return Err(DomainError::validation("invoice series must not be empty"));
        }

        let due_date = input
            .due_date
            .unwrap_or_else(|| input.issue_date + Duration::days(i64::from(client.credit_days)));
        if due_date < input.issue_date {
            return Err(DomainError::validation("due date must not precede the issue date"));
        }

        let mut lines = Vec::with_capacity(input.lines.len());
        for (idx, line) in input.lines.into_iter().enumerate() {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| DomainError::not_found(format!("product {}", line.product_id)))?;
            lines.push(build_line(line, product, input.applies_vat, idx)?);
        }
        let totals = InvoiceTotals::from_lines(&lines);

        Ok(InvoiceDraft {
            series: series.to_string(),
            issue_date: input.issue_date,
            due_date,
            client_id: client.id,
            client_name: client.display_name(),
            applies_vat: input.applies_vat,
            payment_method: input.payment_method,
            payment_terms: input.payment_terms,
            notes: input.notes,
            lines,
            totals,
            created_by: created_by.to_string(),
            created_at: now,
        })
    }

    pub fn register_payment(&mut self, paid_on: NaiveDate, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.is_open() {
            return Err(DomainError::conflict(format!(
                "invoice {} is {} and cannot be paid",
                self.number,
                self.status.as_str()
            )));
        }
        if paid_on < self.issue_date {
            return Err(DomainError::validation("payment date must not precede the issue date"));
        }
        self.status = InvoiceStatus::Paid;
        self.paid_on = Some(paid_on);
        self.updated_at = now;
        Ok(())
    }

    /// Appends the reason to the notes.
    pub fn void(&mut self, reason: &str, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status == InvoiceStatus::Voided {
            return Err(DomainError::conflict(format!(
                "invoice {} is already voided",
                self.number
            )));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("a void reason is required"));
        }
        let note = format!("VOIDED: {reason}");
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
            _ => note,
        });
        self.status = InvoiceStatus::Voided;
        self.updated_at = now;
        Ok(())
    }

    /// Flip an issued invoice past its due date to overdue. Returns whether
    /// the status changed.
    pub fn mark_overdue(&mut self, as_of: NaiveDate, now: DateTime<Utc>) -> bool {
        if self.status == InvoiceStatus::Issued && self.due_date < as_of {
            self.status = InvoiceStatus::Overdue;
            self.updated_at = now;
            return true;
        }
        false
    }
}

impl InvoiceDraft {
    pub fn into_invoice(self, number: String) -> Invoice {
        Invoice {
            id: InvoiceId::new(),
            number,
            series: self.series,
            issue_date: self.issue_date,
            due_date: self.due_date,
            client_id: self.client_id,
            client_name: self.client_name,
            status: InvoiceStatus::Issued,
            applies_vat: self.applies_vat,
            payment_method: self.payment_method,
            payment_terms: self.payment_terms,
            notes: self.notes,
            totals: self.totals,
            lines: self.lines,
            transaction_ids: Vec::new(),
            paid_on: None,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub client_id: Option<ClientId>,
    pub status: Option<InvoiceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for InvoiceFilter {
    fn default() -> Self {
        Self {
            client_id: None,
            status: None,
            from: None,
            to: None,
            offset: 0,
            limit: 100,
        }
    }
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.client_id.is_none_or(|c| c == invoice.client_id)
            && self.status.is_none_or(|s| s == invoice.status)
            && self.from.is_none_or(|f| invoice.issue_date >= f)
            && self.to.is_none_or(|t| invoice.issue_date <= t)
    }

    /// Newest first.
    pub fn apply(&self, invoices: impl IntoIterator<Item = Invoice>) -> Vec<Invoice> {
        let mut out: Vec<Invoice> = invoices.into_iter().filter(|i| self.matches(i)).collect();
        out.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then(b.number.cmp(&a.number)));
        out.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::{ClientKind, NewClient};
    use crate::product::{NewProduct, ProductKind, ProductStatus};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn client() -> Client {
        Client::create(
            NewClient {
                code: None,
                name: "Acme".into(),
                last_name: None,
                trade_name: None,
                kind: ClientKind::LegalEntity,
                tax_id: None,
                phone: None,
                email: None,
                address: None,
                category: None,
                credit_limit: dec!(0),
                credit_days: 30,
            },
            "CLI-0001".into(),
            false,
            "u",
            Utc::now(),
        )
        .unwrap()
    }

    pub(crate) fn product(code: &str, price: Decimal, applies_vat: bool) -> Product {
        Product::create(
            NewProduct {
                code: code.into(),
                name: format!("Product {code}"),
                description: None,
                kind: ProductKind::Product,
                category: None,
                sale_price: price,
                purchase_price: dec!(0),
                applies_vat,
                vat_rate: None,
                tracks_inventory: false,
                stock: dec!(0),
            },
            Utc::now(),
        )
        .unwrap()
    }

    pub(crate) fn line(p: &Product, qty: Decimal) -> NewInvoiceLine {
        NewInvoiceLine {
            product_id: p.id,
            description: None,
            quantity: qty,
            unit_price: None,
            discount: dec!(0),
        }
    }

    pub(crate) fn new_invoice(c: &Client, lines: Vec<NewInvoiceLine>) -> NewInvoice {
        NewInvoice {
            issue_date: date(2024, 3, 1),
            due_date: None,
            client_id: c.id,
            applies_vat: true,
            payment_method: None,
            payment_terms: None,
            notes: None,
            lines,
        }
    }

    fn catalog(products: &[&Product]) -> HashMap<ProductId, Product> {
        products.iter().map(|p| (p.id, (*p).clone())).collect()
    }

    #[test]
    fn number_format() {
        assert_eq!(format_number("A", 42), "A-00000042");
    }

    #[test]
    fn totals_with_vat_and_discount() {
        let c = client();
        let taxed = product("P1", dec!(100), true);
        let exempt = product("P2", dec!(50), false);
        let mut l1 = line(&taxed, dec!(2));
        l1.discount = dec!(20);
        let l2 = line(&exempt, dec!(1));
        let draft = Invoice::draft(
            new_invoice(&c, vec![l1, l2]),
            "A",
            &c,
            &catalog(&[&taxed, &exempt]),
            "u",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(draft.lines[0].gross, dec!(200));
        assert_eq!(draft.lines[0].subtotal, dec!(180));
        assert_eq!(draft.lines[0].tax, dec!(23.40));
        assert_eq!(draft.lines[1].tax, dec!(0));
        assert_eq!(draft.totals.subtotal, dec!(250));
        assert_eq!(draft.totals.discount, dec!(20));
        assert_eq!(draft.totals.taxable, dec!(230));
        assert_eq!(draft.totals.tax, dec!(23.40));
        assert_eq!(draft.totals.total, dec!(253.40));
        assert_eq!(draft.due_date, date(2024, 3, 31));
    }

    #[test]
    fn invoice_without_vat_ignores_product_rate() {
        let c = client();
        let taxed = product("P1", dec!(100), true);
        let mut input = new_invoice(&c, vec![line(&taxed, dec!(1))]);
        input.applies_vat = false;
        let draft = Invoice::draft(input, "A", &c, &catalog(&[&taxed]), "u", Utc::now()).unwrap();
        assert_eq!(draft.totals.tax, dec!(0));
        assert_eq!(draft.totals.total, dec!(100));
    }

    #[test]
    fn rejects_inactive_client_or_product_and_empty_lines() {
        let mut c = client();
        let p = product("P1", dec!(10), true);
        assert!(Invoice::draft(new_invoice(&c, vec![]), "A", &c, &catalog(&[&p]), "u", Utc::now()).is_err());

        let mut inactive = p.clone();
        inactive.set_status(ProductStatus::Inactive, Utc::now());
        assert!(
            Invoice::draft(
                new_invoice(&c, vec![line(&inactive, dec!(1))]),
                "A",
                &c,
                &catalog(&[&inactive]),
                "u",
                Utc::now()
            )
            .is_err()
        );

        c.set_status(crate::client::ClientStatus::Blocked, Utc::now());
        assert!(
            Invoice::draft(new_invoice(&c, vec![line(&p, dec!(1))]), "A", &c, &catalog(&[&p]), "u", Utc::now())
                .is_err()
        );
    }

    #[test]
    fn discount_above_gross_is_rejected() {
        let c = client();
        let p = product("P1", dec!(10), true);
        let mut l = line(&p, dec!(1));
        l.discount = dec!(10.01);
        let err = Invoice::draft(new_invoice(&c, vec![l]), "A", &c, &catalog(&[&p]), "u", Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn lifecycle() {
        let c = client();
        let p = product("P1", dec!(10), true);
        let mut inv = Invoice::draft(new_invoice(&c, vec![line(&p, dec!(1))]), "A", &c, &catalog(&[&p]), "u", Utc::now())
            .unwrap()
            .into_invoice(format_number("A", 1));
        assert_eq!(inv.status, InvoiceStatus::Issued);

        assert!(!inv.mark_overdue(date(2024, 3, 31), Utc::now()));
        assert!(inv.mark_overdue(date(2024, 4, 1), Utc::now()));
        assert_eq!(inv.status, InvoiceStatus::Overdue);

        inv.register_payment(date(2024, 4, 2), Utc::now()).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert!(matches!(
            inv.register_payment(date(2024, 4, 2), Utc::now()),
            Err(DomainError::Conflict(_))
        ));

        inv.void("duplicate", Utc::now()).unwrap();
        assert_eq!(inv.notes.as_deref(), Some("VOIDED: duplicate"));
        assert!(matches!(inv.void("again", Utc::now()), Err(DomainError::Conflict(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Stored totals are the sum of their lines and total = taxable + tax.
        #[test]
        fn totals_are_consistent(
            lines in prop::collection::vec((1i64..10_000, 1i64..1_000_000, 0u8..=100, any::<bool>()), 1..8),
        ) {
            let c = client();
            let mut products = HashMap::new();
            let mut inputs = Vec::new();
            for (i, (qty_milli, price_cents, discount_pct, vat)) in lines.into_iter().enumerate() {
                let p = product(&format!("P{i}"), Decimal::new(price_cents, 2), vat);
                let quantity = Decimal::new(qty_milli, 3);
                let gross = round_money(quantity * p.sale_price);
                let discount = round_money(gross * Decimal::from(discount_pct) / Decimal::ONE_HUNDRED);
                inputs.push(NewInvoiceLine {
                    product_id: p.id,
                    description: None,
                    quantity,
                    unit_price: None,
                    discount,
                });
                products.insert(p.id, p);
            }
            let draft = Invoice::draft(new_invoice(&c, inputs), "A", &c, &products, "u", Utc::now()).unwrap();
            let t = &draft.totals;
            prop_assert_eq!(t.subtotal - t.discount, t.taxable);
            prop_assert_eq!(t.taxable + t.tax, t.total);
            let line_total: Decimal = draft.lines.iter().map(|l| l.total).sum();
            prop_assert_eq!(line_total, t.total);
        }
    }
}
