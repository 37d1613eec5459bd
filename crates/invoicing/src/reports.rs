//! Sales report and receivables aging.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_core::{ClientId, InvoiceId, ProductId, round_money};

use crate::invoice::{Invoice, InvoiceStatus};

const TOP_PRODUCTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSales {
    pub client_id: ClientId,
    pub client_name: String,
    pub invoice_count: usize,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub description: String,
    pub quantity: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub client_id: Option<ClientId>,
    pub invoice_count: usize,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub average: Decimal,
    /// Highest total first.
    pub by_client: Vec<ClientSales>,
    /// Highest quantity first, at most ten.
    pub top_products: Vec<ProductSales>,
}

/// Summarise non-voided invoices issued within `[from, to]`.
pub fn sales_report(
    from: NaiveDate,
    to: NaiveDate,
    client_id: Option<ClientId>,
    invoices: &[Invoice],
) -> SalesReport {
    let selected: Vec<&Invoice> = invoices
        .iter()
        .filter(|i| i.status.is_billed())
        .filter(|i| i.issue_date >= from && i.issue_date <= to)
        .filter(|i| client_id.is_none_or(|c| c == i.client_id))
        .collect();

    let mut subtotal = Decimal::ZERO;
    let mut discount = Decimal::ZERO;
    let mut tax = Decimal::ZERO;
    let mut total = Decimal::ZERO;
    let mut clients: HashMap<ClientId, ClientSales> = HashMap::new();
    let mut products: HashMap<ProductId, ProductSales> = HashMap::new();

    for inv in &selected {
        subtotal += inv.totals.subtotal;
        discount += inv.totals.discount;
        tax += inv.totals.tax;
        total += inv.totals.total;

        let entry = clients.entry(inv.client_id).or_insert_with(|| ClientSales {
            client_id: inv.client_id,
            client_name: inv.client_name.clone(),
            invoice_count: 0,
            total: Decimal::ZERO,
        });
        entry.invoice_count += 1;
        entry.total += inv.totals.total;

        for line in &inv.lines {
            let p = products.entry(line.product_id).or_insert_with(|| ProductSales {
                product_id: line.product_id,
                description: line.description.clone(),
                quantity: Decimal::ZERO,
                total: Decimal::ZERO,
            });
            p.quantity += line.quantity;
            p.total += line.total;
        }
    }

    let invoice_count = selected.len();
    let average = if invoice_count == 0 {
        Decimal::ZERO
    } else {
        round_money(total / Decimal::from(invoice_count))
    };

    let mut by_client: Vec<ClientSales> = clients.into_values().collect();
    by_client.sort_by(|a, b| b.total.cmp(&a.total).then(a.client_name.cmp(&b.client_name)));

    let mut top_products: Vec<ProductSales> = products.into_values().collect();
    top_products.sort_by(|a, b| b.quantity.cmp(&a.quantity).then(b.total.cmp(&a.total)));
    top_products.truncate(TOP_PRODUCTS);

    SalesReport {
        from,
        to,
        client_id,
        invoice_count,
        subtotal,
        discount,
        tax,
        total,
        average,
        by_client,
        top_products,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgingBucket {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "overdue_1_30")]
    Overdue1To30,
    #[serde(rename = "overdue_31_60")]
    Overdue31To60,
    #[serde(rename = "overdue_61_90")]
    Overdue61To90,
    #[serde(rename = "overdue_90_plus")]
    Overdue90Plus,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Overdue1To30,
        AgingBucket::Overdue31To60,
        AgingBucket::Overdue61To90,
        AgingBucket::Overdue90Plus,
    ];

    pub fn for_days_overdue(days: i64) -> Self {
        match days {
            i64::MIN..=0 => AgingBucket::Current,
            1..=30 => AgingBucket::Overdue1To30,
            31..=60 => AgingBucket::Overdue31To60,
            61..=90 => AgingBucket::Overdue61To90,
            _ => AgingBucket::Overdue90Plus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivableRow {
    pub invoice_id: InvoiceId,
    pub number: String,
    pub client_id: ClientId,
    pub client_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub total: Decimal,
    /// Zero while not yet due.
    pub days_overdue: i64,
    pub bucket: AgingBucket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub bucket: AgingBucket,
    pub count: usize,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingReport {
    pub as_of: NaiveDate,
    /// Most overdue first.
    pub rows: Vec<ReceivableRow>,
    pub buckets: Vec<BucketSummary>,
    pub total: Decimal,
}

/// Open invoices issued on or before `as_of`, bucketed by days past due.
pub fn receivables_aging(as_of: NaiveDate, invoices: &[Invoice]) -> AgingReport {
    let mut rows: Vec<ReceivableRow> = invoices
        .iter()
        .filter(|i| i.status.is_open() && i.issue_date <= as_of)
        .map(|i| {
            let days_overdue = (as_of - i.due_date).num_days().max(0);
            ReceivableRow {
                invoice_id: i.id,
                number: i.number.clone(),
                client_id: i.client_id,
                client_name: i.client_name.clone(),
                issue_date: i.issue_date,
                due_date: i.due_date,
                status: i.status,
                total: i.totals.total,
                days_overdue,
                bucket: AgingBucket::for_days_overdue(days_overdue),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue).then(a.number.cmp(&b.number)));

    let buckets = AgingBucket::ALL
        .iter()
        .map(|&bucket| {
            let in_bucket = rows.iter().filter(|r| r.bucket == bucket);
            BucketSummary {
                bucket,
                count: in_bucket.clone().count(),
                total: in_bucket.map(|r| r.total).sum(),
            }
        })
        .collect();
    let total = rows.iter().map(|r| r.total).sum();

    AgingReport {
        as_of,
        rows,
        buckets,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::tests::{client, date, line, new_invoice, product};
    use crate::invoice::format_number;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn invoice(seq: i64, price: Decimal, issue: NaiveDate, due: NaiveDate) -> Invoice {
        let c = client();
        let p = product("P1", price, false);
        let products: HashMap<_, _> = [(p.id, p.clone())].into_iter().collect();
        let mut input = new_invoice(&c, vec![line(&p, dec!(1))]);
        input.issue_date = issue;
        input.due_date = Some(due);
        Invoice::draft(input, "A", &c, &products, "u", Utc::now())
            .unwrap()
            .into_invoice(format_number("A", seq))
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(AgingBucket::for_days_overdue(-5), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_overdue(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_overdue(1), AgingBucket::Overdue1To30);
        assert_eq!(AgingBucket::for_days_overdue(30), AgingBucket::Overdue1To30);
        assert_eq!(AgingBucket::for_days_overdue(31), AgingBucket::Overdue31To60);
        assert_eq!(AgingBucket::for_days_overdue(60), AgingBucket::Overdue31To60);
        assert_eq!(AgingBucket::for_days_overdue(61), AgingBucket::Overdue61To90);
        assert_eq!(AgingBucket::for_days_overdue(90), AgingBucket::Overdue61To90);
        assert_eq!(AgingBucket::for_days_overdue(91), AgingBucket::Overdue90Plus);
    }

    #[test]
    fn bucket_serializes_with_range_names() {
        let json = serde_json::to_string(&AgingBucket::Overdue90Plus).unwrap();
        assert_eq!(json, "\"overdue_90_plus\"");
    }

    #[test]
    fn aging_skips_paid_voided_and_future_invoices() {
        let as_of = date(2024, 6, 30);
        let due = as_of - Duration::days(45);
        let open = invoice(1, dec!(100), date(2024, 4, 1), due);
        let mut paid = invoice(2, dec!(50), date(2024, 4, 1), due);
        paid.register_payment(date(2024, 5, 1), Utc::now()).unwrap();
        let mut voided = invoice(3, dec!(20), date(2024, 4, 1), due);
        voided.void("typo", Utc::now()).unwrap();
        let future = invoice(4, dec!(10), date(2024, 7, 1), date(2024, 7, 31));
        let current = invoice(5, dec!(5), date(2024, 6, 15), date(2024, 7, 15));

        let report = receivables_aging(as_of, &[open, paid, voided, future, current]);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].number, "A-00000001");
        assert_eq!(report.rows[0].days_overdue, 45);
        assert_eq!(report.rows[0].bucket, AgingBucket::Overdue31To60);
        assert_eq!(report.rows[1].bucket, AgingBucket::Current);
        assert_eq!(report.total, dec!(105));

        let summary: HashMap<AgingBucket, (usize, Decimal)> =
            report.buckets.iter().map(|b| (b.bucket, (b.count, b.total))).collect();
        assert_eq!(summary[&AgingBucket::Overdue31To60], (1, dec!(100)));
        assert_eq!(summary[&AgingBucket::Current], (1, dec!(5)));
        assert_eq!(summary[&AgingBucket::Overdue90Plus], (0, dec!(0)));
    }

    #[test]
    fn sales_report_totals_and_average() {
        let a = invoice(1, dec!(100), date(2024, 3, 1), date(2024, 3, 31));
        let b = invoice(2, dec!(50), date(2024, 3, 5), date(2024, 4, 4));
        let mut voided = invoice(3, dec!(999), date(2024, 3, 6), date(2024, 4, 5));
        voided.void("error", Utc::now()).unwrap();
        let outside = invoice(4, dec!(10), date(2024, 4, 1), date(2024, 5, 1));

        let report = sales_report(date(2024, 3, 1), date(2024, 3, 31), None, &[a, b, voided, outside]);
        assert_eq!(report.invoice_count, 2);
        assert_eq!(report.total, dec!(150));
        assert_eq!(report.average, dec!(75));
        assert_eq!(report.by_client.len(), 2);
        assert_eq!(report.by_client[0].total, dec!(100));
        assert_eq!(report.top_products.len(), 2);
    }

    #[test]
    fn empty_sales_report_has_zero_average() {
        let report = sales_report(date(2024, 1, 1), date(2024, 1, 31), None, &[]);
        assert_eq!(report.invoice_count, 0);
        assert_eq!(report.average, Decimal::ZERO);
    }
}
