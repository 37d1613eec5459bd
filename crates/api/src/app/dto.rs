use std::str::FromStr;

use axum::http::StatusCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use contaflow_accounting::{
    AccountFilter, AccountKind, AccountStatus, AccountUpdate, AdjustmentFilter, AdjustmentStatus,
    AdjustmentUpdate, BalanceClassification, CompanySettingsUpdate, LedgerQuery, LineInput,
    ManualInput, NewAccount, NewAdjustment, NewOpeningBalance, NewPeriod, NewTransaction, PeriodKind,
    Side, StatementKind, TransactionKind,
};
use contaflow_core::{AccountId, DomainError, PeriodId};
use contaflow_invoicing::{
    ClientFilter, ClientKind, ClientStatus, ClientUpdate, InvoiceFilter, InvoiceStatus,
    InvoicingSettingsUpdate, NewClient, NewInvoice, NewInvoiceLine, NewProduct, ProductFilter,
    ProductKind, ProductStatus, ProductUpdate, StockMovement,
};

use crate::app::errors;

/// Parse an id taken from a path, query or body field.
pub fn parse_id<T>(raw: &str, what: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.trim().parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id"))
    })
}

fn parse_opt_id<T>(raw: Option<&str>, what: &str) -> Result<Option<T>, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(|r| parse_id(r, what)).transpose()
}

/// Missing field → `None`, explicit `null` → `Some(None)`.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

fn yes() -> bool {
    true
}

// -------------------------
// Accounts
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub parent_id: Option<String>,
    #[serde(default = "yes")]
    pub accepts_postings: bool,
}

impl CreateAccountRequest {
    pub fn into_domain(self) -> Result<NewAccount, axum::response::Response> {
        Ok(NewAccount {
            code: self.code,
            name: self.name,
            kind: self.kind,
            parent_id: parse_opt_id(self.parent_id.as_deref(), "parent account")?,
            accepts_postings: self.accepts_postings,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub accepts_postings: Option<bool>,
    pub status: Option<AccountStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<String>>,
}

impl UpdateAccountRequest {
    pub fn into_domain(self) -> Result<AccountUpdate, axum::response::Response> {
        let parent_id = match self.parent_id {
            Some(Some(raw)) => Some(Some(parse_id(&raw, "parent account")?)),
            Some(None) => Some(None),
            None => None,
        };
        Ok(AccountUpdate {
            name: self.name,
            kind: self.kind,
            accepts_postings: self.accepts_postings,
            status: self.status,
            parent_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AccountListQuery {
    pub kind: Option<AccountKind>,
    pub status: Option<AccountStatus>,
    pub search: Option<String>,
    pub accepts_postings: Option<bool>,
    pub level: Option<i32>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl AccountListQuery {
    pub fn into_filter(self) -> AccountFilter {
        let defaults = AccountFilter::default();
        AccountFilter {
            kind: self.kind,
            status: self.status,
            search: self.search,
            accepts_postings: self.accepts_postings,
            level: self.level,
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ManualRequest {
    pub description: String,
    pub nature: Option<Side>,
    pub classification: Option<BalanceClassification>,
    pub usage: Option<String>,
    pub examples: Option<String>,
    pub related_accounts: Option<String>,
    pub regulation: Option<String>,
}

impl From<ManualRequest> for ManualInput {
    fn from(req: ManualRequest) -> Self {
        ManualInput {
            description: req.description,
            nature: req.nature,
            classification: req.classification,
            usage: req.usage,
            examples: req.examples,
            related_accounts: req.related_accounts,
            regulation: req.regulation,
        }
    }
}

// -------------------------
// Periods, transactions, openings, adjustments
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreatePeriodRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: PeriodKind,
    pub description: Option<String>,
}

impl From<CreatePeriodRequest> for NewPeriod {
    fn from(req: CreatePeriodRequest) -> Self {
        NewPeriod {
            start_date: req.start_date,
            end_date: req.end_date,
            kind: req.kind,
            description: req.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LineRequest {
    pub account_id: String,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    pub description: Option<String>,
}

fn to_lines(lines: Vec<LineRequest>) -> Result<Vec<LineInput>, axum::response::Response> {
    lines
        .into_iter()
        .map(|l| {
            Ok(LineInput {
                account_id: parse_id(&l.account_id, "account")?,
                debit: l.debit,
                credit: l.credit,
                description: l.description,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct PostTransactionRequest {
    pub date: NaiveDate,
    pub description: String,
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub period_id: String,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<LineRequest>,
}

impl PostTransactionRequest {
    pub fn into_domain(self) -> Result<NewTransaction, axum::response::Response> {
        Ok(NewTransaction {
            date: self.date,
            description: self.description,
            kind: self.kind,
            category: self.category,
            currency: self.currency,
            period_id: parse_id(&self.period_id, "period")?,
            reference: self.reference,
            notes: self.notes,
            lines: to_lines(self.lines)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period_id: Option<String>,
}

impl PeriodQuery {
    pub fn period_id(&self) -> Result<Option<PeriodId>, axum::response::Response> {
        parse_opt_id(self.period_id.as_deref(), "period")
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOpeningRequest {
    pub period_id: String,
    pub account_id: String,
    pub amount: Decimal,
    pub notes: Option<String>,
}

impl CreateOpeningRequest {
    pub fn into_domain(self) -> Result<NewOpeningBalance, axum::response::Response> {
        Ok(NewOpeningBalance {
            period_id: parse_id(&self.period_id, "period")?,
            account_id: parse_id(&self.account_id, "account")?,
            amount: self.amount,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOpeningRequest {
    pub amount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CarryForwardRequest {
    pub source_period_id: String,
    pub target_period_id: String,
    /// Equity account receiving the source result; picked by name when absent.
    pub earnings_account_id: Option<String>,
}

/// Source period, target period and earnings account of a carry-forward.
pub type CarryForward = (PeriodId, PeriodId, Option<AccountId>);

impl CarryForwardRequest {
    pub fn into_domain(self) -> Result<CarryForward, axum::response::Response> {
        Ok((
            parse_id(&self.source_period_id, "source period")?,
            parse_id(&self.target_period_id, "target period")?,
            parse_opt_id(self.earnings_account_id.as_deref(), "earnings account")?,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAdjustmentRequest {
    pub number: Option<String>,
    pub date: NaiveDate,
    pub description: String,
    pub kind: String,
    pub reason: Option<String>,
    pub period_id: String,
    pub lines: Vec<LineRequest>,
}

impl CreateAdjustmentRequest {
    pub fn into_domain(self) -> Result<NewAdjustment, axum::response::Response> {
        Ok(NewAdjustment {
            number: self.number,
            date: self.date,
            description: self.description,
            kind: self.kind,
            reason: self.reason,
            period_id: parse_id(&self.period_id, "period")?,
            lines: to_lines(self.lines)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAdjustmentRequest {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub reason: Option<String>,
}

impl From<UpdateAdjustmentRequest> for AdjustmentUpdate {
    fn from(req: UpdateAdjustmentRequest) -> Self {
        AdjustmentUpdate {
            date: req.date,
            description: req.description,
            kind: req.kind,
            reason: req.reason,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentListQuery {
    pub period_id: Option<String>,
    pub kind: Option<String>,
    pub status: Option<AdjustmentStatus>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl AdjustmentListQuery {
    pub fn into_filter(self) -> Result<AdjustmentFilter, axum::response::Response> {
        let defaults = AdjustmentFilter::default();
        Ok(AdjustmentFilter {
            period_id: parse_opt_id(self.period_id.as_deref(), "period")?,
            kind: self.kind,
            status: self.status,
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit),
        })
    }
}

// -------------------------
// Reports
// -------------------------

#[derive(Debug, Deserialize)]
pub struct TrialBalanceRequest {
    pub period_id: String,
    pub until: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub period_id: String,
    pub kind: Option<AccountKind>,
}

#[derive(Debug, Deserialize)]
pub struct LedgerParams {
    pub period_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl LedgerParams {
    pub fn into_query(self) -> Result<LedgerQuery, axum::response::Response> {
        Ok(LedgerQuery {
            account_id: None,
            period_id: parse_opt_id(self.period_id.as_deref(), "period")?,
            from: self.from,
            to: self.to,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatementQuery {
    pub period_id: String,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveStatementRequest {
    pub period_id: String,
    pub kind: StatementKind,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
}

impl From<UpdateSettingsRequest> for CompanySettingsUpdate {
    fn from(req: UpdateSettingsRequest) -> Self {
        CompanySettingsUpdate {
            name: req.name,
            tax_id: req.tax_id,
            address: req.address,
            phone: req.phone,
            email: req.email,
            currency: req.currency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoicingSettingsRequest {
    pub receivables_prefix: Option<String>,
    pub sales_prefix: Option<String>,
    pub vat_payable_prefix: Option<String>,
    pub cash_prefix: Option<String>,
    pub default_vat_rate: Option<Decimal>,
}

impl From<UpdateInvoicingSettingsRequest> for InvoicingSettingsUpdate {
    fn from(req: UpdateInvoicingSettingsRequest) -> Self {
        InvoicingSettingsUpdate {
            receivables_prefix: req.receivables_prefix,
            sales_prefix: req.sales_prefix,
            vat_payable_prefix: req.vat_payable_prefix,
            cash_prefix: req.cash_prefix,
            default_vat_rate: req.default_vat_rate,
        }
    }
}

// -------------------------
// Clients and products
// -------------------------

#[derive(Debug, Deserialize)]
pub struct StatusRequest<S> {
    pub status: S,
}

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub code: Option<String>,
    pub name: String,
    pub last_name: Option<String>,
    pub trade_name: Option<String>,
    pub kind: ClientKind,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub credit_limit: Decimal,
    #[serde(default)]
    pub credit_days: i32,
}

impl From<CreateClientRequest> for NewClient {
    fn from(req: CreateClientRequest) -> Self {
        NewClient {
            code: req.code,
            name: req.name,
            last_name: req.last_name,
            trade_name: req.trade_name,
            kind: req.kind,
            tax_id: req.tax_id,
            phone: req.phone,
            email: req.email,
            address: req.address,
            category: req.category,
            credit_limit: req.credit_limit,
            credit_days: req.credit_days,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub trade_name: Option<String>,
    pub kind: Option<ClientKind>,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub credit_limit: Option<Decimal>,
    pub credit_days: Option<i32>,
}

impl From<UpdateClientRequest> for ClientUpdate {
    fn from(req: UpdateClientRequest) -> Self {
        ClientUpdate {
            name: req.name,
            last_name: req.last_name,
            trade_name: req.trade_name,
            kind: req.kind,
            tax_id: req.tax_id,
            phone: req.phone,
            email: req.email,
            address: req.address,
            category: req.category,
            credit_limit: req.credit_limit,
            credit_days: req.credit_days,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClientListQuery {
    pub search: Option<String>,
    pub status: Option<ClientStatus>,
    pub kind: Option<ClientKind>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ClientListQuery {
    pub fn into_filter(self) -> ClientFilter {
        let defaults = ClientFilter::default();
        ClientFilter {
            search: self.search,
            status: self.status,
            kind: self.kind,
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: ProductKind,
    pub category: Option<String>,
    pub sale_price: Decimal,
    #[serde(default)]
    pub purchase_price: Decimal,
    #[serde(default = "yes")]
    pub applies_vat: bool,
    pub vat_rate: Option<Decimal>,
    #[serde(default)]
    pub tracks_inventory: bool,
    #[serde(default)]
    pub stock: Decimal,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        NewProduct {
            code: req.code,
            name: req.name,
            description: req.description,
            kind: req.kind,
            category: req.category,
            sale_price: req.sale_price,
            purchase_price: req.purchase_price,
            applies_vat: req.applies_vat,
            vat_rate: req.vat_rate,
            tracks_inventory: req.tracks_inventory,
            stock: req.stock,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<ProductKind>,
    pub category: Option<String>,
    pub sale_price: Option<Decimal>,
    pub purchase_price: Option<Decimal>,
    pub applies_vat: Option<bool>,
    pub vat_rate: Option<Decimal>,
    pub tracks_inventory: Option<bool>,
}

impl From<UpdateProductRequest> for ProductUpdate {
    fn from(req: UpdateProductRequest) -> Self {
        ProductUpdate {
            name: req.name,
            description: req.description,
            kind: req.kind,
            category: req.category,
            sale_price: req.sale_price,
            purchase_price: req.purchase_price,
            applies_vat: req.applies_vat,
            vat_rate: req.vat_rate,
            tracks_inventory: req.tracks_inventory,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub movement: StockMovement,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub kind: Option<ProductKind>,
    pub status: Option<ProductStatus>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl ProductListQuery {
    pub fn into_filter(self) -> ProductFilter {
        let defaults = ProductFilter::default();
        ProductFilter {
            search: self.search,
            kind: self.kind,
            status: self.status,
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit),
        }
    }
}

// -------------------------
// Invoices
// -------------------------

#[derive(Debug, Deserialize)]
pub struct InvoiceLineRequest {
    pub product_id: String,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub client_id: String,
    #[serde(default = "yes")]
    pub applies_vat: bool,
    pub payment_method: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<InvoiceLineRequest>,
    #[serde(default = "yes")]
    pub post_to_ledger: bool,
}

impl CreateInvoiceRequest {
    /// Returns the invoice input and whether to journal it.
    pub fn into_domain(self) -> Result<(NewInvoice, bool), axum::response::Response> {
        let mut lines = Vec::with_capacity(self.lines.len());
        for l in self.lines {
            lines.push(NewInvoiceLine {
                product_id: parse_id(&l.product_id, "product")?,
                description: l.description,
                quantity: l.quantity,
                unit_price: l.unit_price,
                discount: l.discount,
            });
        }
        let invoice = NewInvoice {
            issue_date: self.issue_date,
            due_date: self.due_date,
            client_id: parse_id(&self.client_id, "client")?,
            applies_vat: self.applies_vat,
            payment_method: self.payment_method,
            payment_terms: self.payment_terms,
            notes: self.notes,
            lines,
        };
        Ok((invoice, self.post_to_ledger))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentRequest {
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct VoidInvoiceRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    pub client_id: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl InvoiceListQuery {
    pub fn into_filter(self) -> Result<InvoiceFilter, axum::response::Response> {
        let defaults = InvoiceFilter::default();
        Ok(InvoiceFilter {
            client_id: parse_opt_id(self.client_id.as_deref(), "client")?,
            status: self.status,
            from: self.from,
            to: self.to,
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SalesReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub client_id: Option<String>,
}
