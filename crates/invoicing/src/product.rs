//! Products and services offered on invoices.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_core::{DomainError, DomainResult, ProductId};

/// VAT rate applied when none is given, in percent.
pub fn default_vat_rate() -> Decimal {
    Decimal::new(13, 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Product,
    Service,
    Bundle,
}

impl ProductKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Product => "product",
            ProductKind::Service => "service",
            ProductKind::Bundle => "bundle",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "product" => Ok(ProductKind::Product),
            "service" => Ok(ProductKind::Service),
            "bundle" => Ok(ProductKind::Bundle),
            other => Err(DomainError::validation(format!("unknown product kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
    Discontinued,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Discontinued => "discontinued",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            "discontinued" => Ok(ProductStatus::Discontinued),
            other => Err(DomainError::validation(format!("unknown product status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: ProductKind,
    pub category: Option<String>,
    pub sale_price: Decimal,
    pub purchase_price: Decimal,
    pub applies_vat: bool,
    /// Percent, 0..=100.
    pub vat_rate: Decimal,
    pub tracks_inventory: bool,
    pub stock: Decimal,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: ProductKind,
    pub category: Option<String>,
    pub sale_price: Decimal,
    pub purchase_price: Decimal,
    pub applies_vat: bool,
    pub vat_rate: Option<Decimal>,
    pub tracks_inventory: bool,
    pub stock: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductUpdate {
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

/// How a stock adjustment is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockMovement {
    /// Replace the stock with the given quantity.
    Set,
    In,
    Out,
}

impl StockMovement {
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "set" => Ok(StockMovement::Set),
            "in" => Ok(StockMovement::In),
            "out" => Ok(StockMovement::Out),
            other => Err(DomainError::validation(format!("unknown stock movement '{other}'"))),
        }
    }
}

fn check_prices(sale: Decimal, purchase: Decimal, vat_rate: Decimal) -> DomainResult<()> {
    if sale <= Decimal::ZERO {
        return Err(DomainError::validation("sale price must be greater than zero"));
    }
    if purchase < Decimal::ZERO {
        return Err(DomainError::validation("purchase price must not be negative"));
    }
    if vat_rate < Decimal::ZERO || vat_rate > Decimal::ONE_HUNDRED {
        return Err(DomainError::validation("vat rate must be between 0 and 100"));
    }
    Ok(())
}

impl Product {
    pub fn create(input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        let code = input.code.trim().to_string();
        let name = input.name.trim().to_string();
        if code.is_empty() {
            return Err(DomainError::validation("product code must not be empty"));
        }
        if name.is_empty() {
            return Err(DomainError::validation("product name must not be empty"));
        }
        let vat_rate = input.vat_rate.unwrap_or_else(default_vat_rate);
        check_prices(input.sale_price, input.purchase_price, vat_rate)?;
        if input.stock < Decimal::ZERO {
            return Err(DomainError::validation("stock must not be negative"));
        }

        Ok(Self {
            id: ProductId::new(),
            code,
            name,
            description: input.description,
            kind: input.kind,
            category: input.category,
            sale_price: input.sale_price,
            purchase_price: input.purchase_price,
            applies_vat: input.applies_vat,
            vat_rate,
            tracks_inventory: input.tracks_inventory,
            stock: input.stock,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: ProductUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        let sale = update.sale_price.unwrap_or(self.sale_price);
        let purchase = update.purchase_price.unwrap_or(self.purchase_price);
        let vat_rate = update.vat_rate.unwrap_or(self.vat_rate);
        check_prices(sale, purchase, vat_rate)?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("product name must not be empty"));
            }
            self.name = name;
        }
        if update.description.is_some() {
            self.description = update.description;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if update.category.is_some() {
            self.category = update.category;
        }
        if let Some(flag) = update.applies_vat {
            self.applies_vat = flag;
        }
        if let Some(flag) = update.tracks_inventory {
            self.tracks_inventory = flag;
        }
        self.sale_price = sale;
        self.purchase_price = purchase;
        self.vat_rate = vat_rate;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_status(&mut self, status: ProductStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Stock never drops below zero.
    pub fn adjust_stock(
        &mut self,
        movement: StockMovement,
        quantity: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.tracks_inventory {
            return Err(DomainError::validation(format!(
                "product {} does not track inventory",
                self.code
            )));
        }
        if quantity < Decimal::ZERO {
            return Err(DomainError::validation("quantity must not be negative"));
        }
        let next = match movement {
            StockMovement::Set => quantity,
            StockMovement::In => self.stock + quantity,
            StockMovement::Out => self.stock - quantity,
        };
        if next < Decimal::ZERO {
            return Err(DomainError::conflict(format!(
                "insufficient stock for {} (available {})",
                self.code, self.stock
            )));
        }
        self.stock = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of code, name or category.
    pub search: Option<String>,
    pub kind: Option<ProductKind>,
    pub status: Option<ProductStatus>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            search: None,
            kind: None,
            status: None,
            offset: 0,
            limit: 100,
        }
    }
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if self.kind.is_some_and(|k| k != product.kind) {
            return false;
        }
        if self.status.is_some_and(|s| s != product.status) {
            return false;
        }
        if let Some(search) = self.search.as_deref() {
            let needle = search.to_lowercase();
            let hit = |v: Option<&str>| v.is_some_and(|v| v.to_lowercase().contains(&needle));
            if !(hit(Some(&product.code)) || hit(Some(&product.name)) || hit(product.category.as_deref())) {
                return false;
            }
        }
        true
    }

    /// Ordered by code.
    pub fn apply(&self, products: impl IntoIterator<Item = Product>) -> Vec<Product> {
        let mut out: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn widget() -> NewProduct {
        NewProduct {
            code: "P-001".into(),
            name: "Widget".into(),
            description: None,
            kind: ProductKind::Product,
            category: Some("Hardware".into()),
            sale_price: dec!(10),
            purchase_price: dec!(6),
            applies_vat: true,
            vat_rate: None,
            tracks_inventory: true,
            stock: dec!(5),
        }
    }

    #[test]
    fn vat_rate_defaults_to_thirteen() {
        let p = Product::create(widget(), Utc::now()).unwrap();
        assert_eq!(p.vat_rate, dec!(13));
    }

    #[test]
    fn price_rules() {
        let mut i = widget();
        i.sale_price = dec!(0);
        assert!(Product::create(i, Utc::now()).is_err());
        let mut i = widget();
        i.vat_rate = Some(dec!(101));
        assert!(Product::create(i, Utc::now()).is_err());
        let mut i = widget();
        i.purchase_price = dec!(-0.01);
        assert!(Product::create(i, Utc::now()).is_err());
    }

    #[test]
    fn stock_never_goes_negative() {
        let mut p = Product::create(widget(), Utc::now()).unwrap();
        p.adjust_stock(StockMovement::In, dec!(3), Utc::now()).unwrap();
        assert_eq!(p.stock, dec!(8));
        p.adjust_stock(StockMovement::Out, dec!(8), Utc::now()).unwrap();
        assert_eq!(p.stock, dec!(0));
        let err = p.adjust_stock(StockMovement::Out, dec!(1), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        p.adjust_stock(StockMovement::Set, dec!(2.5), Utc::now()).unwrap();
        assert_eq!(p.stock, dec!(2.5));
    }

    #[test]
    fn services_do_not_track_stock() {
        let mut i = widget();
        i.kind = ProductKind::Service;
        i.tracks_inventory = false;
        let mut p = Product::create(i, Utc::now()).unwrap();
        assert!(p.adjust_stock(StockMovement::In, dec!(1), Utc::now()).is_err());
    }

    #[test]
    fn filter_searches_category() {
        let p = Product::create(widget(), Utc::now()).unwrap();
        let f = ProductFilter {
            search: Some("hard".into()),
            ..Default::default()
        };
        assert!(f.matches(&p));
        let f = ProductFilter {
            kind: Some(ProductKind::Service),
            ..Default::default()
        };
        assert!(!f.matches(&p));
    }
}
