//! Invoicing module (clients, products, invoices, receivables).
//!
//! Pure domain logic; invoices produce `NewTransaction` values for the
//! accounting journal and never touch storage directly.

pub mod client;
pub mod invoice;
pub mod posting;
pub mod product;
pub mod reports;
pub mod settings;

pub use client::{Client, ClientFilter, ClientKind, ClientStatus, ClientUpdate, NewClient};
pub use invoice::{
    Invoice, InvoiceDraft, InvoiceFilter, InvoiceLine, InvoiceStatus, InvoiceTotals, NewInvoice,
    NewInvoiceLine,
};
pub use product::{NewProduct, Product, ProductFilter, ProductKind, ProductStatus, ProductUpdate, StockMovement};
pub use reports::{AgingBucket, AgingReport, SalesReport};
pub use settings::{InvoicingSettings, InvoicingSettingsUpdate, SetupCheck, SystemCheck};
