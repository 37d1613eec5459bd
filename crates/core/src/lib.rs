//! Shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model and money arithmetic helpers.

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{
    AccountId, AdjustmentId, ClientId, InvoiceId, InvoiceLineId, JournalLineId, ManualId,
    OpeningBalanceId, PeriodId, ProductId, StatementId, TransactionId, TrialBalanceId,
};
pub use money::{balance_tolerance, percent_of, round_money, within_tolerance};
