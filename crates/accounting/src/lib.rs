//! Accounting module (double-entry ledger, trial balance, financial statements).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. Reports
//! are computed from plain rows handed over by the store.

pub mod account;
pub mod adjustment;
pub mod general_ledger;
pub mod journal;
pub mod movement;
pub mod opening;
pub mod period;
pub mod settings;
pub mod statements;
pub mod trial_balance;

pub use account::{
    Account, AccountFilter, AccountKind, AccountManual, AccountStatus, AccountUpdate,
    BalanceClassification, ManualInput, NewAccount, Side,
};
pub use adjustment::{
    Adjustment, AdjustmentFilter, AdjustmentLine, AdjustmentStatus, AdjustmentUpdate, NewAdjustment,
};
pub use general_ledger::{AccountLedger, LedgerEntry, LedgerQuery};
pub use journal::{JournalLine, LineInput, NewTransaction, Transaction, TransactionKind, TransactionStatus};
pub use movement::{AccountMovement, CategoryMovement, EntrySource, EntryTotals, PostedLine};
pub use opening::{NewOpeningBalance, OpeningBalance, OpeningStatus, OpeningSummary};
pub use period::{NewPeriod, Period, PeriodKind, PeriodStatus};
pub use settings::{CompanySettings, CompanySettingsUpdate};
pub use statements::{BalanceSheet, IncomeStatement, ReportHeader, StatementKind, StatementRecord};
pub use trial_balance::{AccountActivity, BalanceStatus, BalanceValidation, TrialBalance};
