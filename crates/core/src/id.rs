//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_newtype {
    ($(#[$doc:meta])* $t:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered), so identifiers created later sort
            /// after earlier ones.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_newtype!(
    /// Chart-of-accounts entry.
    AccountId,
    "AccountId"
);
uuid_newtype!(
    /// Account manual (one per account).
    ManualId,
    "ManualId"
);
uuid_newtype!(
    /// Accounting period.
    PeriodId,
    "PeriodId"
);
uuid_newtype!(
    /// Posted transaction (header of a journal entry).
    TransactionId,
    "TransactionId"
);
uuid_newtype!(
    /// Single debit or credit line of a transaction or adjusting entry.
    JournalLineId,
    "JournalLineId"
);
uuid_newtype!(OpeningBalanceId, "OpeningBalanceId");
uuid_newtype!(
    /// Adjusting entry (partida de ajuste).
    AdjustmentId,
    "AdjustmentId"
);
uuid_newtype!(TrialBalanceId, "TrialBalanceId");
uuid_newtype!(
    /// Saved financial statement.
    StatementId,
    "StatementId"
);
uuid_newtype!(ClientId, "ClientId");
uuid_newtype!(ProductId, "ProductId");
uuid_newtype!(InvoiceId, "InvoiceId");
uuid_newtype!(InvoiceLineId, "InvoiceLineId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        let id = AccountId::new();
        let parsed: AccountId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_error_names_the_type() {
        let err = "nope".parse::<PeriodId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("PeriodId")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn later_ids_sort_after_earlier_ones() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert!(a < b);
    }
}
