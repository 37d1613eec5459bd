//! Accounting periods.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use contaflow_core::{DomainError, DomainResult, PeriodId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl PeriodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodKind::Monthly => "monthly",
            PeriodKind::Quarterly => "quarterly",
            PeriodKind::Semiannual => "semiannual",
            PeriodKind::Annual => "annual",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "monthly" => Ok(PeriodKind::Monthly),
            "quarterly" => Ok(PeriodKind::Quarterly),
            "semiannual" => Ok(PeriodKind::Semiannual),
            "annual" => Ok(PeriodKind::Annual),
            other => Err(DomainError::validation(format!("unknown period kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    Open,
    Closed,
}

impl PeriodStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodStatus::Open => "open",
            PeriodStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "open" => Ok(PeriodStatus::Open),
            "closed" => Ok(PeriodStatus::Closed),
            other => Err(DomainError::validation(format!("unknown period status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: PeriodKind,
    pub status: PeriodStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: PeriodKind,
    pub description: Option<String>,
}

impl Period {
    pub fn create(input: NewPeriod, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.end_date <= input.start_date {
            return Err(DomainError::validation(
                "period end date must be after its start date",
            ));
        }
        Ok(Self {
            id: PeriodId::new(),
            start_date: input.start_date,
            end_date: input.end_date,
            kind: input.kind,
            status: PeriodStatus::Open,
            description: input.description,
            created_at: now,
        })
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub fn is_open(&self) -> bool {
        self.status == PeriodStatus::Open
    }

    pub fn ensure_open(&self) -> DomainResult<()> {
        if !self.is_open() {
            return Err(DomainError::conflict(format!(
                "period {} to {} is closed",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }

    pub fn ensure_contains(&self, date: NaiveDate) -> DomainResult<()> {
        if !self.contains(date) {
            return Err(DomainError::validation(format!(
                "date {date} is outside the period {} to {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }

    pub fn close(&mut self) -> DomainResult<()> {
        if self.status == PeriodStatus::Closed {
            return Err(DomainError::conflict("period is already closed"));
        }
        self.status = PeriodStatus::Closed;
        Ok(())
    }

    pub fn reopen(&mut self) -> DomainResult<()> {
        if self.status == PeriodStatus::Open {
            return Err(DomainError::conflict("period is already open"));
        }
        self.status = PeriodStatus::Open;
        Ok(())
    }
}

/// First open period containing `date`.
pub fn open_period_for<'a>(periods: &'a [Period], date: NaiveDate) -> Option<&'a Period> {
    periods.iter().find(|p| p.is_open() && p.contains(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january() -> Period {
        Period::create(
            NewPeriod {
                start_date: date(2024, 1, 1),
                end_date: date(2024, 1, 31),
                kind: PeriodKind::Monthly,
                description: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn end_must_follow_start() {
        let err = Period::create(
            NewPeriod {
                start_date: date(2024, 1, 31),
                end_date: date(2024, 1, 31),
                kind: PeriodKind::Monthly,
                description: None,
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn contains_is_inclusive() {
        let p = january();
        assert!(p.contains(date(2024, 1, 1)));
        assert!(p.contains(date(2024, 1, 31)));
        assert!(!p.contains(date(2024, 2, 1)));
        assert!(!p.contains(date(2023, 12, 31)));
    }

    #[test]
    fn close_and_reopen() {
        let mut p = january();
        p.close().unwrap();
        assert!(p.ensure_open().is_err());
        assert!(matches!(p.close(), Err(DomainError::Conflict(_))));
        p.reopen().unwrap();
        assert!(p.ensure_open().is_ok());
    }

    #[test]
    fn open_period_lookup_skips_closed() {
        let mut closed = january();
        closed.close().unwrap();
        let open = january();
        let periods = vec![closed, open.clone()];
        assert_eq!(open_period_for(&periods, date(2024, 1, 15)), Some(&open));
        assert_eq!(open_period_for(&periods, date(2024, 3, 1)), None);
    }
}
