//! Adjusting entries (period-end corrections such as depreciation or accruals).

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_core::{
    AccountId, AdjustmentId, DomainError, DomainResult, JournalLineId, PeriodId, round_money,
};

use crate::account::Account;
use crate::journal::{LineInput, check_lines};
use crate::period::Period;

const NUMBER_PREFIX: &str = "PAJ-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentStatus {
    Active,
    Voided,
}

impl AdjustmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AdjustmentStatus::Active => "active",
            AdjustmentStatus::Voided => "voided",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "active" => Ok(AdjustmentStatus::Active),
            "voided" => Ok(AdjustmentStatus::Voided),
            other => Err(DomainError::validation(format!(
                "unknown adjustment status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentLine {
    pub id: JournalLineId,
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: AdjustmentId,
    pub number: String,
    pub date: NaiveDate,
    pub description: String,
    /// Free text such as DEPRECIACION or PROVISION.
    pub kind: String,
    pub reason: Option<String>,
    pub period_id: PeriodId,
    pub status: AdjustmentStatus,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub voided_by: Option<String>,
    pub voided_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<AdjustmentLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdjustment {
    /// Generated when absent or blank.
    pub number: Option<String>,
    pub date: NaiveDate,
    pub description: String,
    pub kind: String,
    pub reason: Option<String>,
    pub period_id: PeriodId,
    pub lines: Vec<LineInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjustmentUpdate {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub reason: Option<String>,
}

/// Next `PAJ-NNNN` number after the highest numeric suffix among `existing`.
pub fn next_number<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let highest = existing
        .into_iter()
        .filter_map(|n| n.strip_prefix(NUMBER_PREFIX))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{NUMBER_PREFIX}{:04}", highest + 1)
}

fn normalize_kind(kind: &str) -> DomainResult<String> {
    let kind = kind.trim().to_uppercase();
    if kind.is_empty() {
        return Err(DomainError::validation("adjustment kind must not be empty"));
    }
    Ok(kind)
}

impl Adjustment {
    /// `generated_number` is used when the input carries no number.
    pub fn create(
        input: NewAdjustment,
        period: &Period,
        accounts: &HashMap<AccountId, Account>,
        generated_number: String,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if input.period_id != period.id {
            return Err(DomainError::validation("period does not match adjustment"));
        }
        period.ensure_open()?;
        period.ensure_contains(input.date)?;

        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation("description must not be empty"));
        }
        let kind = normalize_kind(&input.kind)?;
        check_lines(&input.lines)?;
        for line in &input.lines {
            if !accounts.contains_key(&line.account_id) {
                return Err(DomainError::not_found(format!("account {}", line.account_id)));
            }
        }

        let number = input
            .number
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or(generated_number);
        if number.len() > 20 {
            return Err(DomainError::validation("adjustment number must be at most 20 characters"));
        }

        let lines = input
            .lines
            .into_iter()
            .map(|l| AdjustmentLine {
                id: JournalLineId::new(),
                account_id: l.account_id,
                debit: round_money(l.debit),
                credit: round_money(l.credit),
                description: l.description,
            })
            .collect();

        Ok(Self {
            id: AdjustmentId::new(),
            number,
            date: input.date,
            description,
            kind,
            reason: input.reason,
            period_id: period.id,
            status: AdjustmentStatus::Active,
            approved_by: None,
            approved_at: None,
            voided_by: None,
            voided_at: None,
            created_by: created_by.to_string(),
            created_at: now,
            lines,
        })
    }

    fn ensure_active(&self, action: &str) -> DomainResult<()> {
        if self.status == AdjustmentStatus::Voided {
            return Err(DomainError::conflict(format!(
                "cannot {action} a voided adjustment"
            )));
        }
        Ok(())
    }

    /// Header fields only. A new date must stay inside `period`.
    pub fn apply_update(&mut self, update: AdjustmentUpdate, period: &Period) -> DomainResult<()> {
        self.ensure_active("modify")?;
        if let Some(date) = update.date {
            period.ensure_contains(date)?;
            self.date = date;
        }
        if let Some(description) = update.description {
            let description = description.trim().to_string();
            if description.is_empty() {
                return Err(DomainError::validation("description must not be empty"));
            }
            self.description = description;
        }
        if let Some(kind) = update.kind {
            self.kind = normalize_kind(&kind)?;
        }
        if update.reason.is_some() {
            self.reason = update.reason;
        }
        Ok(())
    }

    pub fn approve(&mut self, user: &str, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_active("approve")?;
        self.approved_by = Some(user.to_string());
        self.approved_at = Some(now);
        Ok(())
    }

    pub fn void(&mut self, user: &str, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status == AdjustmentStatus::Voided {
            return Err(DomainError::conflict("adjustment is already voided"));
        }
        self.status = AdjustmentStatus::Voided;
        self.voided_by = Some(user.to_string());
        self.voided_at = Some(now);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == AdjustmentStatus::Active
    }

    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentFilter {
    pub period_id: Option<PeriodId>,
    pub kind: Option<String>,
    pub status: Option<AdjustmentStatus>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for AdjustmentFilter {
    fn default() -> Self {
        Self {
            period_id: None,
            kind: None,
            status: None,
            offset: 0,
            limit: 100,
        }
    }
}

impl AdjustmentFilter {
    pub fn matches(&self, adjustment: &Adjustment) -> bool {
        self.period_id.is_none_or(|p| p == adjustment.period_id)
            && self
                .kind
                .as_deref()
                .is_none_or(|k| k.eq_ignore_ascii_case(&adjustment.kind))
            && self.status.is_none_or(|s| s == adjustment.status)
    }

    /// Newest first.
    pub fn apply(&self, adjustments: impl IntoIterator<Item = Adjustment>) -> Vec<Adjustment> {
        let mut out: Vec<Adjustment> = adjustments.into_iter().filter(|a| self.matches(a)).collect();
        out.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        out.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountKind, NewAccount};
    use crate::period::{NewPeriod, PeriodKind};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period() -> Period {
        Period::create(
            NewPeriod {
                start_date: date(2024, 1, 1),
                end_date: date(2024, 12, 31),
                kind: PeriodKind::Annual,
                description: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn accounts() -> (AccountId, AccountId, HashMap<AccountId, Account>) {
        let mk = |code: &str, kind| {
            Account::create(
                NewAccount {
                    code: code.into(),
                    name: code.into(),
                    kind,
                    parent_id: None,
                    accepts_postings: true,
                },
                None,
                Utc::now(),
            )
            .unwrap()
        };
        let expense = mk("5105", AccountKind::Expense);
        let contra = mk("1299", AccountKind::Asset);
        let ids = (expense.id, contra.id);
        let map = [(expense.id, expense), (contra.id, contra)].into_iter().collect();
        (ids.0, ids.1, map)
    }

    fn depreciation(p: &Period, expense: AccountId, contra: AccountId) -> NewAdjustment {
        NewAdjustment {
            number: None,
            date: date(2024, 12, 31),
            description: "Yearly depreciation".into(),
            kind: "depreciacion".into(),
            reason: None,
            period_id: p.id,
            lines: vec![
                LineInput::debit(expense, dec!(120)),
                LineInput::credit(contra, dec!(120)),
            ],
        }
    }

    #[test]
    fn numbers_follow_the_highest_existing() {
        assert_eq!(next_number(Vec::<&str>::new()), "PAJ-0001");
        assert_eq!(next_number(["PAJ-0001", "PAJ-0009", "X-77"]), "PAJ-0010");
    }

    #[test]
    fn create_uses_generated_number_and_uppercases_kind() {
        let p = period();
        let (e, c, map) = accounts();
        let adj = Adjustment::create(depreciation(&p, e, c), &p, &map, "PAJ-0003".into(), "u", Utc::now())
            .unwrap();
        assert_eq!(adj.number, "PAJ-0003");
        assert_eq!(adj.kind, "DEPRECIACION");
        assert!(adj.is_active());
    }

    #[test]
    fn closed_period_is_rejected() {
        let mut p = period();
        p.close().unwrap();
        let (e, c, map) = accounts();
        let err = Adjustment::create(depreciation(&p, e, c), &p, &map, "PAJ-0001".into(), "u", Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn unbalanced_lines_are_rejected() {
        let p = period();
        let (e, c, map) = accounts();
        let mut input = depreciation(&p, e, c);
        input.lines[1].credit = dec!(100);
        let err =
            Adjustment::create(input, &p, &map, "PAJ-0001".into(), "u", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn voided_adjustment_cannot_be_approved_or_voided_again() {
        let p = period();
        let (e, c, map) = accounts();
        let mut adj =
            Adjustment::create(depreciation(&p, e, c), &p, &map, "PAJ-0001".into(), "u", Utc::now())
                .unwrap();
        adj.approve("boss", Utc::now()).unwrap();
        assert_eq!(adj.approved_by.as_deref(), Some("boss"));
        adj.void("boss", Utc::now()).unwrap();
        assert!(matches!(adj.approve("boss", Utc::now()), Err(DomainError::Conflict(_))));
        assert!(matches!(adj.void("boss", Utc::now()), Err(DomainError::Conflict(_))));
        assert!(adj.apply_update(AdjustmentUpdate::default(), &p).is_err());
    }

    #[test]
    fn filter_orders_newest_first() {
        let p = period();
        let (e, c, map) = accounts();
        let mut first = depreciation(&p, e, c);
        first.date = date(2024, 3, 31);
        let a = Adjustment::create(first, &p, &map, "PAJ-0001".into(), "u", Utc::now()).unwrap();
        let b = Adjustment::create(depreciation(&p, e, c), &p, &map, "PAJ-0002".into(), "u", Utc::now())
            .unwrap();
        let listed = AdjustmentFilter::default().apply(vec![a.clone(), b.clone()]);
        assert_eq!(listed[0].number, "PAJ-0002");
        assert_eq!(listed[1].number, "PAJ-0001");
    }
}
