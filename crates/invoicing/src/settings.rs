//! Invoicing parameters and the system readiness check.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_accounting::period::open_period_for;
use contaflow_accounting::{Account, CompanySettings, Period};
use contaflow_core::{DomainError, DomainResult};

use crate::posting::find_account;
use crate::product::default_vat_rate;

/// Account code prefixes used to locate posting accounts, plus the VAT rate
/// given to products created without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicingSettings {
    pub receivables_prefix: String,
    pub sales_prefix: String,
    pub vat_payable_prefix: String,
    pub cash_prefix: String,
    pub default_vat_rate: Decimal,
    /// `None` until the settings are saved for the first time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for InvoicingSettings {
    fn default() -> Self {
        Self {
            receivables_prefix: "1103".to_string(),
            sales_prefix: "4101".to_string(),
            vat_payable_prefix: "2104".to_string(),
            cash_prefix: "1101".to_string(),
            default_vat_rate: default_vat_rate(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoicingSettingsUpdate {
    pub receivables_prefix: Option<String>,
    pub sales_prefix: Option<String>,
    pub vat_payable_prefix: Option<String>,
    pub cash_prefix: Option<String>,
    pub default_vat_rate: Option<Decimal>,
}

fn prefix(raw: String, label: &str) -> DomainResult<String> {
    let raw = raw.trim().to_string();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::validation(format!(
            "{label} prefix must be a non-empty string of digits"
        )));
    }
    Ok(raw)
}

impl InvoicingSettings {
    /// Apply every field or none.
    pub fn apply_update(&mut self, update: InvoicingSettingsUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(p) = update.receivables_prefix {
            next.receivables_prefix = prefix(p, "receivables")?;
        }
        if let Some(p) = update.sales_prefix {
            next.sales_prefix = prefix(p, "sales")?;
        }
        if let Some(p) = update.vat_payable_prefix {
            next.vat_payable_prefix = prefix(p, "VAT payable")?;
        }
        if let Some(p) = update.cash_prefix {
            next.cash_prefix = prefix(p, "cash")?;
        }
        if let Some(rate) = update.default_vat_rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(DomainError::validation("vat rate must be between 0 and 100"));
            }
            next.default_vat_rate = rate;
        }
        next.updated_at = Some(now);
        *self = next;
        Ok(())
    }

    /// `(label, prefix)` of every account invoices post to.
    pub fn posting_prefixes(&self) -> [(&'static str, &str); 4] {
        [
            ("receivables", &self.receivables_prefix),
            ("sales", &self.sales_prefix),
            ("VAT payable", &self.vat_payable_prefix),
            ("cash", &self.cash_prefix),
        ]
    }
}

/// Outcome of one readiness area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupCheck {
    pub area: String,
    pub ready: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SetupCheck {
    fn new(area: &str, errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            area: area.to_string(),
            ready: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemCheck {
    /// No area reported an error.
    pub ready: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub checks: Vec<SetupCheck>,
    pub recommendations: Vec<String>,
}

/// Whether the books are set up well enough to issue and post invoices.
///
/// Missing posting accounts and the lack of any open period are errors;
/// placeholder company data, no open period covering `today`, and
/// never-saved invoicing settings are warnings.
pub fn check_system(
    company: &CompanySettings,
    settings: &InvoicingSettings,
    accounts: &[Account],
    periods: &[Period],
    today: NaiveDate,
) -> SystemCheck {
    let defaults = CompanySettings::defaults(company.updated_at);
    let mut company_warnings = Vec::new();
    if company.name == defaults.name {
        company_warnings.push("company name is still the default".to_string());
    }
    if company.tax_id.trim().is_empty() {
        company_warnings.push("company tax id is not set".to_string());
    }

    let account_errors: Vec<String> = settings
        .posting_prefixes()
        .into_iter()
        .filter(|(_, p)| find_account(accounts, p).is_none())
        .map(|(label, p)| format!("no active {label} account with code prefix {p}"))
        .collect();

    let mut period_errors = Vec::new();
    let mut period_warnings = Vec::new();
    if !periods.iter().any(Period::is_open) {
        period_errors.push("no open accounting period".to_string());
    } else if open_period_for(periods, today).is_none() {
        period_warnings.push(format!("no open period contains {today}"));
    }

    let mut invoicing_warnings = Vec::new();
    if settings.updated_at.is_none() {
        invoicing_warnings.push("invoicing settings have never been saved".to_string());
    }

    let checks = vec![
        SetupCheck::new("company", Vec::new(), company_warnings),
        SetupCheck::new("posting_accounts", account_errors, Vec::new()),
        SetupCheck::new("open_period", period_errors, period_warnings),
        SetupCheck::new("invoicing", Vec::new(), invoicing_warnings),
    ];

    let mut recommendations: Vec<String> = checks
        .iter()
        .filter_map(|c| {
            let text = match (c.area.as_str(), c.ready, c.warnings.is_empty()) {
                ("company", _, false) => "complete the company name and tax id",
                ("posting_accounts", false, _) => "create the receivables, sales, VAT payable and cash accounts",
                ("open_period", false, _) => "create an accounting period",
                ("open_period", true, false) => "create or reopen a period covering today",
                ("invoicing", _, false) => "review and save the invoicing settings",
                _ => return None,
            };
            Some(text.to_string())
        })
        .collect();
    if recommendations.is_empty() {
        recommendations.push("the system is ready".to_string());
    }

    let error_count = checks.iter().map(|c| c.errors.len()).sum();
    let warning_count = checks.iter().map(|c| c.warnings.len()).sum();
    SystemCheck {
        ready: error_count == 0,
        error_count,
        warning_count,
        checks,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contaflow_accounting::{AccountKind, NewAccount, NewPeriod, PeriodKind};
    use rust_decimal_macros::dec;

    fn account(code: &str, kind: AccountKind) -> Account {
        Account::create(
            NewAccount {
                code: code.into(),
                name: format!("Account {code}"),
                kind,
                parent_id: None,
                accepts_postings: true,
            },
            None,
            Utc::now(),
        )
        .unwrap()
    }

    fn january() -> Period {
        Period::create(
            NewPeriod {
                start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
                kind: PeriodKind::Monthly,
                description: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn full_chart() -> Vec<Account> {
        vec![
            account("1101001", AccountKind::Asset),
            account("1103001", AccountKind::Asset),
            account("2104001", AccountKind::Liability),
            account("4101001", AccountKind::Income),
        ]
    }

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn update_validates_before_applying() {
        let mut s = InvoicingSettings::default();
        let err = s
            .apply_update(
                InvoicingSettingsUpdate {
                    sales_prefix: Some("4102".into()),
                    cash_prefix: Some("caja".into()),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(s, InvoicingSettings::default());

        s.apply_update(
            InvoicingSettingsUpdate {
                sales_prefix: Some(" 4102 ".into()),
                default_vat_rate: Some(dec!(15)),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(s.sales_prefix, "4102");
        assert_eq!(s.default_vat_rate, dec!(15));
        assert!(s.updated_at.is_some());
    }

    #[test]
    fn vat_rate_is_bounded() {
        let mut s = InvoicingSettings::default();
        let update = InvoicingSettingsUpdate {
            default_vat_rate: Some(dec!(101)),
            ..Default::default()
        };
        assert!(s.apply_update(update, Utc::now()).is_err());
    }

    #[test]
    fn empty_books_are_not_ready() {
        let company = CompanySettings::defaults(Utc::now());
        let check = check_system(&company, &InvoicingSettings::default(), &[], &[], jan(10));
        assert!(!check.ready);
        // four posting accounts plus the missing period
        assert_eq!(check.error_count, 5);
        let areas: Vec<&str> = check.checks.iter().filter(|c| !c.ready).map(|c| c.area.as_str()).collect();
        assert_eq!(areas, vec!["posting_accounts", "open_period"]);
    }

    #[test]
    fn configured_books_are_ready() {
        let mut company = CompanySettings::defaults(Utc::now());
        company.name = "Acme".into();
        company.tax_id = "0614-010190-101-1".into();
        let mut settings = InvoicingSettings::default();
        settings.apply_update(InvoicingSettingsUpdate::default(), Utc::now()).unwrap();

        let check = check_system(&company, &settings, &full_chart(), &[january()], jan(10));
        assert!(check.ready);
        assert_eq!(check.warning_count, 0);
        assert_eq!(check.recommendations, vec!["the system is ready".to_string()]);
    }

    #[test]
    fn period_not_covering_today_is_a_warning() {
        let company = CompanySettings::defaults(Utc::now());
        let check = check_system(
            &company,
            &InvoicingSettings::default(),
            &full_chart(),
            &[january()],
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        );
        assert!(check.ready);
        let period = check.checks.iter().find(|c| c.area == "open_period").unwrap();
        assert_eq!(period.warnings.len(), 1);
    }
}
