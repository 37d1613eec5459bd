//! Company settings shown in report headers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use contaflow_core::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySettings {
    pub name: String,
    pub tax_id: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Reporting currency (ISO 4217 code).
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

impl CompanySettings {
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            name: "Empresa".to_string(),
            tax_id: String::new(),
            address: String::new(),
            phone: None,
            email: None,
            currency: "USD".to_string(),
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: CompanySettingsUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("company name must not be empty"));
            }
            self.name = name;
        }
        if let Some(tax_id) = update.tax_id {
            self.tax_id = tax_id.trim().to_string();
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if update.phone.is_some() {
            self.phone = update.phone;
        }
        if update.email.is_some() {
            self.email = update.email;
        }
        if let Some(currency) = update.currency {
            self.currency = crate::journal::normalize_currency(Some(&currency))?;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanySettingsUpdate {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_normalizes_currency() {
        let mut s = CompanySettings::defaults(Utc::now());
        s.apply_update(
            CompanySettingsUpdate {
                name: Some("Acme".into()),
                currency: Some("eur".into()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(s.name, "Acme");
        assert_eq!(s.currency, "EUR");
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut s = CompanySettings::defaults(Utc::now());
        let err = s
            .apply_update(
                CompanySettingsUpdate {
                    name: Some(" ".into()),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
