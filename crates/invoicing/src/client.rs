//! Clients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_core::{ClientId, DomainError, DomainResult};

const CODE_PREFIX: &str = "CLI-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    NaturalPerson,
    LegalEntity,
}

impl ClientKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientKind::NaturalPerson => "natural_person",
            ClientKind::LegalEntity => "legal_entity",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "natural_person" => Ok(ClientKind::NaturalPerson),
            "legal_entity" => Ok(ClientKind::LegalEntity),
            other => Err(DomainError::validation(format!("unknown client kind '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Inactive,
    Blocked,
}

impl ClientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "active" => Ok(ClientStatus::Active),
            "inactive" => Ok(ClientStatus::Inactive),
            "blocked" => Ok(ClientStatus::Blocked),
            other => Err(DomainError::validation(format!("unknown client status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub code: String,
    pub name: String,
    pub last_name: Option<String>,
    pub trade_name: Option<String>,
    pub kind: ClientKind,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub credit_limit: Decimal,
    pub credit_days: i32,
    pub status: ClientStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    /// Generated when absent or blank.
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
    pub credit_limit: Decimal,
    pub credit_days: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientUpdate {
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

/// Next `CLI-NNNN` code after the highest numeric suffix among `existing`.
pub fn next_code<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let highest = existing
        .into_iter()
        .filter_map(|c| c.strip_prefix(CODE_PREFIX))
        .filter_map(|c| c.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{CODE_PREFIX}{:04}", highest + 1)
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_email(email: Option<&str>) -> DomainResult<()> {
    if let Some(email) = email {
        if !email.contains('@') {
            return Err(DomainError::validation(format!("invalid email '{email}'")));
        }
    }
    Ok(())
}

fn check_credit(limit: Decimal, days: i32) -> DomainResult<()> {
    if limit < Decimal::ZERO {
        return Err(DomainError::validation("credit limit must not be negative"));
    }
    if days < 0 {
        return Err(DomainError::validation("credit days must not be negative"));
    }
    Ok(())
}

impl Client {
    /// `tax_id_taken` tells whether another active client already uses the tax id.
    pub fn create(
        input: NewClient,
        generated_code: String,
        tax_id_taken: bool,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("client name must not be empty"));
        }
        let tax_id = blank_to_none(input.tax_id);
        if tax_id.is_some() && tax_id_taken {
            return Err(DomainError::conflict(format!(
                "an active client with tax id {} already exists",
                tax_id.as_deref().unwrap_or_default()
            )));
        }
        let email = blank_to_none(input.email);
        check_email(email.as_deref())?;
        check_credit(input.credit_limit, input.credit_days)?;

        Ok(Self {
            id: ClientId::new(),
            code: blank_to_none(input.code).unwrap_or(generated_code),
            name,
            last_name: blank_to_none(input.last_name),
            trade_name: blank_to_none(input.trade_name),
            kind: input.kind,
            tax_id,
            phone: blank_to_none(input.phone),
            email,
            address: blank_to_none(input.address),
            category: blank_to_none(input.category),
            credit_limit: input.credit_limit,
            credit_days: input.credit_days,
            status: ClientStatus::Active,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(
        &mut self,
        update: ClientUpdate,
        tax_id_taken: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("client name must not be empty"));
            }
            self.name = name;
        }
        if let Some(tax_id) = update.tax_id {
            let tax_id = blank_to_none(Some(tax_id));
            if tax_id.is_some() && tax_id != self.tax_id && tax_id_taken {
                return Err(DomainError::conflict("an active client with this tax id already exists"));
            }
            self.tax_id = tax_id;
        }
        if let Some(email) = update.email {
            let email = blank_to_none(Some(email));
            check_email(email.as_deref())?;
            self.email = email;
        }
        let limit = update.credit_limit.unwrap_or(self.credit_limit);
        let days = update.credit_days.unwrap_or(self.credit_days);
        check_credit(limit, days)?;
        self.credit_limit = limit;
        self.credit_days = days;

        if update.last_name.is_some() {
            self.last_name = blank_to_none(update.last_name);
        }
        if update.trade_name.is_some() {
            self.trade_name = blank_to_none(update.trade_name);
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if update.phone.is_some() {
            self.phone = blank_to_none(update.phone);
        }
        if update.address.is_some() {
            self.address = blank_to_none(update.address);
        }
        if update.category.is_some() {
            self.category = blank_to_none(update.category);
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn set_status(&mut self, status: ClientStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn is_active(&self) -> bool {
        self.status == ClientStatus::Active
    }

    /// Name as shown on reports: trade name, else name and last name.
    pub fn display_name(&self) -> String {
        if let Some(trade) = &self.trade_name {
            return trade.clone();
        }
        match &self.last_name {
            Some(last) => format!("{} {}", self.name, last),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFilter {
    /// Case-insensitive substring of code, name, trade name or tax id.
    pub search: Option<String>,
    pub status: Option<ClientStatus>,
    pub kind: Option<ClientKind>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for ClientFilter {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            kind: None,
            offset: 0,
            limit: 100,
        }
    }
}

impl ClientFilter {
    pub fn matches(&self, client: &Client) -> bool {
        if self.status.is_some_and(|s| s != client.status) {
            return false;
        }
        if self.kind.is_some_and(|k| k != client.kind) {
            return false;
        }
        if let Some(search) = self.search.as_deref() {
            let needle = search.to_lowercase();
            let hit = |v: Option<&str>| v.is_some_and(|v| v.to_lowercase().contains(&needle));
            if !(hit(Some(&client.code))
                || hit(Some(&client.name))
                || hit(client.last_name.as_deref())
                || hit(client.trade_name.as_deref())
                || hit(client.tax_id.as_deref()))
            {
                return false;
            }
        }
        true
    }

    /// Ordered by code.
    pub fn apply(&self, clients: impl IntoIterator<Item = Client>) -> Vec<Client> {
        let mut out: Vec<Client> = clients.into_iter().filter(|c| self.matches(c)).collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(name: &str) -> NewClient {
        NewClient {
            code: None,
            name: name.into(),
            last_name: None,
            trade_name: None,
            kind: ClientKind::LegalEntity,
            tax_id: Some("0614-010101-101-1".into()),
            phone: None,
            email: Some("billing@example.com".into()),
            address: None,
            category: None,
            credit_limit: dec!(1000),
            credit_days: 30,
        }
    }

    #[test]
    fn codes_follow_the_highest_existing() {
        assert_eq!(next_code(Vec::<&str>::new()), "CLI-0001");
        assert_eq!(next_code(["CLI-0002", "CLI-0010", "VIP-1"]), "CLI-0011");
    }

    #[test]
    fn create_uses_generated_code() {
        let c = Client::create(input("Acme"), "CLI-0001".into(), false, "u", Utc::now()).unwrap();
        assert_eq!(c.code, "CLI-0001");
        assert!(c.is_active());
    }

    #[test]
    fn duplicate_tax_id_is_a_conflict() {
        let err = Client::create(input("Acme"), "CLI-0001".into(), true, "u", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn negative_credit_is_rejected() {
        let mut i = input("Acme");
        i.credit_limit = dec!(-1);
        assert!(Client::create(i, "CLI-0001".into(), false, "u", Utc::now()).is_err());
        let mut i = input("Acme");
        i.credit_days = -1;
        assert!(Client::create(i, "CLI-0001".into(), false, "u", Utc::now()).is_err());
    }

    #[test]
    fn display_name_prefers_trade_name() {
        let mut c = Client::create(input("Juan"), "CLI-0001".into(), false, "u", Utc::now()).unwrap();
        c.last_name = Some("Pérez".into());
        assert_eq!(c.display_name(), "Juan Pérez");
        c.trade_name = Some("Ferretería JP".into());
        assert_eq!(c.display_name(), "Ferretería JP");
    }

    #[test]
    fn filter_by_search_and_status() {
        let a = Client::create(input("Acme"), "CLI-0001".into(), false, "u", Utc::now()).unwrap();
        let mut b = Client::create(input("Globex"), "CLI-0002".into(), false, "u", Utc::now()).unwrap();
        b.set_status(ClientStatus::Blocked, Utc::now());

        let f = ClientFilter {
            search: Some("acm".into()),
            ..Default::default()
        };
        assert_eq!(f.apply(vec![a.clone(), b.clone()]), vec![a.clone()]);

        let f = ClientFilter {
            status: Some(ClientStatus::Blocked),
            ..Default::default()
        };
        assert_eq!(f.apply(vec![a, b.clone()]), vec![b]);
    }
}
