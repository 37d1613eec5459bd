//! Chart of accounts and account manuals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use contaflow_core::{AccountId, DomainError, DomainResult, ManualId};

/// High-level account kind (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountKind {
    pub const ALL: [AccountKind; 5] = [
        AccountKind::Asset,
        AccountKind::Liability,
        AccountKind::Equity,
        AccountKind::Income,
        AccountKind::Expense,
    ];

    /// Asset and expense accounts carry debit balances; the rest credit balances.
    pub fn normal_side(self) -> Side {
        match self {
            AccountKind::Asset | AccountKind::Expense => Side::Debit,
            AccountKind::Liability | AccountKind::Equity | AccountKind::Income => Side::Credit,
        }
    }

    pub fn is_debit_normal(self) -> bool {
        self.normal_side() == Side::Debit
    }

    /// Column a balance expressed in normal-side terms sits in.
    pub fn balance_side(self, balance: Decimal) -> Side {
        if balance >= Decimal::ZERO {
            self.normal_side()
        } else {
            self.normal_side().opposite()
        }
    }

    /// Kinds that appear on the balance sheet and carry forward between periods.
    pub fn is_permanent(self) -> bool {
        matches!(
            self,
            AccountKind::Asset | AccountKind::Liability | AccountKind::Equity
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Asset => "asset",
            AccountKind::Liability => "liability",
            AccountKind::Equity => "equity",
            AccountKind::Income => "income",
            AccountKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "asset" => Ok(AccountKind::Asset),
            "liability" => Ok(AccountKind::Liability),
            "equity" => Ok(AccountKind::Equity),
            "income" => Ok(AccountKind::Income),
            "expense" => Ok(AccountKind::Expense),
            other => Err(DomainError::validation(format!("unknown account kind '{other}'"))),
        }
    }
}

/// Debit or credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Debit => Side::Credit,
            Side::Credit => Side::Debit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Debit => "debit",
            Side::Credit => "credit",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "debit" => Ok(Side::Debit),
            "credit" => Ok(Side::Credit),
            other => Err(DomainError::validation(format!("unknown side '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(DomainError::validation(format!("unknown account status '{other}'"))),
        }
    }
}

/// Chart-of-accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub code: String, // e.g. "110101"
    pub name: String, // e.g. "Caja general"
    pub kind: AccountKind,
    pub parent_id: Option<AccountId>,
    /// Depth in the tree; roots are level 1.
    pub level: i32,
    pub accepts_postings: bool,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub parent_id: Option<AccountId>,
    pub accepts_postings: bool,
}

/// Partial update. `parent_id: Some(None)` detaches the account from its parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub accepts_postings: Option<bool>,
    pub status: Option<AccountStatus>,
    pub parent_id: Option<Option<AccountId>>,
}

impl Account {
    /// `parent` must be the account referenced by `input.parent_id`, if any.
    pub fn create(
        input: NewAccount,
        parent: Option<&Account>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let code = input.code.trim().to_string();
        let name = input.name.trim().to_string();
        if code.is_empty() {
            return Err(DomainError::validation("account code must not be empty"));
        }
        if code.len() > 20 {
            return Err(DomainError::validation("account code must be at most 20 characters"));
        }
        if name.is_empty() {
            return Err(DomainError::validation("account name must not be empty"));
        }

        let level = level_under(input.parent_id, parent)?;

        Ok(Self {
            id: AccountId::new(),
            code,
            name,
            kind: input.kind,
            parent_id: input.parent_id,
            level,
            accepts_postings: input.accepts_postings,
            status: AccountStatus::Active,
            created_at: now,
        })
    }

    pub fn apply_update(&mut self, update: AccountUpdate, parent: Option<&Account>) -> DomainResult<()> {
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("account name must not be empty"));
            }
            self.name = name;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(flag) = update.accepts_postings {
            self.accepts_postings = flag;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(parent_id) = update.parent_id {
            if parent_id == Some(self.id) {
                return Err(DomainError::validation("an account cannot be its own parent"));
            }
            self.level = level_under(parent_id, parent)?;
            self.parent_id = parent_id;
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Postings are only allowed on active detail accounts.
    pub fn ensure_postable(&self) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::validation(format!(
                "account {} is inactive",
                self.code
            )));
        }
        if !self.accepts_postings {
            return Err(DomainError::validation(format!(
                "account {} does not accept postings",
                self.code
            )));
        }
        Ok(())
    }
}

fn level_under(parent_id: Option<AccountId>, parent: Option<&Account>) -> DomainResult<i32> {
    match (parent_id, parent) {
        (None, _) => Ok(1),
        (Some(id), Some(p)) if p.id == id => Ok(p.level + 1),
        (Some(_), _) => Err(DomainError::not_found("parent account")),
    }
}

/// Deletion is only allowed for leaf accounts without postings.
pub fn ensure_deletable(account: &Account, has_children: bool, has_postings: bool) -> DomainResult<()> {
    if has_children {
        return Err(DomainError::conflict(format!(
            "account {} has child accounts",
            account.code
        )));
    }
    if has_postings {
        return Err(DomainError::conflict(format!(
            "account {} has postings",
            account.code
        )));
    }
    Ok(())
}

/// Listing filter for the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFilter {
    pub kind: Option<AccountKind>,
    pub status: Option<AccountStatus>,
    /// Case-insensitive substring of code or name.
    pub search: Option<String>,
    pub accepts_postings: Option<bool>,
    pub level: Option<i32>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for AccountFilter {
    fn default() -> Self {
        Self {
            kind: None,
            status: None,
            search: None,
            accepts_postings: None,
            level: None,
            offset: 0,
            limit: 100,
        }
    }
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        if self.kind.is_some_and(|k| k != account.kind) {
            return false;
        }
        if self.status.is_some_and(|s| s != account.status) {
            return false;
        }
        if self.accepts_postings.is_some_and(|f| f != account.accepts_postings) {
            return false;
        }
        if self.level.is_some_and(|l| l != account.level) {
            return false;
        }
        if let Some(search) = self.search.as_deref() {
            let needle = search.to_lowercase();
            if !account.code.to_lowercase().contains(&needle)
                && !account.name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    /// Filter, order by code and page an in-memory list.
    pub fn apply(&self, accounts: impl IntoIterator<Item = Account>) -> Vec<Account> {
        let mut out: Vec<Account> = accounts.into_iter().filter(|a| self.matches(a)).collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        out.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

/// Balance-sheet classification override stored in an account manual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceClassification {
    Current,
    NonCurrent,
}

impl BalanceClassification {
    pub fn as_str(self) -> &'static str {
        match self {
            BalanceClassification::Current => "current",
            BalanceClassification::NonCurrent => "non_current",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "current" => Ok(BalanceClassification::Current),
            "non_current" => Ok(BalanceClassification::NonCurrent),
            other => Err(DomainError::validation(format!(
                "unknown balance classification '{other}'"
            ))),
        }
    }
}

/// Descriptive manual attached to a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountManual {
    pub id: ManualId,
    pub account_id: AccountId,
    pub description: String,
    pub nature: Side,
    pub classification: Option<BalanceClassification>,
    pub usage: Option<String>,
    pub examples: Option<String>,
    pub related_accounts: Option<String>,
    pub regulation: Option<String>,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualInput {
    pub description: String,
    /// Defaults to the account's normal side.
    pub nature: Option<Side>,
    pub classification: Option<BalanceClassification>,
    pub usage: Option<String>,
    pub examples: Option<String>,
    pub related_accounts: Option<String>,
    pub regulation: Option<String>,
}

impl AccountManual {
    pub fn create(
        account: &Account,
        input: ManualInput,
        user: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation("manual description must not be empty"));
        }
        Ok(Self {
            id: ManualId::new(),
            account_id: account.id,
            description,
            nature: input.nature.unwrap_or(account.kind.normal_side()),
            classification: input.classification,
            usage: input.usage,
            examples: input.examples,
            related_accounts: input.related_accounts,
            regulation: input.regulation,
            updated_by: user.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces every editable field.
    pub fn replace(&mut self, input: ManualInput, user: &str, now: DateTime<Utc>) -> DomainResult<()> {
        let description = input.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation("manual description must not be empty"));
        }
        self.description = description;
        if let Some(nature) = input.nature {
            self.nature = nature;
        }
        self.classification = input.classification;
        self.usage = input.usage;
        self.examples = input.examples;
        self.related_accounts = input.related_accounts;
        self.regulation = input.regulation;
        self.updated_by = user.to_string();
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(code: &str, kind: AccountKind, parent: Option<&Account>) -> Account {
        Account::create(
            NewAccount {
                code: code.to_string(),
                name: format!("Account {code}"),
                kind,
                parent_id: parent.map(|p| p.id),
                accepts_postings: true,
            },
            parent,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn level_follows_parent() {
        let root = new_account("1", AccountKind::Asset, None);
        let child = new_account("11", AccountKind::Asset, Some(&root));
        let grandchild = new_account("1101", AccountKind::Asset, Some(&child));
        assert_eq!(root.level, 1);
        assert_eq!(child.level, 2);
        assert_eq!(grandchild.level, 3);
    }

    #[test]
    fn empty_code_is_rejected() {
        let err = Account::create(
            NewAccount {
                code: "  ".into(),
                name: "Cash".into(),
                kind: AccountKind::Asset,
                parent_id: None,
                accepts_postings: true,
            },
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn missing_parent_is_not_found() {
        let err = Account::create(
            NewAccount {
                code: "11".into(),
                name: "Current".into(),
                kind: AccountKind::Asset,
                parent_id: Some(AccountId::new()),
                accepts_postings: false,
            },
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn normal_sides() {
        assert_eq!(AccountKind::Asset.normal_side(), Side::Debit);
        assert_eq!(AccountKind::Expense.normal_side(), Side::Debit);
        assert_eq!(AccountKind::Liability.normal_side(), Side::Credit);
        assert_eq!(AccountKind::Equity.normal_side(), Side::Credit);
        assert_eq!(AccountKind::Income.normal_side(), Side::Credit);
    }

    #[test]
    fn cannot_be_own_parent() {
        let mut a = new_account("1", AccountKind::Asset, None);
        let me = a.clone();
        let err = a
            .apply_update(
                AccountUpdate {
                    parent_id: Some(Some(me.id)),
                    ..Default::default()
                },
                Some(&me),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn filter_searches_code_and_name_case_insensitively() {
        let mut cash = new_account("1101", AccountKind::Asset, None);
        cash.name = "Caja General".into();
        let sales = new_account("4101", AccountKind::Income, None);

        let filter = AccountFilter {
            search: Some("CAJA".into()),
            ..Default::default()
        };
        let found = filter.apply(vec![sales.clone(), cash.clone()]);
        assert_eq!(found, vec![cash.clone()]);

        let by_code = AccountFilter {
            search: Some("41".into()),
            ..Default::default()
        };
        assert_eq!(by_code.apply(vec![cash, sales.clone()]), vec![sales]);
    }

    #[test]
    fn filter_orders_by_code_and_pages() {
        let accounts: Vec<Account> = ["3", "1", "2"]
            .iter()
            .map(|c| new_account(c, AccountKind::Asset, None))
            .collect();
        let filter = AccountFilter {
            offset: 1,
            limit: 1,
            ..Default::default()
        };
        let page = filter.apply(accounts);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].code, "2");
    }

    #[test]
    fn delete_rules() {
        let a = new_account("1", AccountKind::Asset, None);
        assert!(ensure_deletable(&a, false, false).is_ok());
        assert!(matches!(
            ensure_deletable(&a, true, false),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            ensure_deletable(&a, false, true),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn inactive_or_summary_accounts_reject_postings() {
        let mut a = new_account("1", AccountKind::Asset, None);
        assert!(a.ensure_postable().is_ok());
        a.accepts_postings = false;
        assert!(a.ensure_postable().is_err());
        a.accepts_postings = true;
        a.status = AccountStatus::Inactive;
        assert!(a.ensure_postable().is_err());
    }

    #[test]
    fn manual_nature_defaults_to_normal_side() {
        let a = new_account("2101", AccountKind::Liability, None);
        let manual = AccountManual::create(
            &a,
            ManualInput {
                description: "Suppliers".into(),
                nature: None,
                classification: Some(BalanceClassification::Current),
                usage: None,
                examples: None,
                related_accounts: None,
                regulation: None,
            },
            "system",
            Utc::now(),
        )
        .unwrap();
        assert_eq!(manual.nature, Side::Credit);
    }
}
