use tracing::info;

use contaflow_accounting::account::ensure_deletable;
use contaflow_accounting::{
    Account, AccountFilter, AccountManual, AccountUpdate, ManualInput, NewAccount,
};
use contaflow_core::{AccountId, DomainError};
use contaflow_infra::store::AccountStore;

use super::{AppServices, now};
use crate::app::errors::{ServiceError, ServiceResult};

impl AppServices {
    pub async fn create_account(&self, input: NewAccount) -> ServiceResult<Account> {
        let parent = match input.parent_id {
            Some(id) => Some(self.require_account(id).await?),
            None => None,
        };
        let account = Account::create(input, parent.as_ref(), now())?;
        self.store().insert_account(&account).await?;
        info!(account_id = %account.id, code = %account.code, "account created");
        Ok(account)
    }

    pub async fn list_accounts(&self, filter: &AccountFilter) -> ServiceResult<Vec<Account>> {
        Ok(filter.apply(self.store().list_accounts().await?))
    }

    pub async fn get_account(&self, id: AccountId) -> ServiceResult<Account> {
        self.require_account(id).await
    }

    pub async fn update_account(&self, id: AccountId, update: AccountUpdate) -> ServiceResult<Account> {
        let mut account = self.require_account(id).await?;
        let parent = match update.parent_id {
            Some(Some(parent_id)) if parent_id != id => Some(self.require_account(parent_id).await?),
            _ => None,
        };
        if let Some(p) = &parent {
            if self.is_descendant(p, id).await? {
                return Err(DomainError::validation(format!(
                    "account {} is a descendant of {}",
                    p.code, account.code
                ))
                .into());
            }
        }
        account.apply_update(update, parent.as_ref())?;
        self.store().update_account(&account).await?;
        info!(account_id = %account.id, "account updated");
        Ok(account)
    }

    /// Whether `candidate` sits somewhere below `ancestor` in the tree.
    async fn is_descendant(&self, candidate: &Account, ancestor: AccountId) -> ServiceResult<bool> {
        let accounts = self.accounts_by_id().await?;
        let mut cursor = candidate.parent_id;
        let mut hops = 0;
        while let Some(id) = cursor {
            if id == ancestor {
                return Ok(true);
            }
            hops += 1;
            if hops > accounts.len() {
                break;
            }
            cursor = accounts.get(&id).and_then(|a| a.parent_id);
        }
        Ok(false)
    }

    pub async fn delete_account(&self, id: AccountId) -> ServiceResult<()> {
        let account = self.require_account(id).await?;
        let has_children = self.store().account_has_children(id).await?;
        let has_postings = self.store().account_has_postings(id).await?;
        ensure_deletable(&account, has_children, has_postings)?;
        self.store().delete_account(id).await?;
        info!(account_id = %id, code = %account.code, "account deleted");
        Ok(())
    }

    pub async fn get_manual(&self, account_id: AccountId) -> ServiceResult<AccountManual> {
        self.require_account(account_id).await?;
        self.store()
            .get_manual(account_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("manual of account {account_id}")))
    }

    pub async fn create_manual(
        &self,
        account_id: AccountId,
        input: ManualInput,
        actor: &str,
    ) -> ServiceResult<AccountManual> {
        let account = self.require_account(account_id).await?;
        if self.store().get_manual(account_id).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "account {} already has a manual",
                account.code
            ))
            .into());
        }
        let manual = AccountManual::create(&account, input, actor, now())?;
        self.store().insert_manual(&manual).await?;
        Ok(manual)
    }

    pub async fn update_manual(
        &self,
        account_id: AccountId,
        input: ManualInput,
        actor: &str,
    ) -> ServiceResult<AccountManual> {
        let mut manual = self.get_manual(account_id).await?;
        manual.replace(input, actor, now())?;
        self.store().update_manual(&manual).await?;
        Ok(manual)
    }

    pub async fn delete_manual(&self, account_id: AccountId) -> ServiceResult<()> {
        self.get_manual(account_id).await?;
        self.store().delete_manual(account_id).await?;
        Ok(())
    }
}
