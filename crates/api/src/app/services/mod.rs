//! Application services: load rows from the store, run domain logic, persist.
//!
//! One file per area; every method returns a `ServiceResult` so handlers can
//! map failures uniformly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use contaflow_accounting::{Account, Period};
use contaflow_core::{AccountId, PeriodId};
use contaflow_infra::store::{AccountStore, PeriodStore};
use contaflow_infra::{AppConfig, InMemoryStore, Persistence, PostgresStore, Store};
use contaflow_invoicing::invoice::DEFAULT_SERIES;

use crate::app::errors::{ServiceError, ServiceResult};

mod accounts;
mod invoicing;
mod journal;
mod openings;
mod reports;

pub use reports::SavedStatement;

pub struct AppServices {
    store: Arc<dyn Store>,
    invoice_series: String,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, invoice_series: impl Into<String>) -> Self {
        Self {
            store,
            invoice_series: invoice_series.into(),
        }
    }

    /// Services over a fresh in-memory store (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()), DEFAULT_SERIES)
    }

    pub(crate) fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub(crate) async fn require_period(&self, id: PeriodId) -> ServiceResult<Period> {
        self.store
            .get_period(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("period {id}")))
    }

    pub(crate) async fn require_account(&self, id: AccountId) -> ServiceResult<Account> {
        self.store
            .get_account(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("account {id}")))
    }

    pub(crate) async fn accounts_by_id(&self) -> ServiceResult<HashMap<AccountId, Account>> {
        Ok(self
            .store
            .list_accounts()
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect())
    }
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Pick the store named by the configuration. Postgres stores get their
/// schema applied before use.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn Store> = match &config.persistence {
        Persistence::InMemory => {
            info!("using in-memory store");
            Arc::new(InMemoryStore::new())
        }
        Persistence::Postgres {
            database_url,
            max_connections,
        } => {
            let store = PostgresStore::connect(database_url, *max_connections).await?;
            store.apply_schema().await?;
            info!(max_connections, "using postgres store");
            Arc::new(store)
        }
    };
    Ok(AppServices::new(store, config.invoice_series.clone()))
}
