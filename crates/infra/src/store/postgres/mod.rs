//! PostgreSQL-backed store.
//!
//! ## Error Mapping
//!
//! | sqlx error | SQLSTATE | StoreError |
//! |---|---|---|
//! | unique violation | `23505` | `Conflict` |
//! | foreign key violation | `23503` | `Conflict` |
//! | check violation | `23514` | `Database` |
//! | anything else | | `Database` |
//!
//! Multi-row writes (entry headers plus lines, invoices plus their ledger
//! postings, carried-forward balances) run inside a single transaction.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use tracing::{info, instrument, warn};

use contaflow_core::DomainResult;

use crate::error::{StoreError, StoreResult};

mod accounting;
mod invoicing;
pub mod schema;

/// Store over a `sqlx` connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool of at most `max_connections` connections.
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create missing tables, indexes and views.
    #[instrument(skip(self), err)]
    pub async fn apply_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(schema::SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("apply_schema", e))?;
        info!("database schema applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map sqlx errors to `StoreError`.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(match db_err.constraint() {
                    Some(c) => format!("{msg} ({c})"),
                    None => msg,
                }),
                Some("23503") => StoreError::Conflict(msg),
                _ => {
                    warn!(operation, error = %msg, "database error");
                    StoreError::Database(msg)
                }
            }
        }
        sqlx::Error::RowNotFound => StoreError::not_found(format!("{operation}: row not found")),
        sqlx::Error::PoolClosed => StoreError::Database(format!("{operation}: connection pool closed")),
        other => {
            warn!(operation, error = %other, "sqlx error");
            StoreError::Database(format!("{operation}: {other}"))
        }
    }
}

/// Read a column, reporting decode failures as serialization errors.
pub(crate) fn col<'r, T>(row: &'r PgRow, name: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Serialization(format!("column {name}: {e}")))
}

/// Read a text column holding an enum value.
pub(crate) fn enum_col<T>(row: &PgRow, name: &str, parse: fn(&str) -> DomainResult<T>) -> StoreResult<T> {
    let raw: String = col(row, name)?;
    parse(&raw).map_err(|e| StoreError::Serialization(format!("column {name}: {e}")))
}

/// Fail with `NotFound` when an update touched no row.
pub(crate) fn expect_one(affected: u64, what: &str) -> StoreResult<()> {
    if affected == 0 {
        return Err(StoreError::not_found(what.to_string()));
    }
    Ok(())
}
