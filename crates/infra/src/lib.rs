//! Infrastructure layer: configuration and persistence adapters.

pub mod config;
pub mod error;
pub mod store;

pub use config::{AppConfig, ConfigError, Persistence};
pub use error::{StoreError, StoreResult};
pub use store::{InMemoryStore, PostgresStore, Store};
