use axum::{routing::get, Router};

pub mod accounts;
pub mod adjustments;
pub mod clients;
pub mod common;
pub mod invoices;
pub mod ledger;
pub mod openings;
pub mod periods;
pub mod products;
pub mod settings;
pub mod statements;
pub mod system;
pub mod transactions;
pub mod trial_balances;

/// Router for every `/api` endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/accounts", accounts::router())
        .nest("/periods", periods::router())
        .nest("/transactions", transactions::router())
        .nest("/opening-balances", openings::router())
        .nest("/adjustments", adjustments::router())
        .nest("/trial-balances", trial_balances::router())
        .nest("/ledger", ledger::router())
        .nest("/statements", statements::router())
        .nest("/settings", settings::router())
        .nest("/clients", clients::router())
        .nest("/products", products::router())
        .nest("/invoices", invoices::router())
}
