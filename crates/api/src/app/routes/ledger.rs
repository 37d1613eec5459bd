use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::get,
    Router,
};

use contaflow_core::AccountId;

use crate::app::dto;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/accounts/:id", get(account_ledger))
}

pub async fn account_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<dto::LedgerParams>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse_id(&id, "account") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let query = match params.into_query() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.account_ledger(id, query).await)
}
