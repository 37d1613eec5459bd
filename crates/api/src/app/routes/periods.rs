use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use contaflow_core::PeriodId;

use crate::app::dto;
use crate::app::routes::common::{respond, respond_items};
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_periods).post(create_period))
        .route("/:id", get(get_period))
        .route("/:id/close", post(close_period))
        .route("/:id/reopen", post(reopen_period))
        .route("/:id/ledger", get(period_ledger))
        .route("/:id/trial-balances", get(list_trial_balances))
        .route("/:id/statements", get(statement_history))
        .route("/:id/opening-balances", get(list_opening_balances))
        .route("/:id/opening-balances/summary", get(opening_summary))
        .route("/:id/opening-balances/deactivate", post(deactivate_all_opening_balances))
}

fn period_id(raw: &str) -> Result<PeriodId, axum::response::Response> {
    dto::parse_id(raw, "period")
}

pub async fn create_period(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreatePeriodRequest>,
) -> axum::response::Response {
    respond(StatusCode::CREATED, services.create_period(body.into()).await)
}

pub async fn list_periods(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    respond_items(services.list_periods().await)
}

pub async fn get_period(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match period_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.get_period(id).await)
}

pub async fn close_period(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match period_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.close_period(id).await)
}

pub async fn reopen_period(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match period_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.reopen_period(id).await)
}

pub async fn period_ledger(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match period_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(services.period_ledger(id).await)
}

pub async fn list_trial_balances(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match period_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(services.list_trial_balances(id).await)
}

pub async fn statement_history(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match period_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(services.statement_history(id).await)
}

pub async fn list_opening_balances(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match period_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(services.list_opening_balances(id).await)
}

pub async fn opening_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match period_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.opening_summary(id).await)
}

pub async fn deactivate_all_opening_balances(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match period_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .deactivate_all_opening_balances(id, ctx.actor())
        .await
        .map(|count| serde_json::json!({ "period_id": id, "deactivated": count }));
    respond(StatusCode::OK, result)
}
