use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use contaflow_core::{PeriodId, StatementId};

use crate::app::dto;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(save_statement))
        .route("/balance-sheet", get(balance_sheet))
        .route("/income-statement", get(income_statement))
        .route("/:id", get(get_statement))
}

pub async fn balance_sheet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<dto::StatementQuery>,
) -> axum::response::Response {
    let period_id: PeriodId = match dto::parse_id(&query.period_id, "period") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services
            .balance_sheet_report(period_id, query.save, ctx.actor())
            .await,
    )
}

pub async fn income_statement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<dto::StatementQuery>,
) -> axum::response::Response {
    let period_id: PeriodId = match dto::parse_id(&query.period_id, "period") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services
            .income_statement_report(period_id, query.save, ctx.actor())
            .await,
    )
}

pub async fn save_statement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::SaveStatementRequest>,
) -> axum::response::Response {
    let period_id: PeriodId = match dto::parse_id(&body.period_id, "period") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::CREATED,
        services.save_statement(period_id, body.kind, ctx.actor()).await,
    )
}

pub async fn get_statement(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: StatementId = match dto::parse_id(&id, "statement") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.get_statement(id).await)
}
