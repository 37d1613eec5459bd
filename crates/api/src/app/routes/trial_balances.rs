use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use contaflow_core::{PeriodId, TrialBalanceId};

use crate::app::dto;
use crate::app::routes::common::{respond, respond_items};
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(generate_trial_balance))
        .route("/validate", get(validate_trial_balance))
        .route("/analysis", get(trial_balance_analysis))
        .route("/:id", get(get_trial_balance))
}

pub async fn generate_trial_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::TrialBalanceRequest>,
) -> axum::response::Response {
    let period_id: PeriodId = match dto::parse_id(&body.period_id, "period") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::CREATED,
        services
            .generate_trial_balance(period_id, body.until, ctx.actor())
            .await,
    )
}

pub async fn validate_trial_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::TrialBalanceRequest>,
) -> axum::response::Response {
    let period_id: PeriodId = match dto::parse_id(&query.period_id, "period") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.validate_trial_balance(period_id, query.until).await)
}

pub async fn trial_balance_analysis(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::AnalysisQuery>,
) -> axum::response::Response {
    let period_id: PeriodId = match dto::parse_id(&query.period_id, "period") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(services.trial_balance_analysis(period_id, query.kind).await)
}

pub async fn get_trial_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TrialBalanceId = match dto::parse_id(&id, "trial balance") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.get_trial_balance(id).await)
}
