use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use contaflow_core::OpeningBalanceId;

use crate::app::dto;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_opening_balance))
        .route("/carry-forward", post(carry_forward))
        .route("/:id", get(get_opening_balance).put(update_opening_balance))
        .route("/:id/deactivate", post(deactivate_opening_balance))
}

pub async fn create_opening_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateOpeningRequest>,
) -> axum::response::Response {
    let input = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::CREATED,
        services.create_opening_balance(input, ctx.actor()).await,
    )
}

pub async fn get_opening_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OpeningBalanceId = match dto::parse_id(&id, "opening balance") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.get_opening_balance(id).await)
}

pub async fn update_opening_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOpeningRequest>,
) -> axum::response::Response {
    let id: OpeningBalanceId = match dto::parse_id(&id, "opening balance") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::OK,
        services
            .update_opening_balance(id, body.amount, body.notes, ctx.actor())
            .await,
    )
}

pub async fn deactivate_opening_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OpeningBalanceId = match dto::parse_id(&id, "opening balance") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.deactivate_opening_balance(id, ctx.actor()).await)
}

pub async fn carry_forward(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CarryForwardRequest>,
) -> axum::response::Response {
    let (source, target, earnings) = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .carry_forward_opening_balances(source, target, earnings, ctx.actor())
        .await
        .map(|items| serde_json::json!({ "items": items }));
    respond(StatusCode::CREATED, result)
}
