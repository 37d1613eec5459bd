use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use contaflow_core::AdjustmentId;

use crate::app::dto;
use crate::app::routes::common::{respond, respond_items};
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_adjustments).post(create_adjustment))
        .route("/:id", get(get_adjustment).put(update_adjustment))
        .route("/:id/approve", post(approve_adjustment))
        .route("/:id/void", post(void_adjustment))
}

pub async fn create_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateAdjustmentRequest>,
) -> axum::response::Response {
    let input = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::CREATED, services.create_adjustment(input, ctx.actor()).await)
}

pub async fn list_adjustments(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::AdjustmentListQuery>,
) -> axum::response::Response {
    let filter = match query.into_filter() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond_items(services.list_adjustments(&filter).await)
}

pub async fn get_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AdjustmentId = match dto::parse_id(&id, "adjusting entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.get_adjustment(id).await)
}

pub async fn update_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateAdjustmentRequest>,
) -> axum::response::Response {
    let id: AdjustmentId = match dto::parse_id(&id, "adjusting entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.update_adjustment(id, body.into()).await)
}

pub async fn approve_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AdjustmentId = match dto::parse_id(&id, "adjusting entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.approve_adjustment(id, ctx.actor()).await)
}

pub async fn void_adjustment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AdjustmentId = match dto::parse_id(&id, "adjusting entry") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.void_adjustment(id, ctx.actor()).await)
}
