use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use contaflow_core::AccountId;

use crate::app::dto;
use crate::app::routes::common::{respond, respond_items};
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/:id", get(get_account).put(update_account).delete(delete_account))
        .route(
            "/:id/manual",
            get(get_manual).post(create_manual).put(update_manual).delete(delete_manual),
        )
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateAccountRequest>,
) -> axum::response::Response {
    let input = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::CREATED, services.create_account(input).await)
}

pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::AccountListQuery>,
) -> axum::response::Response {
    respond_items(services.list_accounts(&query.into_filter()).await)
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse_id(&id, "account") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.get_account(id).await)
}

pub async fn update_account(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateAccountRequest>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse_id(&id, "account") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let update = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.update_account(id, update).await)
}

pub async fn delete_account(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse_id(&id, "account") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.delete_account(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_manual(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse_id(&id, "account") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.get_manual(id).await)
}

pub async fn create_manual(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ManualRequest>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse_id(&id, "account") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(
        StatusCode::CREATED,
        services.create_manual(id, body.into(), ctx.actor()).await,
    )
}

pub async fn update_manual(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ManualRequest>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse_id(&id, "account") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.update_manual(id, body.into(), ctx.actor()).await)
}

pub async fn delete_manual(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse_id(&id, "account") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.delete_manual(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
