use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use contaflow_core::ClientId;
use contaflow_invoicing::ClientStatus;

use crate::app::dto;
use crate::app::routes::common::{respond, respond_items};
use crate::app::services::AppServices;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/:id", get(get_client).put(update_client).delete(delete_client))
        .route("/:id/status", put(set_client_status))
}

pub async fn create_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateClientRequest>,
) -> axum::response::Response {
    respond(StatusCode::CREATED, services.create_client(body.into(), ctx.actor()).await)
}

pub async fn list_clients(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ClientListQuery>,
) -> axum::response::Response {
    respond_items(services.list_clients(&query.into_filter()).await)
}

pub async fn get_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClientId = match dto::parse_id(&id, "client") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.get_client(id).await)
}

pub async fn update_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateClientRequest>,
) -> axum::response::Response {
    let id: ClientId = match dto::parse_id(&id, "client") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.update_client(id, body.into()).await)
}

pub async fn set_client_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusRequest<ClientStatus>>,
) -> axum::response::Response {
    let id: ClientId = match dto::parse_id(&id, "client") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.set_client_status(id, body.status).await)
}

pub async fn delete_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClientId = match dto::parse_id(&id, "client") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    respond(StatusCode::OK, services.delete_client(id).await)
}
