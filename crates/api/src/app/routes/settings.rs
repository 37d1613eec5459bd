use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::app::dto;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/company", get(company_settings).put(update_company_settings))
        .route("/invoicing", get(invoicing_settings).put(update_invoicing_settings))
        .route("/system-check", get(system_check))
}

pub async fn company_settings(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    respond(StatusCode::OK, services.company_settings().await)
}

pub async fn update_company_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::UpdateSettingsRequest>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.update_company_settings(body.into()).await)
}

pub async fn invoicing_settings(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    respond(StatusCode::OK, services.invoicing_settings().await)
}

pub async fn update_invoicing_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::UpdateInvoicingSettingsRequest>,
) -> axum::response::Response {
    respond(StatusCode::OK, services.update_invoicing_settings(body.into()).await)
}

pub async fn system_check(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    respond(StatusCode::OK, services.system_check().await)
}
