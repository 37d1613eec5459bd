use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::context::RequestContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    axum::extract::Extension(ctx): axum::extract::Extension<RequestContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({ "actor": ctx.actor() }))
}
