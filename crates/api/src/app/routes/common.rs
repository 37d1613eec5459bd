use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::app::errors::ServiceResult;

/// Serialize a service result with `status`, or map its error.
pub fn respond<T: Serialize>(status: StatusCode, result: ServiceResult<T>) -> axum::response::Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// List endpoints wrap rows as `{"items": [...]}`.
pub fn respond_items<T: Serialize>(result: ServiceResult<Vec<T>>) -> axum::response::Response {
    match result {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => e.into_response(),
    }
}
