use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use contaflow_core::DomainError;
use contaflow_infra::StoreError;

/// Failure of an application service call.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // Domain failures raised inside a store transaction keep their status.
            StoreError::Domain(e) => Self::Domain(e),
            other => Self::Store(other),
        }
    }
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Domain(DomainError::not_found(what))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Domain(DomainError::validation(msg))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServiceError::Domain(e) => domain_error_to_response(e),
            ServiceError::Store(StoreError::Conflict(msg)) => {
                json_error(StatusCode::CONFLICT, "conflict", msg)
            }
            ServiceError::Store(StoreError::NotFound(msg)) => {
                json_error(StatusCode::NOT_FOUND, "not_found", msg)
            }
            ServiceError::Store(e) => {
                error!(error = %e, "store failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
            }
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::invalid_id("x"), StatusCode::BAD_REQUEST),
            (DomainError::invariant("x"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::conflict("x"), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ServiceError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let conflict = ServiceError::from(StoreError::conflict("dup"));
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let db = ServiceError::from(StoreError::Database("down".into()));
        assert_eq!(db.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let wrapped = ServiceError::from(StoreError::Domain(DomainError::validation("bad")));
        assert!(matches!(wrapped, ServiceError::Domain(_)));
    }
}
