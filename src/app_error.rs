use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Uniform response envelope used by every route.
#[derive(Serialize, ToSchema)]
pub struct StdResponse<T: Serialize, M: Serialize> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

/// Service-wide error taxonomy. Every user-visible failure of a mutating
/// operation is one of these; nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("insufficient stock for variant {0}")]
    InsufficientStock(i32),
    #[error("insufficient wallet balance")]
    InsufficientBalance,
    #[error("already processed")]
    AlreadyProcessed,
    #[error("{0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InsufficientStock(_)
            | AppError::InsufficientBalance
            | AppError::AlreadyProcessed
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => AppError::NotFound,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => AppError::Conflict(format!("duplicate value: {}", info.message())),
            other => AppError::Other(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {:#}", self);
        }
        let body = StdResponse::<(), String> {
            data: None,
            message: Some(self.to_string()),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_failures_map_to_conflict() {
        assert_eq!(
            AppError::InsufficientStock(7).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InsufficientBalance.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::AlreadyProcessed.status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn auth_failures_are_distinct() {
        assert_eq!(
            AppError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("admin only".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn diesel_not_found_becomes_not_found() {
        let err: AppError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn transient_store_failure_is_retriable_class() {
        assert_eq!(
            AppError::StoreUnavailable("pool timed out".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
