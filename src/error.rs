//! Error handling module
//!
//! Gateway error type and HTTP response conversion.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{LedgerError, RecordKind};
use crate::state::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Ledger errors
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            AppError::Ledger(ledger_err) => ledger_status(ledger_err),
        }
    }
}

/// Map a ledger failure to its HTTP status and stable error code
fn ledger_status(err: &LedgerError) -> (StatusCode, &'static str, Option<String>) {
    match err {
        // 404 Not Found
        LedgerError::NotFound { kind, id } => {
            let code = match kind {
                RecordKind::Account => "account_not_found",
                RecordKind::Transaction => "transaction_not_found",
                RecordKind::Transfer => "transfer_not_found",
            };
            (StatusCode::NOT_FOUND, code, Some(id.clone()))
        }

        // 409 Conflict
        LedgerError::AlreadyExists(id) => {
            (StatusCode::CONFLICT, "account_already_exists", Some(id.clone()))
        }
        LedgerError::Duplicate {
            account_id,
            reference_number,
        } => (
            StatusCode::CONFLICT,
            "duplicate_reference",
            Some(format!("{account_id}:{reference_number}")),
        ),
        LedgerError::Storage(StoreError::Conflict { .. }) => {
            (StatusCode::CONFLICT, "version_conflict", None)
        }

        // 400 Bad Request
        LedgerError::InvalidAmount(msg) => {
            (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.clone()))
        }
        LedgerError::InvalidIdentifier(msg) => {
            (StatusCode::BAD_REQUEST, "invalid_identifier", Some(msg.clone()))
        }
        LedgerError::SameAccountTransfer => {
            (StatusCode::BAD_REQUEST, "same_account_transfer", None)
        }

        // 422 Unprocessable Entity
        LedgerError::InsufficientFunds { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_funds",
            Some(err.to_string()),
        ),
        LedgerError::InactiveAccount { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "inactive_account",
            Some(err.to_string()),
        ),
        LedgerError::InvalidTransition { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_transition",
            Some(err.to_string()),
        ),

        // 500 Internal Server Error
        LedgerError::Serialization(msg) => {
            tracing::error!("Serialization error: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", None)
        }
        LedgerError::Storage(e) => {
            tracing::error!("Storage error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_not_found_is_404() {
        let err = AppError::from(LedgerError::account_not_found("A"));
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflicts_are_409() {
        assert_eq!(
            status_of(LedgerError::duplicate("A", "r1").into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(LedgerError::AlreadyExists("A".to_string()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                LedgerError::Storage(StoreError::Conflict {
                    key: "k".to_string()
                })
                .into()
            ),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_business_rule_failures_are_422() {
        assert_eq!(
            status_of(LedgerError::insufficient_funds(10, 5).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_bad_input_is_400() {
        assert_eq!(
            status_of(LedgerError::InvalidAmount("zero".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::InvalidRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_failure_is_500() {
        assert_eq!(
            status_of(LedgerError::Storage(StoreError::Backend("down".to_string())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
