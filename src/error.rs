//! Payment error taxonomy
//!
//! Every failure surfaced by the ledger, the transfer coordinator or the HTTP layer
//! falls into one of five kinds:
//!
//! | Kind                | HTTP | Body                              |
//! |---------------------|------|-----------------------------------|
//! | `Validation`        | 400  | stable code + detail              |
//! | `NotFound`          | 404  | stable code + detail              |
//! | `InsufficientFunds` | 422  | stable code + detail              |
//! | `Auth`              | 401  | stable code + detail              |
//! | `Internal`          | 500  | opaque, details only in the logs  |

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::AuthError;
use crate::gateway::types::{ApiResponse, error_codes};

/// Coarse error classification used for status mapping and logging policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientFunds,
    Auth,
    Internal,
}

#[derive(Error, Debug)]
pub enum PaymentError {
    // === Validation Errors ===
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Amount would overflow the account balance")]
    AmountOverflow,

    #[error("Cannot transfer to yourself")]
    SelfTransfer,

    // === Not Found Errors ===
    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    #[error("Account not found for user and currency")]
    AccountNotFound,

    #[error("The recipient does not exist: {0}")]
    RecipientNotFound(String),

    #[error("The recipient does not have an account in that currency")]
    RecipientAccountNotFound,

    // === Business Rule Errors ===
    #[error("Not enough funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    // === Auth Errors ===
    #[error(transparent)]
    Auth(#[from] AuthError),

    // === System Errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Validation(_)
            | PaymentError::InvalidAmount
            | PaymentError::AmountOverflow
            | PaymentError::SelfTransfer => ErrorKind::Validation,
            PaymentError::CurrencyNotFound(_)
            | PaymentError::AccountNotFound
            | PaymentError::RecipientNotFound(_)
            | PaymentError::RecipientAccountNotFound => ErrorKind::NotFound,
            PaymentError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            PaymentError::Auth(e) if e.is_internal() => ErrorKind::Internal,
            PaymentError::Auth(_) => ErrorKind::Auth,
            PaymentError::Database(_) | PaymentError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the error name for logs
    pub fn name(&self) -> &'static str {
        match self {
            PaymentError::Validation(_) => "VALIDATION_FAILED",
            PaymentError::InvalidAmount => "INVALID_AMOUNT",
            PaymentError::AmountOverflow => "AMOUNT_OVERFLOW",
            PaymentError::SelfTransfer => "SELF_TRANSFER",
            PaymentError::CurrencyNotFound(_) => "CURRENCY_NOT_FOUND",
            PaymentError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            PaymentError::RecipientNotFound(_) => "RECIPIENT_NOT_FOUND",
            PaymentError::RecipientAccountNotFound => "RECIPIENT_ACCOUNT_NOT_FOUND",
            PaymentError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            PaymentError::Auth(e) => e.name(),
            PaymentError::Database(_) => "DATABASE_ERROR",
            PaymentError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Numeric code carried in the response envelope
    pub fn code(&self) -> i32 {
        match self {
            PaymentError::Validation(_) | PaymentError::InvalidAmount => {
                error_codes::INVALID_PARAMETER
            }
            PaymentError::AmountOverflow => error_codes::AMOUNT_OVERFLOW,
            PaymentError::SelfTransfer => error_codes::SELF_TRANSFER,
            PaymentError::CurrencyNotFound(_) => error_codes::CURRENCY_NOT_FOUND,
            PaymentError::AccountNotFound => error_codes::ACCOUNT_NOT_FOUND,
            PaymentError::RecipientNotFound(_) => error_codes::RECIPIENT_NOT_FOUND,
            PaymentError::RecipientAccountNotFound => error_codes::RECIPIENT_ACCOUNT_NOT_FOUND,
            PaymentError::InsufficientFunds { .. } => error_codes::INSUFFICIENT_BALANCE,
            PaymentError::Auth(e) => e.code(),
            PaymentError::Database(_) | PaymentError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            PaymentError::Auth(e) => e.http_status(),
            _ => match self.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::InsufficientFunds => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Auth => StatusCode::UNAUTHORIZED,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if self.kind() == ErrorKind::Internal {
            tracing::error!(error = %self, name = self.name(), "Request failed with internal error");
            let body = ApiResponse::<()>::error(error_codes::INTERNAL_ERROR, "Internal server error");
            return (status, Json(body)).into_response();
        }

        tracing::debug!(error = %self, name = self.name(), "Request rejected");
        (status, Json(ApiResponse::<()>::error(self.code(), self.to_string()))).into_response()
    }
}
