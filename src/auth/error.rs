//! Authentication and key-trust error types.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::error::PaymentError;
use crate::gateway::types::error_codes;

/// Failure to authenticate a request or a login attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Token is missing required claim: {0}")]
    ClaimMissing(String),

    #[error("Token principal {0} does not exist")]
    UnknownPrincipal(i64),

    #[error("Invalid username, email or password")]
    InvalidCredentials,

    #[error("Token verification key is not available")]
    KeyUnavailable,

    /// User lookup failed for infrastructure reasons
    #[error("Principal lookup failed: {0}")]
    Lookup(String),
}

impl AuthError {
    pub fn name(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::TokenInvalid(_) => "TOKEN_INVALID",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::ClaimMissing(_) => "CLAIM_MISSING",
            AuthError::UnknownPrincipal(_) => "UNKNOWN_PRINCIPAL",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::KeyUnavailable => "KEY_UNAVAILABLE",
            AuthError::Lookup(_) => "PRINCIPAL_LOOKUP_FAILED",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            AuthError::MissingToken => error_codes::MISSING_AUTH,
            AuthError::TokenInvalid(_) | AuthError::UnknownPrincipal(_) => error_codes::AUTH_FAILED,
            AuthError::TokenExpired => error_codes::TOKEN_EXPIRED,
            AuthError::ClaimMissing(_) => error_codes::CLAIM_MISSING,
            AuthError::InvalidCredentials => error_codes::INVALID_CREDENTIALS,
            AuthError::KeyUnavailable => error_codes::SERVICE_UNAVAILABLE,
            AuthError::Lookup(_) => error_codes::INTERNAL_ERROR,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            AuthError::KeyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Infrastructure failure rather than a rejected credential
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::Lookup(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        PaymentError::Auth(self).into_response()
    }
}

/// Failure to obtain or decode the published verification key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyTrustError {
    #[error("key fetch failed: {0}")]
    Fetch(String),

    #[error("key endpoint returned HTTP {0}")]
    Status(u16),

    #[error("malformed key blob: {0}")]
    Malformed(String),

    #[error("key fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("no verification key after {attempts} attempts, last error: {last_error}")]
    StartupExhausted { attempts: u32, last_error: String },
}
