//! Payments API request/response DTOs
//!
//! Amounts are integer minor units on the wire. A JSON float (`1.5`) fails
//! deserialization and is reported as a validation error, never rounded.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::account::models::{BalanceChange, TransferReceipt};
use crate::error::PaymentError;

// ============================================================================
// ValidJson: JSON body + validator rules
// ============================================================================

/// JSON extractor that runs `validator` rules after deserialization.
///
/// Both failure modes surface as [`PaymentError::Validation`] so the client
/// always receives the unified envelope instead of axum's plain-text rejection.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = PaymentError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| PaymentError::Validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| PaymentError::Validation(e.to_string()))?;

        Ok(ValidJson(value))
    }
}

// ============================================================================
// Requests
// ============================================================================

/// POST /api/v1/deposit
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    #[validate(length(min = 1, max = 16))]
    pub currency_ticker: String,
    #[validate(range(min = 1))]
    pub amount: i64,
}

/// POST /api/v1/withdraw
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    #[validate(length(min = 1, max = 16))]
    pub currency_ticker: String,
    #[validate(range(min = 1))]
    pub amount: i64,
}

/// POST /api/v1/transfer
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[validate(length(min = 1, max = 64))]
    pub recipient_username: String,
    #[validate(length(min = 1, max = 16))]
    pub currency_ticker: String,
    #[validate(range(min = 1))]
    pub amount: i64,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChangeData {
    pub account_id: i64,
    pub balance: i64,
}

impl From<BalanceChange> for BalanceChangeData {
    fn from(change: BalanceChange) -> Self {
        Self {
            account_id: change.account_id,
            balance: change.balance,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferData {
    pub transfer_id: i64,
    pub currency_id: i32,
    pub amount: i64,
    pub sender_balance: i64,
    pub recipient_account_id: i64,
}

impl From<TransferReceipt> for TransferData {
    fn from(receipt: TransferReceipt) -> Self {
        Self {
            transfer_id: receipt.transfer.id,
            currency_id: receipt.transfer.currency_id,
            amount: receipt.transfer.amount,
            sender_balance: receipt.sender_balance,
            recipient_account_id: receipt.transfer.recipient_account_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub key_trust: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_fingerprint: Option<String>,
    /// Last successful key fetch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_refreshed_at: Option<DateTime<Utc>>,
    /// Most recent fetch failure while serving a stale key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_last_error: Option<String>,
}
