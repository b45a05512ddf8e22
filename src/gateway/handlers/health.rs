//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State};

use super::super::state::PaymentsState;
use super::super::types::{ApiResponse, HealthData};
use crate::account::LedgerStore;
use crate::auth::{AuthError, TrustState};
use crate::error::PaymentError;

/// Health check endpoint
///
/// Reports the key-trust state. Serving a stale key is still healthy: tokens
/// signed with it keep verifying. Without any key the process cannot
/// authenticate anyone and reports 503.
///
/// GET /api/v1/health
pub async fn health_check<S: LedgerStore + 'static>(
    State(state): State<Arc<PaymentsState<S>>>,
) -> Result<Json<ApiResponse<HealthData>>, PaymentError> {
    let keys = state.keys();
    let trust = keys.state();
    if trust == TrustState::Uninitialized {
        return Err(AuthError::KeyUnavailable.into());
    }

    Ok(Json(ApiResponse::success(HealthData {
        key_trust: trust.as_str().to_string(),
        key_fingerprint: keys.current().map(|key| key.fingerprint()),
        key_refreshed_at: keys.refreshed_at(),
        key_last_error: keys.last_error().map(|e| e.to_string()),
    })))
}
