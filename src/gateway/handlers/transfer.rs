//! Transfer handler

use std::sync::Arc;

use axum::{Extension, Json, extract::State};

use super::super::state::PaymentsState;
use super::super::types::{ApiResponse, TransferData, TransferRequest, ValidJson};
use crate::account::LedgerStore;
use crate::auth::Principal;
use crate::error::PaymentError;

/// Transfer to another user by username
///
/// POST /api/v1/transfer
pub async fn create_transfer<S: LedgerStore + 'static>(
    State(state): State<Arc<PaymentsState<S>>>,
    Extension(principal): Extension<Principal>,
    ValidJson(req): ValidJson<TransferRequest>,
) -> Result<Json<ApiResponse<TransferData>>, PaymentError> {
    let receipt = state
        .transfers
        .transfer(
            principal.user_id(),
            &req.recipient_username,
            &req.currency_ticker,
            req.amount,
        )
        .await?;
    Ok(Json(ApiResponse::success(receipt.into())))
}
