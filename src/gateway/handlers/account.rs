//! Account handlers (deposit, withdraw, balances)

use std::sync::Arc;

use axum::{Extension, Json, extract::State};

use super::super::state::PaymentsState;
use super::super::types::{
    ApiResponse, BalanceChangeData, DepositRequest, ValidJson, WithdrawRequest,
};
use crate::account::{AccountBalance, LedgerStore};
use crate::auth::Principal;
use crate::error::PaymentError;

/// Deposit into the caller's account (created on first deposit)
///
/// POST /api/v1/deposit
pub async fn deposit<S: LedgerStore + 'static>(
    State(state): State<Arc<PaymentsState<S>>>,
    Extension(principal): Extension<Principal>,
    ValidJson(req): ValidJson<DepositRequest>,
) -> Result<Json<ApiResponse<BalanceChangeData>>, PaymentError> {
    let change = state
        .ledger
        .deposit(principal.user_id(), &req.currency_ticker, req.amount)
        .await?;
    Ok(Json(ApiResponse::success(change.into())))
}

/// Withdraw from the caller's account
///
/// POST /api/v1/withdraw
pub async fn withdraw<S: LedgerStore + 'static>(
    State(state): State<Arc<PaymentsState<S>>>,
    Extension(principal): Extension<Principal>,
    ValidJson(req): ValidJson<WithdrawRequest>,
) -> Result<Json<ApiResponse<BalanceChangeData>>, PaymentError> {
    let change = state
        .ledger
        .withdraw(principal.user_id(), &req.currency_ticker, req.amount)
        .await?;
    Ok(Json(ApiResponse::success(change.into())))
}

/// List the caller's balances
///
/// GET /api/v1/balances
pub async fn get_balances<S: LedgerStore + 'static>(
    State(state): State<Arc<PaymentsState<S>>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<AccountBalance>>>, PaymentError> {
    let balances = state.ledger.balances(principal.user_id()).await?;
    Ok(Json(ApiResponse::success(balances)))
}
