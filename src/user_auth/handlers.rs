use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::service::{LoginData, LoginRequest, RegisterRequest, RegisteredUser};
use crate::auth::PublicKeyResponse;
use crate::error::PaymentError;
use crate::gateway::state::AuthServiceState;
use crate::gateway::types::{ApiResponse, ValidJson};

/// Register a new user
///
/// POST /api/v1/register
pub async fn register(
    State(state): State<Arc<AuthServiceState>>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUser>>), PaymentError> {
    let user = state.users.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RegisteredUser::from(user))),
    ))
}

/// Login user
///
/// POST /api/v1/login
pub async fn login(
    State(state): State<Arc<AuthServiceState>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>, PaymentError> {
    let data = state.users.login(req).await?;
    Ok(Json(ApiResponse::success(data)))
}

/// Publish the token verification key (internal listener only)
///
/// GET /jwt-public-key
pub async fn jwt_public_key(State(state): State<Arc<AuthServiceState>>) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        public_key: state.users.issuer().keys().public_key_base64(),
    })
}
