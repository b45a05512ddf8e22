//! Bearer-token middleware for the payments router.
//!
//! Rejects the request before it reaches a handler unless the token verifies
//! and its principal exists; on success the [`Principal`] is inserted into the
//! request extensions for `Extension<Principal>` extraction.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::error::AuthError;
use super::verifier::{Principal, TokenVerifier, bearer_token};

pub async fn require_bearer_token(
    State(verifier): State<Arc<TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal: Principal = {
        let header = request
            .headers()
            .get(header::AUTHORIZATION)
            .map(|value| {
                value
                    .to_str()
                    .map_err(|_| AuthError::TokenInvalid("non-ASCII Authorization header".into()))
            })
            .transpose()?;
        let token = bearer_token(header)?;
        verifier.authenticate(token).await?
    };

    debug!(
        user_id = principal.user_id(),
        path = %request.uri().path(),
        "Authenticated request"
    );
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
