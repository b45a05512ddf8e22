//! Bearer token verification
//!
//! Tokens are compact JWS signed with Ed25519 (`alg: EdDSA`). The declared
//! algorithm is checked before anything else: a token announcing any other
//! algorithm is rejected even if its signature bytes would verify under the
//! cached key.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::key_cache::KeyTrustCache;
use super::key_source::VerificationKey;
use crate::account::models::User;
use crate::account::store::UserDirectory;

pub const EXPECTED_ALGORITHM: Algorithm = Algorithm::EdDSA;

/// Token claims. `sub` carries the user id as a decimal string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

/// Authenticated identity attached to the request
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Principal {
    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?.trim();
    if value.is_empty() {
        return Err(AuthError::MissingToken);
    }
    // Scheme names are case-insensitive
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::TokenInvalid("expected Bearer scheme".to_string()));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

pub struct TokenVerifier {
    keys: Arc<KeyTrustCache>,
    users: Arc<dyn UserDirectory>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyTrustCache>, users: Arc<dyn UserDirectory>, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(EXPECTED_ALGORITHM);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = leeway_secs;
        Self {
            keys,
            users,
            validation,
        }
    }

    pub fn keys(&self) -> &Arc<KeyTrustCache> {
        &self.keys
    }

    /// Check algorithm, signature and expiry against `key`.
    pub fn verify(&self, token: &str, key: &VerificationKey) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::TokenInvalid(e.to_string()))?;
        if header.alg != EXPECTED_ALGORITHM {
            return Err(AuthError::TokenInvalid(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }

        let data = decode::<Claims>(token, key.decoding_key(), &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::MissingRequiredClaim(claim) => AuthError::ClaimMissing(claim.clone()),
                _ => AuthError::TokenInvalid(e.to_string()),
            },
        )?;

        Ok(data.claims)
    }

    /// Verify against the cached key and resolve the principal.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let key = self.keys.current().ok_or(AuthError::KeyUnavailable)?;
        let claims = self.verify(token, &key)?;

        let sub = claims
            .sub
            .ok_or_else(|| AuthError::ClaimMissing("sub".to_string()))?;
        let user_id: i64 = sub
            .parse()
            .map_err(|_| AuthError::TokenInvalid(format!("non-numeric subject {sub:?}")))?;

        let user = self
            .users
            .user_by_id(user_id)
            .await
            .map_err(|e| AuthError::Lookup(e.to_string()))?
            .ok_or(AuthError::UnknownPrincipal(user_id))?;

        let expires_at = claims
            .exp
            .and_then(|exp| i64::try_from(exp).ok())
            .and_then(|exp| DateTime::from_timestamp(exp, 0));

        Ok(Principal { user, expires_at })
    }
}
