//! Token trust on the payments side
//!
//! ## Components
//! - `key_source`: fetching and decoding the auth service's public key
//! - `key_cache`: last-known-good key with startup retries and background refresh
//! - `verifier`: EdDSA token verification and principal resolution
//! - `middleware`: Axum bearer-token middleware
//! - `error`: `AuthError` and `KeyTrustError`

pub mod error;
pub mod key_cache;
pub mod key_source;
pub mod middleware;
pub mod verifier;

// Re-export for convenience
pub use error::{AuthError, KeyTrustError};
pub use key_cache::{KeyTrustCache, TrustState};
pub use key_source::{
    HttpKeySource, KeySource, PublicKeyResponse, VerificationKey, decode_key_blob,
};
pub use middleware::require_bearer_token;
pub use verifier::{Claims, Principal, TokenVerifier, bearer_token};
