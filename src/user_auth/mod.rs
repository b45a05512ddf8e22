//! Token issuer side: signing keys, registration, login and key publishing

pub mod handlers;
pub mod keys;
pub mod service;

pub use keys::{IssuerKeys, TokenIssuer};
pub use service::{LoginRequest, RegisterRequest, UserAuthService};
