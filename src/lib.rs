//! Payment System - auth service and payments ledger
//!
//! Two processes share this crate. The auth process registers users and
//! mints short-lived EdDSA tokens; the payments process trusts those tokens
//! through a cached copy of the auth service's public key and moves money
//! between per-currency accounts.
//!
//! # Modules
//!
//! - [`account`] - Accounts, balances and ledger records
//! - [`transfer`] - User-to-user transfers with ordered row locks
//! - [`auth`] - Public key trust cache and token verification
//! - [`user_auth`] - Registration, login and token issuing
//! - [`gateway`] - HTTP routers, handlers and response envelope
//! - [`error`] - Client-facing error taxonomy
//! - [`config`] / [`logging`] / [`db`] - Process plumbing

pub mod config;
pub mod db;
pub mod error;
pub mod logging;

pub mod account;
pub mod auth;
pub mod gateway;
pub mod transfer;
pub mod user_auth;

// Convenient re-exports at crate root
pub use account::{AccountLedger, PgLedgerStore, PgUserDirectory};
pub use auth::{KeyTrustCache, TokenVerifier};
pub use error::PaymentError;
pub use transfer::TransferCoordinator;
