//! Payments HTTP handlers

pub mod account;
pub mod health;
pub mod transfer;

pub use account::{deposit, get_balances, withdraw};
pub use health::health_check;
pub use transfer::create_transfer;
