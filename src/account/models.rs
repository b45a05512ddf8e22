//! Data models for accounts and ledger records
//!
//! Balances and amounts are integer minor units (`i64`). Ledger records
//! (`Deposit`, `Withdrawal`, `Transfer`) are append-only: nothing in the crate
//! updates or deletes them after the transaction that wrote them commits.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Registered user, as seen by the payments side (no password hash).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Currency definition
#[derive(Debug, Clone, FromRow)]
pub struct Currency {
    pub id: i32,
    pub name: String,
    /// Short code, e.g. "USD"
    pub ticker: String,
    /// Number of minor-unit digits (2 for cents)
    pub decimals: i16,
}

/// One balance per (user, currency)
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub currency_id: i32,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Deposit {
    pub id: i64,
    pub account_id: i64,
    pub currency_id: i32,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub account_id: i64,
    pub currency_id: i32,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Transfer {
    pub id: i64,
    pub sender_account_id: i64,
    pub recipient_account_id: i64,
    pub currency_id: i32,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Balance line returned by `GET /api/v1/balances`
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub account_id: i64,
    pub ticker: String,
    pub name: String,
    pub decimals: i16,
    pub balance: i64,
}

/// Result of a single-account mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub account_id: i64,
    pub balance: i64,
}

impl From<&Account> for BalanceChange {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id,
            balance: account.balance,
        }
    }
}

/// Result of a committed transfer
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub transfer: Transfer,
    pub sender_balance: i64,
    pub recipient_balance: i64,
}
