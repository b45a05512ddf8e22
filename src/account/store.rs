//! Store capabilities used by the ledger and the transfer coordinator
//!
//! A ledger transaction is an explicit value: it is acquired from a
//! [`LedgerStore`], passed by `&mut` into every primitive that shares it, and
//! consumed by [`LedgerTx::commit`] or [`LedgerTx::rollback`]. Dropping it
//! without committing discards all of its writes.
//!
//! Primitives depend only on the narrow capability they need:
//! - [`AccountReader`]: currency/account lookups and row locks
//! - [`AccountWriter`]: account creation and balance updates
//! - [`LedgerRecorder`]: append-only deposit/withdrawal/transfer records

use async_trait::async_trait;

use super::models::{Account, AccountBalance, Currency, Deposit, Transfer, User, Withdrawal};
use crate::error::PaymentError;

#[async_trait]
pub trait AccountReader: Send {
    async fn currency_by_ticker(&mut self, ticker: &str) -> Result<Option<Currency>, sqlx::Error>;

    /// Unlocked read of the (user, currency) account
    async fn find_account(
        &mut self,
        user_id: i64,
        currency_id: i32,
    ) -> Result<Option<Account>, sqlx::Error>;

    /// Read the account row and hold its lock until the transaction ends
    async fn lock_account(&mut self, account_id: i64) -> Result<Option<Account>, sqlx::Error>;

    async fn balances(&mut self, user_id: i64) -> Result<Vec<AccountBalance>, sqlx::Error>;
}

#[async_trait]
pub trait AccountWriter: Send {
    /// Insert a zero-balance account. Returns `None` if a concurrent
    /// transaction already created the (user, currency) row.
    async fn insert_account(
        &mut self,
        user_id: i64,
        currency_id: i32,
    ) -> Result<Option<Account>, sqlx::Error>;

    async fn set_balance(&mut self, account_id: i64, balance: i64) -> Result<Account, sqlx::Error>;
}

#[async_trait]
pub trait LedgerRecorder: Send {
    async fn record_deposit(&mut self, account: &Account, amount: i64)
    -> Result<Deposit, sqlx::Error>;

    async fn record_withdrawal(
        &mut self,
        account: &Account,
        amount: i64,
    ) -> Result<Withdrawal, sqlx::Error>;

    async fn record_transfer(
        &mut self,
        sender: &Account,
        recipient: &Account,
        amount: i64,
    ) -> Result<Transfer, sqlx::Error>;
}

/// An open ledger transaction
#[async_trait]
pub trait LedgerTx: AccountReader + AccountWriter + LedgerRecorder + Sized {
    async fn commit(self) -> Result<(), sqlx::Error>;
    async fn rollback(self) -> Result<(), sqlx::Error>;
}

/// Source of ledger transactions
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Tx: LedgerTx;

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error>;
}

/// User lookup collaborator (read-only)
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, sqlx::Error>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error>;
}

/// Commit on success, roll back on error.
///
/// A rollback failure is logged; the caller still receives the original error.
pub async fn complete_transaction<T, Tx>(
    tx: Tx,
    result: Result<T, PaymentError>,
) -> Result<T, PaymentError>
where
    Tx: LedgerTx,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(
                    error = %err,
                    rollback_error = %rollback_err,
                    "Failed to roll back ledger transaction"
                );
            }
            Err(err)
        }
    }
}
