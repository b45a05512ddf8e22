//! AccountLedger: per-(user, currency) balances
//!
//! Two layers:
//! - transaction-scoped primitives ([`get_or_create_account`], [`deposit_into`],
//!   [`withdraw_from`]) that run inside a caller-owned transaction and may be
//!   composed (the transfer coordinator reuses them);
//! - [`AccountLedger`] methods that own one transaction per call.
//!
//! Every balance mutation locks the account row first and computes the new
//! balance from the locked value, so concurrent mutations serialize per account.

use std::sync::Arc;

use tracing::debug;

use super::models::{Account, AccountBalance, BalanceChange, Currency};
use super::store::{
    AccountReader, AccountWriter, LedgerRecorder, LedgerStore, complete_transaction,
};
use crate::error::PaymentError;

pub(crate) fn ensure_positive(amount: i64) -> Result<(), PaymentError> {
    if amount <= 0 {
        return Err(PaymentError::InvalidAmount);
    }
    Ok(())
}

pub(crate) async fn resolve_currency<T>(tx: &mut T, ticker: &str) -> Result<Currency, PaymentError>
where
    T: AccountReader,
{
    tx.currency_by_ticker(ticker)
        .await?
        .ok_or_else(|| PaymentError::CurrencyNotFound(ticker.to_string()))
}

/// Look up the (user, currency) account, creating a zero-balance row if absent.
///
/// Losing a creation race is not an error: the insert reports a conflict and
/// the row committed by the other request is re-fetched.
pub async fn get_or_create_account<T>(
    tx: &mut T,
    user_id: i64,
    currency_ticker: &str,
) -> Result<Account, PaymentError>
where
    T: AccountReader + AccountWriter,
{
    let currency = resolve_currency(tx, currency_ticker).await?;

    if let Some(account) = tx.find_account(user_id, currency.id).await? {
        return Ok(account);
    }

    if let Some(account) = tx.insert_account(user_id, currency.id).await? {
        debug!(
            user_id,
            currency = %currency.ticker,
            account_id = account.id,
            "Created account"
        );
        return Ok(account);
    }

    // Conflict: another transaction created it between our read and insert
    tx.find_account(user_id, currency.id)
        .await?
        .ok_or(PaymentError::AccountNotFound)
}

/// Credit `amount` to the account and append a deposit record.
pub async fn deposit_into<T>(tx: &mut T, account: &Account, amount: i64) -> Result<Account, PaymentError>
where
    T: AccountReader + AccountWriter + LedgerRecorder,
{
    ensure_positive(amount)?;

    let locked = tx
        .lock_account(account.id)
        .await?
        .ok_or(PaymentError::AccountNotFound)?;
    let new_balance = locked
        .balance
        .checked_add(amount)
        .ok_or(PaymentError::AmountOverflow)?;

    let updated = tx.set_balance(locked.id, new_balance).await?;
    tx.record_deposit(&updated, amount).await?;
    Ok(updated)
}

/// Debit `amount` from the account and append a withdrawal record.
pub async fn withdraw_from<T>(tx: &mut T, account: &Account, amount: i64) -> Result<Account, PaymentError>
where
    T: AccountReader + AccountWriter + LedgerRecorder,
{
    ensure_positive(amount)?;

    let locked = tx
        .lock_account(account.id)
        .await?
        .ok_or(PaymentError::AccountNotFound)?;
    if locked.balance < amount {
        return Err(PaymentError::InsufficientFunds {
            available: locked.balance,
            requested: amount,
        });
    }

    let updated = tx.set_balance(locked.id, locked.balance - amount).await?;
    tx.record_withdrawal(&updated, amount).await?;
    Ok(updated)
}

/// Transaction-owning ledger operations
pub struct AccountLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for AccountLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: LedgerStore> AccountLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Deposit into the user's account, creating it on first deposit.
    pub async fn deposit(
        &self,
        user_id: i64,
        currency_ticker: &str,
        amount: i64,
    ) -> Result<BalanceChange, PaymentError> {
        ensure_positive(amount)?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let account = get_or_create_account(&mut tx, user_id, currency_ticker).await?;
            deposit_into(&mut tx, &account, amount).await
        }
        .await;

        let account = complete_transaction(tx, result).await?;
        debug!(user_id, account_id = account.id, amount, balance = account.balance, "Deposit committed");
        Ok(BalanceChange::from(&account))
    }

    /// Withdraw from the user's existing account.
    pub async fn withdraw(
        &self,
        user_id: i64,
        currency_ticker: &str,
        amount: i64,
    ) -> Result<BalanceChange, PaymentError> {
        ensure_positive(amount)?;

        let mut tx = self.store.begin().await?;
        let result = async {
            let currency = resolve_currency(&mut tx, currency_ticker).await?;
            let account = tx
                .find_account(user_id, currency.id)
                .await?
                .ok_or(PaymentError::AccountNotFound)?;
            withdraw_from(&mut tx, &account, amount).await
        }
        .await;

        let account = complete_transaction(tx, result).await?;
        debug!(user_id, account_id = account.id, amount, balance = account.balance, "Withdrawal committed");
        Ok(BalanceChange::from(&account))
    }

    pub async fn balances(&self, user_id: i64) -> Result<Vec<AccountBalance>, PaymentError> {
        let mut tx = self.store.begin().await?;
        let result = tx.balances(user_id).await.map_err(PaymentError::from);
        complete_transaction(tx, result).await
    }
}
