//! Transfer Coordinator
//!
//! Moves an amount between two accounts of the same currency in one
//! transaction: debit sender, credit recipient, append one transfer record.
//! Either all three writes commit or none do.
//!
//! # Lock Ordering
//!
//! Both account rows are locked in ascending id order regardless of which one
//! is the sender, so A→B and B→A running concurrently queue on the same first
//! lock instead of each holding one and waiting for the other.

use std::sync::Arc;
use tracing::{debug, info};

use crate::account::ledger::{ensure_positive, resolve_currency};
use crate::account::models::{Account, TransferReceipt};
use crate::account::store::{
    AccountReader, AccountWriter, LedgerRecorder, LedgerStore, UserDirectory,
    complete_transaction,
};
use crate::error::PaymentError;

/// Order in which two account rows must be locked
pub fn lock_order(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}

async fn lock_pair<T>(
    tx: &mut T,
    sender_id: i64,
    recipient_id: i64,
) -> Result<(Account, Account), PaymentError>
where
    T: AccountReader,
{
    let (first, second) = lock_order(sender_id, recipient_id);

    let first_row = tx
        .lock_account(first)
        .await?
        .ok_or(PaymentError::AccountNotFound)?;
    let second_row = tx
        .lock_account(second)
        .await?
        .ok_or(PaymentError::AccountNotFound)?;

    if first_row.id == sender_id {
        Ok((first_row, second_row))
    } else {
        Ok((second_row, first_row))
    }
}

/// Transfer primitive running inside a caller-owned transaction.
///
/// Check order: amount, currency, recipient account, sender account, locks,
/// then funds on the locked sender balance.
pub async fn transfer_in<T>(
    tx: &mut T,
    sender_user_id: i64,
    recipient_user_id: i64,
    currency_ticker: &str,
    amount: i64,
) -> Result<TransferReceipt, PaymentError>
where
    T: AccountReader + AccountWriter + LedgerRecorder,
{
    ensure_positive(amount)?;
    if sender_user_id == recipient_user_id {
        return Err(PaymentError::SelfTransfer);
    }

    let currency = resolve_currency(tx, currency_ticker).await?;

    let recipient = tx
        .find_account(recipient_user_id, currency.id)
        .await?
        .ok_or(PaymentError::RecipientAccountNotFound)?;
    let sender = tx
        .find_account(sender_user_id, currency.id)
        .await?
        .ok_or(PaymentError::AccountNotFound)?;

    let (sender, recipient) = lock_pair(tx, sender.id, recipient.id).await?;

    if sender.balance < amount {
        return Err(PaymentError::InsufficientFunds {
            available: sender.balance,
            requested: amount,
        });
    }
    let recipient_balance = recipient
        .balance
        .checked_add(amount)
        .ok_or(PaymentError::AmountOverflow)?;

    let sender = tx.set_balance(sender.id, sender.balance - amount).await?;
    let recipient = tx.set_balance(recipient.id, recipient_balance).await?;
    let transfer = tx.record_transfer(&sender, &recipient, amount).await?;

    debug!(
        transfer_id = transfer.id,
        sender_account = sender.id,
        recipient_account = recipient.id,
        amount,
        "Transfer staged"
    );

    Ok(TransferReceipt {
        transfer,
        sender_balance: sender.balance,
        recipient_balance: recipient.balance,
    })
}

/// Transfer Coordinator - resolves identities and owns the transaction
pub struct TransferCoordinator<S> {
    store: Arc<S>,
    users: Arc<dyn UserDirectory>,
}

impl<S> Clone for TransferCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            users: self.users.clone(),
        }
    }
}

impl<S: LedgerStore> TransferCoordinator<S> {
    pub fn new(store: Arc<S>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    pub async fn transfer(
        &self,
        sender_user_id: i64,
        recipient_username: &str,
        currency_ticker: &str,
        amount: i64,
    ) -> Result<TransferReceipt, PaymentError> {
        ensure_positive(amount)?;

        let recipient = self
            .users
            .user_by_username(recipient_username)
            .await?
            .ok_or_else(|| PaymentError::RecipientNotFound(recipient_username.to_string()))?;
        if recipient.id == sender_user_id {
            return Err(PaymentError::SelfTransfer);
        }

        let mut tx = self.store.begin().await?;
        let result = transfer_in(
            &mut tx,
            sender_user_id,
            recipient.id,
            currency_ticker,
            amount,
        )
        .await;
        let receipt = complete_transaction(tx, result).await?;

        info!(
            transfer_id = receipt.transfer.id,
            sender = sender_user_id,
            recipient = recipient.id,
            currency = currency_ticker,
            amount,
            "Transfer committed"
        );
        Ok(receipt)
    }
}
