//! In-memory ledger store for tests
//!
//! Emulates the parts of PostgreSQL the ledger relies on:
//! - `lock_account` holds a per-row async mutex until commit/rollback
//!   (`SELECT ... FOR UPDATE`);
//! - balance updates and records are staged per transaction and published on
//!   commit;
//! - an inserted account is visible immediately so a second insert for the
//!   same (user, currency) reports a conflict, and is removed on rollback or
//!   when the transaction is dropped without commit.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OwnedMutexGuard;

use super::models::{Account, AccountBalance, Currency, Deposit, Transfer, User, Withdrawal};
use super::store::{
    AccountReader, AccountWriter, LedgerRecorder, LedgerStore, LedgerTx, UserDirectory,
};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    users: Vec<User>,
    currencies: Vec<Currency>,
    accounts: BTreeMap<i64, Account>,
    deposits: Vec<Deposit>,
    withdrawals: Vec<Withdrawal>,
    transfers: Vec<Transfer>,
    row_locks: HashMap<i64, Arc<tokio::sync::Mutex<()>>>,
    failing_accounts: HashSet<i64>,
    rolled_back: usize,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<MemoryState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str) -> User {
        let mut state = self.shared.state();
        let user = User {
            id: state.next_id(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: username.to_string(),
            last_name: "Test".to_string(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        user
    }

    pub fn add_currency(&self, ticker: &str, name: &str, decimals: i16) -> Currency {
        let mut state = self.shared.state();
        let currency = Currency {
            id: state.next_id() as i32,
            name: name.to_string(),
            ticker: ticker.to_string(),
            decimals,
        };
        state.currencies.push(currency.clone());
        currency
    }

    /// Create a committed account whose balance is backed by one deposit record
    pub fn seed_balance(&self, user_id: i64, currency_id: i32, balance: i64) -> Account {
        let mut state = self.shared.state();
        let now = Utc::now();
        let account = Account {
            id: state.next_id(),
            user_id,
            currency_id,
            balance,
            created_at: now,
            updated_at: now,
        };
        let deposit = Deposit {
            id: state.next_id(),
            account_id: account.id,
            currency_id,
            amount: balance,
            created_at: now,
        };
        state.accounts.insert(account.id, account.clone());
        state.deposits.push(deposit);
        account
    }

    pub fn account(&self, user_id: i64, currency_id: i32) -> Option<Account> {
        self.shared
            .state()
            .accounts
            .values()
            .find(|a| a.user_id == user_id && a.currency_id == currency_id)
            .cloned()
    }

    pub fn account_count(&self) -> usize {
        self.shared.state().accounts.len()
    }

    pub fn balance_of(&self, account_id: i64) -> i64 {
        self.shared
            .state()
            .accounts
            .get(&account_id)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    pub fn deposits_for(&self, account_id: i64) -> Vec<Deposit> {
        let state = self.shared.state();
        state
            .deposits
            .iter()
            .filter(|d| d.account_id == account_id)
            .cloned()
            .collect()
    }

    pub fn withdrawals_for(&self, account_id: i64) -> Vec<Withdrawal> {
        let state = self.shared.state();
        state
            .withdrawals
            .iter()
            .filter(|w| w.account_id == account_id)
            .cloned()
            .collect()
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.shared.state().transfers.clone()
    }

    /// deposits - withdrawals - outgoing + incoming, from committed records only
    pub fn ledger_balance(&self, account_id: i64) -> i64 {
        let state = self.shared.state();
        let deposits: i64 = state
            .deposits
            .iter()
            .filter(|d| d.account_id == account_id)
            .map(|d| d.amount)
            .sum();
        let withdrawals: i64 = state
            .withdrawals
            .iter()
            .filter(|w| w.account_id == account_id)
            .map(|w| w.amount)
            .sum();
        let outgoing: i64 = state
            .transfers
            .iter()
            .filter(|t| t.sender_account_id == account_id)
            .map(|t| t.amount)
            .sum();
        let incoming: i64 = state
            .transfers
            .iter()
            .filter(|t| t.recipient_account_id == account_id)
            .map(|t| t.amount)
            .sum();
        deposits - withdrawals - outgoing + incoming
    }

    /// Make every later `set_balance` on this account fail
    pub fn fail_balance_updates_for(&self, account_id: i64) {
        self.shared.state().failing_accounts.insert(account_id);
    }

    pub fn rolled_back_count(&self) -> usize {
        self.shared.state().rolled_back
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, sqlx::Error> {
        Ok(MemoryTx {
            shared: self.shared.clone(),
            row_guards: HashMap::new(),
            staged_balances: HashMap::new(),
            created_accounts: Vec::new(),
            deposits: Vec::new(),
            withdrawals: Vec::new(),
            transfers: Vec::new(),
        })
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>, sqlx::Error> {
        let state = self.shared.state();
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let state = self.shared.state();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }
}

pub struct MemoryTx {
    shared: Arc<Shared>,
    row_guards: HashMap<i64, OwnedMutexGuard<()>>,
    staged_balances: HashMap<i64, i64>,
    created_accounts: Vec<i64>,
    deposits: Vec<Deposit>,
    withdrawals: Vec<Withdrawal>,
    transfers: Vec<Transfer>,
}

impl MemoryTx {
    /// Committed row with this transaction's staged balance applied
    fn visible(&self, account: &Account) -> Account {
        let mut account = account.clone();
        if let Some(balance) = self.staged_balances.get(&account.id) {
            account.balance = *balance;
        }
        account
    }
}

#[async_trait]
impl AccountReader for MemoryTx {
    async fn currency_by_ticker(&mut self, ticker: &str) -> Result<Option<Currency>, sqlx::Error> {
        let state = self.shared.state();
        Ok(state.currencies.iter().find(|c| c.ticker == ticker).cloned())
    }

    async fn find_account(
        &mut self,
        user_id: i64,
        currency_id: i32,
    ) -> Result<Option<Account>, sqlx::Error> {
        let found = self
            .shared
            .state()
            .accounts
            .values()
            .find(|a| a.user_id == user_id && a.currency_id == currency_id)
            .cloned();
        Ok(found.map(|a| self.visible(&a)))
    }

    async fn lock_account(&mut self, account_id: i64) -> Result<Option<Account>, sqlx::Error> {
        if !self.row_guards.contains_key(&account_id) {
            let row_lock = {
                let mut state = self.shared.state();
                if !state.accounts.contains_key(&account_id) {
                    return Ok(None);
                }
                state.row_locks.entry(account_id).or_default().clone()
            };
            let guard = row_lock.lock_owned().await;
            self.row_guards.insert(account_id, guard);
        }

        let found = self.shared.state().accounts.get(&account_id).cloned();
        Ok(found.map(|a| self.visible(&a)))
    }

    async fn balances(&mut self, user_id: i64) -> Result<Vec<AccountBalance>, sqlx::Error> {
        let state = self.shared.state();
        let balances = state
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| {
                let currency = state.currencies.iter().find(|c| c.id == a.currency_id)?;
                Some(AccountBalance {
                    account_id: a.id,
                    ticker: currency.ticker.clone(),
                    name: currency.name.clone(),
                    decimals: currency.decimals,
                    balance: a.balance,
                })
            })
            .collect();
        Ok(balances)
    }
}

#[async_trait]
impl AccountWriter for MemoryTx {
    async fn insert_account(
        &mut self,
        user_id: i64,
        currency_id: i32,
    ) -> Result<Option<Account>, sqlx::Error> {
        let mut state = self.shared.state();
        let exists = state
            .accounts
            .values()
            .any(|a| a.user_id == user_id && a.currency_id == currency_id);
        if exists {
            return Ok(None);
        }

        let now = Utc::now();
        let account = Account {
            id: state.next_id(),
            user_id,
            currency_id,
            balance: 0,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(account.id, account.clone());
        self.created_accounts.push(account.id);
        Ok(Some(account))
    }

    async fn set_balance(&mut self, account_id: i64, balance: i64) -> Result<Account, sqlx::Error> {
        let current = {
            let state = self.shared.state();
            if state.failing_accounts.contains(&account_id) {
                return Err(sqlx::Error::Protocol(format!(
                    "injected write failure on account {account_id}"
                )));
            }
            state.accounts.get(&account_id).cloned()
        };
        let mut account = current.ok_or(sqlx::Error::RowNotFound)?;
        if balance < 0 {
            return Err(sqlx::Error::Protocol(
                "balance check constraint violated".to_string(),
            ));
        }

        self.staged_balances.insert(account_id, balance);
        account.balance = balance;
        account.updated_at = Utc::now();
        Ok(account)
    }
}

#[async_trait]
impl LedgerRecorder for MemoryTx {
    async fn record_deposit(
        &mut self,
        account: &Account,
        amount: i64,
    ) -> Result<Deposit, sqlx::Error> {
        let deposit = Deposit {
            id: self.shared.state().next_id(),
            account_id: account.id,
            currency_id: account.currency_id,
            amount,
            created_at: Utc::now(),
        };
        self.deposits.push(deposit.clone());
        Ok(deposit)
    }

    async fn record_withdrawal(
        &mut self,
        account: &Account,
        amount: i64,
    ) -> Result<Withdrawal, sqlx::Error> {
        let withdrawal = Withdrawal {
            id: self.shared.state().next_id(),
            account_id: account.id,
            currency_id: account.currency_id,
            amount,
            created_at: Utc::now(),
        };
        self.withdrawals.push(withdrawal.clone());
        Ok(withdrawal)
    }

    async fn record_transfer(
        &mut self,
        sender: &Account,
        recipient: &Account,
        amount: i64,
    ) -> Result<Transfer, sqlx::Error> {
        let transfer = Transfer {
            id: self.shared.state().next_id(),
            sender_account_id: sender.id,
            recipient_account_id: recipient.id,
            currency_id: sender.currency_id,
            amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn commit(mut self) -> Result<(), sqlx::Error> {
        {
            let mut state = self.shared.state();
            let now = Utc::now();
            for (account_id, balance) in self.staged_balances.drain() {
                if let Some(account) = state.accounts.get_mut(&account_id) {
                    account.balance = balance;
                    account.updated_at = now;
                }
            }
            state.deposits.append(&mut self.deposits);
            state.withdrawals.append(&mut self.withdrawals);
            state.transfers.append(&mut self.transfers);
        }
        self.created_accounts.clear();
        self.row_guards.clear();
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), sqlx::Error> {
        {
            let mut state = self.shared.state();
            for account_id in self.created_accounts.drain(..) {
                state.accounts.remove(&account_id);
            }
            state.rolled_back += 1;
        }
        self.row_guards.clear();
        Ok(())
    }
}

impl Drop for MemoryTx {
    /// Uncommitted transaction dropped (e.g. a cancelled request)
    fn drop(&mut self) {
        if self.created_accounts.is_empty() {
            return;
        }
        let mut state = self.shared.state();
        for account_id in self.created_accounts.drain(..) {
            state.accounts.remove(&account_id);
        }
    }
}
