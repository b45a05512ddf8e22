//! Account ledger module
//!
//! Balances, lazy account creation and the append-only deposit/withdrawal/transfer
//! records, behind narrow store capabilities with a PostgreSQL implementation.

pub mod ledger;
pub mod models;
pub mod repository;
pub mod store;

#[cfg(test)]
pub mod memory;

// Re-export commonly used types
pub use ledger::{AccountLedger, deposit_into, get_or_create_account, withdraw_from};
pub use models::{
    Account, AccountBalance, BalanceChange, Currency, Deposit, Transfer, TransferReceipt, User,
    Withdrawal,
};
pub use repository::{PgLedgerStore, PgLedgerTx, PgUserDirectory};
pub use store::{
    AccountReader, AccountWriter, LedgerRecorder, LedgerStore, LedgerTx, UserDirectory,
    complete_transaction,
};
