//! Transfers between users
//!
//! A transfer debits the sender, credits the recipient and appends one record
//! referencing both accounts, all inside a single ledger transaction.

pub mod coordinator;


pub use coordinator::{TransferCoordinator, lock_order, transfer_in};
