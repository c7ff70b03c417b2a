//! Banking module.
//!
//! This module contains the in-memory ledger and its supporting types:
//! - `Ledger` - Accounts, the five banking operations and the CSV script runner
//! - `Account` / `Wallet` - Per-user, per-currency balances
//! - `Operation` types - Raw script records and validated operations
//! - `Outcome` types - Success values returned by the operations
//! - `Error` types - Banking errors and runner errors

mod account;
mod error;
mod ledger;
mod operation;
mod outcome;

pub(crate) use rust_decimal::Decimal;

pub use account::{Account, Currency, Username, Wallet};
pub use error::{BankingError, Error};
pub use ledger::{Ledger, SendPolicy};
pub use operation::{amount_from_f64, parse_amount, Operation, OperationRecord, OperationType};
pub use outcome::{Balance, NewBalance, Outcome, Transfer};
