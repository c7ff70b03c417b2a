//! A small in-process banking ledger.
//!
//! Users hold one balance per currency. The [`Ledger`] supports creating users,
//! depositing, withdrawing, reading balances and sending money between users.
//! Every operation returns a `Result` whose error is a [`BankingError`].

mod bank;

pub use bank::{
    amount_from_f64, parse_amount, Account, Balance, BankingError, Currency, Error, Ledger,
    NewBalance, Operation, OperationRecord, OperationType, Outcome, SendPolicy, Transfer,
    Username, Wallet,
};
pub use rust_decimal::Decimal;
