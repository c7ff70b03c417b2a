use std::str::FromStr;

use super::account::{Currency, Username};
use super::error::BankingError;
use super::Decimal;
use serde::{Deserialize, Serialize};

/// Raw operation record as parsed from a CSV script.
/// Every field is optional here; conversion to [`Operation`] checks what each type needs.
#[derive(Debug, Deserialize, Clone)]
pub struct OperationRecord {
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub username: Option<String>,
    /// Only used by `send`
    pub receiver: Option<String>,
    /// Kept as text so that `NaN`, `inf` and garbage become `WrongArguments`
    /// instead of aborting the whole script.
    pub amount: Option<String>,
    pub currency: Option<String>,
}

impl std::fmt::Display for OperationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (username: {:?}, receiver: {:?}, amount: {:?}, currency: {:?})",
            self.op_type, self.username, self.receiver, self.amount, self.currency
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    CreateUser,
    Deposit,
    Withdraw,
    GetBalance,
    Send,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::CreateUser => write!(f, "create_user"),
            OperationType::Deposit => write!(f, "deposit"),
            OperationType::Withdraw => write!(f, "withdraw"),
            OperationType::GetBalance => write!(f, "get_balance"),
            OperationType::Send => write!(f, "send"),
        }
    }
}

/// A well-formed ledger operation.
///
/// Amounts are finite but their sign is not checked yet; that is the ledger's call.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateUser {
        username: Username,
    },
    Deposit {
        username: Username,
        amount: Decimal,
        currency: Currency,
    },
    Withdraw {
        username: Username,
        amount: Decimal,
        currency: Currency,
    },
    GetBalance {
        username: Username,
        currency: Currency,
    },
    Send {
        from: Username,
        /// Checked by the deposit leg, after the withdrawal has run.
        to: Option<Username>,
        amount: Decimal,
        currency: Currency,
    },
}

impl Operation {
    /// Returns the type of this operation
    pub fn op_type(&self) -> OperationType {
        match self {
            Operation::CreateUser { .. } => OperationType::CreateUser,
            Operation::Deposit { .. } => OperationType::Deposit,
            Operation::Withdraw { .. } => OperationType::Withdraw,
            Operation::GetBalance { .. } => OperationType::GetBalance,
            Operation::Send { .. } => OperationType::Send,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::CreateUser { username } => {
                write!(f, "[create_user] username={username:?}")
            }
            Operation::Deposit {
                username,
                amount,
                currency,
            } => write!(
                f,
                "[deposit] username={username:?} amount={amount} currency={currency:?}"
            ),
            Operation::Withdraw {
                username,
                amount,
                currency,
            } => write!(
                f,
                "[withdraw] username={username:?} amount={amount} currency={currency:?}"
            ),
            Operation::GetBalance { username, currency } => {
                write!(f, "[get_balance] username={username:?} currency={currency:?}")
            }
            Operation::Send {
                from,
                to,
                amount,
                currency,
            } => write!(
                f,
                "[send] from={from:?} to={to:?} amount={amount} currency={currency:?}"
            ),
        }
    }
}

impl TryFrom<OperationRecord> for Operation {
    type Error = BankingError;

    fn try_from(record: OperationRecord) -> Result<Self, Self::Error> {
        let OperationRecord {
            op_type,
            username,
            receiver,
            amount,
            currency,
        } = record;

        let username = username.ok_or(BankingError::WrongArguments)?;
        let operation = match op_type {
            OperationType::CreateUser => Operation::CreateUser { username },
            OperationType::Deposit => Operation::Deposit {
                username,
                amount: required_amount(amount)?,
                currency: currency.ok_or(BankingError::WrongArguments)?,
            },
            OperationType::Withdraw => Operation::Withdraw {
                username,
                amount: required_amount(amount)?,
                currency: currency.ok_or(BankingError::WrongArguments)?,
            },
            OperationType::GetBalance => Operation::GetBalance {
                username,
                currency: currency.ok_or(BankingError::WrongArguments)?,
            },
            OperationType::Send => Operation::Send {
                from: username,
                to: receiver,
                amount: required_amount(amount)?,
                currency: currency.ok_or(BankingError::WrongArguments)?,
            },
        };
        Ok(operation)
    }
}

fn required_amount(amount: Option<String>) -> Result<Decimal, BankingError> {
    amount
        .as_deref()
        .ok_or(BankingError::WrongArguments)
        .and_then(parse_amount)
}

/// Parse a textual amount in plain (`12.5`) or scientific (`1.25e1`) notation.
///
/// Anything that is not a finite number is `WrongArguments`. The sign is left alone.
pub fn parse_amount(text: &str) -> Result<Decimal, BankingError> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| BankingError::WrongArguments)
}

/// Convert a float amount, rejecting `NaN` and infinities.
pub fn amount_from_f64(value: f64) -> Result<Decimal, BankingError> {
    if !value.is_finite() {
        return Err(BankingError::WrongArguments);
    }
    Decimal::try_from(value).map_err(|_| BankingError::WrongArguments)
}
