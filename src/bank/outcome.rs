use super::Decimal;

/// Successful `get_balance` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub balance: Decimal,
}

/// Successful `deposit` or `withdraw` result: the balance after the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewBalance {
    pub new_balance: Decimal,
}

/// Successful `send` result, read back after both legs were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub from_username_balance: Decimal,
    pub to_username_balance: Decimal,
}

/// Success value of any ledger operation, as returned by `Ledger::apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Balance(Balance),
    NewBalance(NewBalance),
    Transfer(Transfer),
}

impl Outcome {
    /// The primary balance carried by this outcome, if any.
    pub fn balance(&self) -> Option<Decimal> {
        match self {
            Outcome::Created => None,
            Outcome::Balance(b) => Some(b.balance),
            Outcome::NewBalance(b) => Some(b.new_balance),
            Outcome::Transfer(t) => Some(t.from_username_balance),
        }
    }

    /// The receiver's balance, only present for transfers.
    pub fn receiver_balance(&self) -> Option<Decimal> {
        match self {
            Outcome::Transfer(t) => Some(t.to_username_balance),
            _ => None,
        }
    }
}

impl From<Balance> for Outcome {
    fn from(value: Balance) -> Self {
        Outcome::Balance(value)
    }
}

impl From<NewBalance> for Outcome {
    fn from(value: NewBalance) -> Self {
        Outcome::NewBalance(value)
    }
}

impl From<Transfer> for Outcome {
    fn from(value: Transfer) -> Self {
        Outcome::Transfer(value)
    }
}
