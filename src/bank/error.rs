/// Top-level error type for the script runner.
///
/// These are hard errors: unreadable input or output stops processing.
/// Banking failures inside a script are reported per row instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors returned by the ledger operations.
///
/// The set is closed and carries no payload; callers branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum BankingError {
    #[error("wrong arguments")]
    WrongArguments,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("user does not exist")]
    UserDoesNotExist,

    #[error("not enough money")]
    NotEnoughMoney,

    #[error("sender does not exist")]
    SenderDoesNotExist,

    #[error("receiver does not exist")]
    ReceiverDoesNotExist,
}

impl BankingError {
    /// Stable name of the error kind, as written to outcome CSVs.
    pub fn kind(self) -> &'static str {
        match self {
            BankingError::WrongArguments => "WrongArguments",
            BankingError::UserAlreadyExists => "UserAlreadyExists",
            BankingError::UserDoesNotExist => "UserDoesNotExist",
            BankingError::NotEnoughMoney => "NotEnoughMoney",
            BankingError::SenderDoesNotExist => "SenderDoesNotExist",
            BankingError::ReceiverDoesNotExist => "ReceiverDoesNotExist",
        }
    }
}
