use std::collections::HashMap;
use std::io::{Read, Write};

use serde::Serialize;

use super::account::{Account, Username};
use super::error::{BankingError, Error};
use super::operation::{Operation, OperationRecord, OperationType};
use super::outcome::{Balance, NewBalance, Outcome, Transfer};
use super::Decimal;

/// What `send` does when the deposit leg fails after the withdrawal went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendPolicy {
    /// Withdraw then deposit, leaving the withdrawal in place if the deposit fails.
    #[default]
    Sequential,
    /// Re-credit the sender when the deposit fails, so a failed send changes nothing.
    Atomic,
}

/// In-memory multi-currency ledger.
///
/// Owns every account; operations validate arguments, then existence,
/// then funds, and only then mutate.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Maps username to the account and its wallets
    accounts: HashMap<Username, Account>,
    send_policy: SendPolicy,
}

impl Ledger {
    /// Create an empty `Ledger` with the default (sequential) send policy
    pub fn new() -> Self {
        Self::with_policy(SendPolicy::default())
    }

    /// Create an empty `Ledger` that handles failed deposit legs of `send` per `send_policy`
    pub fn with_policy(send_policy: SendPolicy) -> Self {
        log::trace!("Ledger initialized with {send_policy:?} send policy");
        Self {
            accounts: HashMap::new(),
            send_policy,
        }
    }

    /// Returns the number of accounts in the ledger
    pub fn user_count(&self) -> usize {
        self.accounts.len()
    }

    /// Returns the account of `username`, if it exists
    pub fn account(&self, username: &str) -> Option<&Account> {
        self.accounts.get(username)
    }

    pub fn create_user(&mut self, username: &str) -> Result<(), BankingError> {
        if self.accounts.contains_key(username) {
            return Err(BankingError::UserAlreadyExists);
        }
        self.accounts.insert(username.to_owned(), Account::new());

        log::debug!("[create_user] Created account for {username:?}");
        Ok(())
    }

    /// Balance of `username` in `currency`. A currency never touched reads as zero.
    pub fn get_balance(&self, username: &str, currency: &str) -> Result<Balance, BankingError> {
        let balance = self.read_balance(username, currency)?;
        Ok(Balance { balance })
    }

    pub fn deposit(
        &mut self,
        username: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<NewBalance, BankingError> {
        check_amount(amount)?;

        let new_balance = self.adjust_balance(username, amount, currency)?;
        log::trace!(
            "[deposit] username={username:?} amount={amount} currency={currency:?} -> new_balance={new_balance}"
        );
        Ok(NewBalance { new_balance })
    }

    pub fn withdraw(
        &mut self,
        username: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<NewBalance, BankingError> {
        check_amount(amount)?;

        let balance = self.read_balance(username, currency)?;
        if balance - amount < Decimal::ZERO {
            return Err(BankingError::NotEnoughMoney);
        }

        let new_balance = self.adjust_balance(username, -amount, currency)?;
        log::trace!(
            "[withdraw] username={username:?} amount={amount} currency={currency:?} -> new_balance={new_balance}"
        );
        Ok(NewBalance { new_balance })
    }

    /// Move `amount` of `currency` from one account to another.
    ///
    /// The withdrawal runs first. If the deposit then fails, the outcome for the
    /// sender depends on the ledger's [`SendPolicy`].
    pub fn send(
        &mut self,
        from_username: &str,
        to_username: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<Transfer, BankingError> {
        self.transfer(from_username, Some(to_username), amount, currency)
    }

    /// `send` with a receiver that may be missing. A missing receiver fails the
    /// deposit leg with `WrongArguments`, after the withdrawal has been applied.
    fn transfer(
        &mut self,
        from_username: &str,
        to_username: Option<&str>,
        amount: Decimal,
        currency: &str,
    ) -> Result<Transfer, BankingError> {
        self.withdraw(from_username, amount, currency)
            .map_err(|e| match e {
                BankingError::UserDoesNotExist => BankingError::SenderDoesNotExist,
                other => other,
            })?;

        let deposited = match to_username {
            Some(to) => self.deposit(to, amount, currency).map(|_| to),
            None => Err(BankingError::WrongArguments),
        };
        let to_username = match deposited {
            Ok(to) => to,
            Err(e) => {
                self.fail_deposit_leg(from_username, to_username, amount, currency, e)?;
                return Err(match e {
                    BankingError::UserDoesNotExist => BankingError::ReceiverDoesNotExist,
                    other => other,
                });
            }
        };

        let from_username_balance = self.get_balance(from_username, currency)?.balance;
        let to_username_balance = self.get_balance(to_username, currency)?.balance;

        log::trace!(
            "[send] from={from_username:?} to={to_username:?} amount={amount} currency={currency:?} -> {from_username_balance}/{to_username_balance}"
        );
        Ok(Transfer {
            from_username_balance,
            to_username_balance,
        })
    }

    /// Apply the send policy once the withdrawal went through but the deposit failed.
    fn fail_deposit_leg(
        &mut self,
        from_username: &str,
        to_username: Option<&str>,
        amount: Decimal,
        currency: &str,
        error: BankingError,
    ) -> Result<(), BankingError> {
        match self.send_policy {
            SendPolicy::Sequential => {
                log::warn!(
                    "[send] {amount} {currency:?} left {from_username:?} but never reached {to_username:?}: {error}"
                );
            }
            SendPolicy::Atomic => {
                self.adjust_balance(from_username, amount, currency)?;
                log::debug!("[send] Rolled back withdrawal from {from_username:?}: {error}");
            }
        }
        Ok(())
    }

    /// Run any validated operation.
    pub fn apply(&mut self, operation: Operation) -> Result<Outcome, BankingError> {
        log::trace!("Applying operation: {operation}");
        match operation {
            Operation::CreateUser { username } => {
                self.create_user(&username).map(|()| Outcome::Created)
            }
            Operation::Deposit {
                username,
                amount,
                currency,
            } => self.deposit(&username, amount, &currency).map(Outcome::from),
            Operation::Withdraw {
                username,
                amount,
                currency,
            } => self.withdraw(&username, amount, &currency).map(Outcome::from),
            Operation::GetBalance { username, currency } => {
                self.get_balance(&username, &currency).map(Outcome::from)
            }
            Operation::Send {
                from,
                to,
                amount,
                currency,
            } => self
                .transfer(&from, to.as_deref(), amount, &currency)
                .map(Outcome::from),
        }
    }

    /// Replay a CSV operation script (header `type,username,receiver,amount,currency`)
    /// and write one outcome row per operation.
    ///
    /// Banking errors are reported in the outcome and do not stop the run;
    /// malformed CSV and IO failures do.
    pub fn process_operations<R: Read, W: Write>(
        &mut self,
        reader: R,
        writer: W,
    ) -> Result<(), Error> {
        log::info!("Starting operation processing");

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut succeeded = 0u64;
        let mut failed = 0u64;

        for result in csv_reader.deserialize() {
            let record: OperationRecord = result?;
            let row = succeeded + failed + 1;
            let op_type = record.op_type;
            log::trace!("[row {row}] Parsing: {record}");

            let outcome = Operation::try_from(record).and_then(|operation| self.apply(operation));
            let outcome_record = match outcome {
                Ok(outcome) => {
                    succeeded += 1;
                    OutcomeRecord {
                        row,
                        op_type,
                        status: "success",
                        balance: outcome.balance(),
                        receiver_balance: outcome.receiver_balance(),
                    }
                }
                Err(e) => {
                    log::warn!("[row {row}] {op_type} failed: {e}");
                    failed += 1;
                    OutcomeRecord {
                        row,
                        op_type,
                        status: e.kind(),
                        balance: None,
                        receiver_balance: None,
                    }
                }
            };
            csv_writer.serialize(outcome_record)?;
        }
        csv_writer.flush()?;

        log::info!(
            "Processing complete: {} succeeded, {} failed, {} accounts",
            succeeded,
            failed,
            self.accounts.len()
        );
        Ok(())
    }

    /// Write every wallet as `username,currency,amount`, ordered by username.
    pub fn export_balances<W: Write>(&self, writer: W) -> Result<(), Error> {
        log::info!("Exporting {} accounts", self.accounts.len());

        let mut usernames: Vec<&Username> = self.accounts.keys().collect();
        usernames.sort();

        let mut csv_writer = csv::Writer::from_writer(writer);
        for username in usernames {
            for wallet in self.accounts[username].wallets() {
                csv_writer.serialize(BalanceRecord {
                    username,
                    currency: wallet.currency(),
                    amount: wallet.amount(),
                })?;
            }
        }
        csv_writer.flush()?;

        log::trace!("Export complete");
        Ok(())
    }

    fn read_balance(&self, username: &str, currency: &str) -> Result<Decimal, BankingError> {
        self.accounts
            .get(username)
            .map(|account| account.balance(currency))
            .ok_or(BankingError::UserDoesNotExist)
    }

    /// Apply a signed amount and read the resulting balance back.
    fn adjust_balance(
        &mut self,
        username: &str,
        signed_amount: Decimal,
        currency: &str,
    ) -> Result<Decimal, BankingError> {
        let account = self
            .accounts
            .get_mut(username)
            .ok_or(BankingError::UserDoesNotExist)?;

        // Overflow would panic inside Decimal
        if account.balance(currency).checked_add(signed_amount).is_none() {
            return Err(BankingError::WrongArguments);
        }
        account.adjust(currency, signed_amount);

        self.read_balance(username, currency)
    }
}

/// Amounts must be strictly positive.
fn check_amount(amount: Decimal) -> Result<(), BankingError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(BankingError::WrongArguments)
    }
}

#[derive(Debug, Serialize)]
struct OutcomeRecord {
    row: u64,
    #[serde(rename = "type")]
    op_type: OperationType,
    status: &'static str,
    balance: Option<Decimal>,
    receiver_balance: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct BalanceRecord<'a> {
    username: &'a str,
    currency: &'a str,
    amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger_with(users: &[&str]) -> Ledger {
        let mut ledger = Ledger::new();
        for user in users {
            ledger.create_user(user).unwrap();
        }
        ledger
    }

    fn balance(ledger: &Ledger, username: &str, currency: &str) -> Decimal {
        ledger.get_balance(username, currency).unwrap().balance
    }

    #[test]
    fn test_create_user() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.create_user("from"), Ok(()));
        assert_eq!(ledger.user_count(), 1);
    }

    #[test]
    fn test_create_user_twice_fails() {
        let mut ledger = ledger_with(&["hey"]);
        assert_eq!(
            ledger.create_user("hey"),
            Err(BankingError::UserAlreadyExists)
        );
        assert_eq!(ledger.user_count(), 1);
    }

    #[test]
    fn test_empty_username_is_accepted() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.create_user(""), Ok(()));
        assert_eq!(balance(&ledger, "", ""), Decimal::ZERO);
    }

    #[test]
    fn test_get_balance_unknown_user() {
        let ledger = Ledger::new();
        assert_eq!(
            ledger.get_balance("missing-user", "eur"),
            Err(BankingError::UserDoesNotExist)
        );
    }

    #[test]
    fn test_get_balance_untouched_currency_is_zero() {
        let ledger = ledger_with(&["no"]);
        assert_eq!(
            ledger.get_balance("no", "eur"),
            Ok(Balance {
                balance: Decimal::ZERO
            })
        );
        // Reading does not create a wallet
        assert!(ledger.account("no").unwrap().wallets().is_empty());
    }

    #[test]
    fn test_deposit_returns_new_balance() {
        let mut ledger = ledger_with(&["from"]);
        assert_eq!(
            ledger.deposit("from", dec!(1), "eur"),
            Ok(NewBalance {
                new_balance: dec!(1)
            })
        );
    }

    #[test]
    fn test_deposits_accumulate() {
        let mut ledger = ledger_with(&["from"]);
        ledger.deposit("from", dec!(1.25), "eur").unwrap();
        ledger.deposit("from", dec!(2.5), "eur").unwrap();
        assert_eq!(balance(&ledger, "from", "eur"), dec!(3.75));
        assert_eq!(balance(&ledger, "from", "usd"), Decimal::ZERO);
    }

    #[test]
    fn test_deposit_unknown_user() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.deposit("no", dec!(1), "eur"),
            Err(BankingError::UserDoesNotExist)
        );
    }

    #[test]
    fn test_deposit_rejects_non_positive_amounts() {
        let mut ledger = ledger_with(&["from"]);
        for amount in [dec!(-1), Decimal::ZERO] {
            assert_eq!(
                ledger.deposit("from", amount, "eur"),
                Err(BankingError::WrongArguments)
            );
        }
        assert!(ledger.account("from").unwrap().wallets().is_empty());
    }

    #[test]
    fn test_deposit_checks_amount_before_user() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.deposit("no", dec!(-1), "eur"),
            Err(BankingError::WrongArguments)
        );
    }

    #[test]
    fn test_withdraw() {
        let mut ledger = ledger_with(&["from"]);
        ledger.deposit("from", dec!(2), "eur").unwrap();
        assert_eq!(
            ledger.withdraw("from", dec!(1), "eur"),
            Ok(NewBalance {
                new_balance: dec!(1)
            })
        );
    }

    #[test]
    fn test_withdraw_entire_balance() {
        let mut ledger = ledger_with(&["from"]);
        ledger.deposit("from", dec!(5), "eur").unwrap();
        assert_eq!(
            ledger.withdraw("from", dec!(5), "eur"),
            Ok(NewBalance {
                new_balance: Decimal::ZERO
            })
        );
    }

    #[test]
    fn test_withdraw_not_enough_money() {
        let mut ledger = ledger_with(&["from"]);
        assert_eq!(
            ledger.withdraw("from", dec!(1), "eur"),
            Err(BankingError::NotEnoughMoney)
        );

        ledger.deposit("from", dec!(1), "eur").unwrap();
        assert_eq!(
            ledger.withdraw("from", dec!(1.0001), "eur"),
            Err(BankingError::NotEnoughMoney)
        );
        assert_eq!(balance(&ledger, "from", "eur"), dec!(1));
    }

    #[test]
    fn test_withdraw_unknown_user() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.withdraw("no", dec!(1), "eur"),
            Err(BankingError::UserDoesNotExist)
        );
    }

    #[test]
    fn test_withdraw_rejects_negative_amount() {
        let mut ledger = ledger_with(&["from"]);
        ledger.deposit("from", dec!(1), "eur").unwrap();
        assert_eq!(
            ledger.withdraw("from", dec!(-1), "eur"),
            Err(BankingError::WrongArguments)
        );
        assert_eq!(balance(&ledger, "from", "eur"), dec!(1));
    }

    #[test]
    fn test_send() {
        let mut ledger = ledger_with(&["from", "to"]);
        ledger.deposit("from", dec!(1), "eur").unwrap();
        assert_eq!(
            ledger.send("from", "to", dec!(1), "eur"),
            Ok(Transfer {
                from_username_balance: Decimal::ZERO,
                to_username_balance: dec!(1),
            })
        );
        assert_eq!(balance(&ledger, "from", "eur"), Decimal::ZERO);
        assert_eq!(balance(&ledger, "to", "eur"), dec!(1));
    }

    #[test]
    fn test_send_sender_does_not_exist() {
        let mut ledger = ledger_with(&["to"]);
        assert_eq!(
            ledger.send("from", "to", dec!(1), "eur"),
            Err(BankingError::SenderDoesNotExist)
        );
        assert_eq!(balance(&ledger, "to", "eur"), Decimal::ZERO);
    }

    #[test]
    fn test_send_not_enough_money() {
        let mut ledger = ledger_with(&["from"]);
        assert_eq!(
            ledger.send("from", "to", dec!(1), "eur"),
            Err(BankingError::NotEnoughMoney)
        );
    }

    #[test]
    fn test_send_negative_amount() {
        let mut ledger = ledger_with(&["from", "to"]);
        ledger.deposit("from", dec!(1), "eur").unwrap();
        assert_eq!(
            ledger.send("from", "to", dec!(-1), "eur"),
            Err(BankingError::WrongArguments)
        );
        assert_eq!(balance(&ledger, "from", "eur"), dec!(1));
        assert_eq!(balance(&ledger, "to", "eur"), Decimal::ZERO);
    }

    #[test]
    fn test_send_receiver_missing_keeps_withdrawal() {
        let mut ledger = ledger_with(&["from"]);
        ledger.deposit("from", dec!(1), "eur").unwrap();
        assert_eq!(
            ledger.send("from", "to", dec!(1), "eur"),
            Err(BankingError::ReceiverDoesNotExist)
        );
        assert_eq!(balance(&ledger, "from", "eur"), Decimal::ZERO);
    }

    #[test]
    fn test_atomic_send_receiver_missing_rolls_back() {
        let mut ledger = Ledger::with_policy(SendPolicy::Atomic);
        ledger.create_user("from").unwrap();
        ledger.deposit("from", dec!(3), "eur").unwrap();
        assert_eq!(
            ledger.send("from", "to", dec!(1), "eur"),
            Err(BankingError::ReceiverDoesNotExist)
        );
        assert_eq!(balance(&ledger, "from", "eur"), dec!(3));
    }

    fn send_without_receiver(from: &str, amount: Decimal) -> Operation {
        Operation::Send {
            from: from.to_owned(),
            to: None,
            amount,
            currency: "eur".to_owned(),
        }
    }

    #[test]
    fn test_send_without_receiver_keeps_withdrawal() {
        let mut ledger = ledger_with(&["from"]);
        ledger.deposit("from", dec!(5), "eur").unwrap();
        assert_eq!(
            ledger.apply(send_without_receiver("from", dec!(2))),
            Err(BankingError::WrongArguments)
        );
        assert_eq!(balance(&ledger, "from", "eur"), dec!(3));
    }

    #[test]
    fn test_send_without_receiver_checks_sender_first() {
        let mut ledger = ledger_with(&["from"]);
        assert_eq!(
            ledger.apply(send_without_receiver("ghost", dec!(1))),
            Err(BankingError::SenderDoesNotExist)
        );
        assert_eq!(
            ledger.apply(send_without_receiver("from", dec!(9))),
            Err(BankingError::NotEnoughMoney)
        );
        assert_eq!(
            ledger.apply(send_without_receiver("from", dec!(-1))),
            Err(BankingError::WrongArguments)
        );
    }

    #[test]
    fn test_atomic_send_without_receiver_rolls_back() {
        let mut ledger = Ledger::with_policy(SendPolicy::Atomic);
        ledger.create_user("from").unwrap();
        ledger.deposit("from", dec!(5), "eur").unwrap();
        assert_eq!(
            ledger.apply(send_without_receiver("from", dec!(2))),
            Err(BankingError::WrongArguments)
        );
        assert_eq!(balance(&ledger, "from", "eur"), dec!(5));
    }

    #[test]
    fn test_send_to_self_keeps_balance() {
        let mut ledger = ledger_with(&["me"]);
        ledger.deposit("me", dec!(2), "eur").unwrap();
        assert_eq!(
            ledger.send("me", "me", dec!(2), "eur"),
            Ok(Transfer {
                from_username_balance: dec!(2),
                to_username_balance: dec!(2),
            })
        );
    }

    #[test]
    fn test_currencies_are_independent() {
        let mut ledger = ledger_with(&["from", "to"]);
        ledger.deposit("from", dec!(5), "eur").unwrap();
        ledger.deposit("from", dec!(1), "usd").unwrap();

        assert_eq!(
            ledger.send("from", "to", dec!(2), "usd"),
            Err(BankingError::NotEnoughMoney)
        );
        ledger.send("from", "to", dec!(2), "eur").unwrap();

        assert_eq!(balance(&ledger, "from", "eur"), dec!(3));
        assert_eq!(balance(&ledger, "from", "usd"), dec!(1));
        assert_eq!(balance(&ledger, "to", "usd"), Decimal::ZERO);
    }

    #[test]
    fn test_ledgers_are_independent() {
        let mut first = ledger_with(&["user1"]);
        let second = Ledger::new();
        first.deposit("user1", dec!(1), "eur").unwrap();
        assert_eq!(
            second.get_balance("user1", "eur"),
            Err(BankingError::UserDoesNotExist)
        );
    }

    #[test]
    fn test_deposit_overflow_is_rejected() {
        let mut ledger = ledger_with(&["rich"]);
        ledger.deposit("rich", Decimal::MAX, "eur").unwrap();
        assert_eq!(
            ledger.deposit("rich", Decimal::MAX, "eur"),
            Err(BankingError::WrongArguments)
        );
        assert_eq!(balance(&ledger, "rich", "eur"), Decimal::MAX);
    }

    #[test]
    fn test_apply_dispatches_operations() {
        let mut ledger = Ledger::new();
        assert_eq!(
            ledger.apply(Operation::CreateUser {
                username: "from".to_owned()
            }),
            Ok(Outcome::Created)
        );
        let outcome = ledger
            .apply(Operation::Deposit {
                username: "from".to_owned(),
                amount: dec!(4),
                currency: "eur".to_owned(),
            })
            .unwrap();
        assert_eq!(outcome.balance(), Some(dec!(4)));
        assert_eq!(outcome.receiver_balance(), None);
    }
}
