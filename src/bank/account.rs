use super::Decimal;

pub type Username = String;
pub type Currency = String;

/// A single-currency balance held by an account.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    currency: Currency,
    amount: Decimal,
}

impl Wallet {
    fn new(currency: &str, amount: Decimal) -> Self {
        Self {
            currency: currency.to_owned(),
            amount: tidy(amount),
        }
    }

    /// Returns the wallet currency
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns the current amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Represents a user's account: one wallet per currency ever touched,
/// kept in the order the currencies were first used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    wallets: Vec<Wallet>,
}

impl Account {
    pub(super) fn new() -> Self {
        Self {
            wallets: Vec::new(),
        }
    }

    /// Returns all wallets of this account
    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    /// Returns the balance for `currency`, zero if the account never touched it.
    pub fn balance(&self, currency: &str) -> Decimal {
        self.wallet(currency).map_or(Decimal::ZERO, Wallet::amount)
    }

    /// Apply a signed amount to the wallet for `currency`, creating it if needed.
    /// Caller must ensure the result is not negative.
    pub(super) fn adjust(&mut self, currency: &str, signed_amount: Decimal) -> Decimal {
        match self.wallets.iter_mut().find(|w| w.currency == currency) {
            Some(wallet) => {
                wallet.amount = tidy(wallet.amount + signed_amount);
            }
            None => {
                log::debug!("Created new {currency:?} wallet");
                self.wallets.push(Wallet::new(currency, signed_amount));
            }
        }
        let balance = self.balance(currency);
        debug_assert!(
            balance >= Decimal::ZERO,
            "Invariant violated: {currency:?} balance went negative ({balance})"
        );
        balance
    }

    fn wallet(&self, currency: &str) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.currency == currency)
    }
}

/// Trim trailing zeros and drop the sign of zero, so `1 - 1` prints as `0`.
fn tidy(amount: Decimal) -> Decimal {
    if amount.is_zero() {
        Decimal::ZERO
    } else {
        amount.normalize()
    }
}
