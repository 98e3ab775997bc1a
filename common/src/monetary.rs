//! Monetary types for the wallet ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WalletError;

/// A supported currency. The set is closed: codes outside it are
/// rejected at the boundary and never reach the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Rub,
    Eur,
}

impl Currency {
    /// Every supported currency, in canonical order.
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Rub, Currency::Eur];

    /// Parse a currency code, case-insensitively.
    pub fn from_code(code: &str) -> Result<Self, WalletError> {
        match code.to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "RUB" => Ok(Currency::Rub),
            "EUR" => Ok(Currency::Eur),
            _ => Err(WalletError::InvalidCurrency {
                code: code.to_string(),
            }),
        }
    }

    /// Get the ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Rub => "RUB",
            Currency::Eur => "EUR",
        }
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Round an amount to this currency's standard decimal places.
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp(self.decimal_places())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

/// Per-account balances, one field per supported currency.
///
/// Every field stays >= 0 after any committed ledger operation; the
/// stores enforce this, not this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    #[serde(rename = "USD")]
    pub usd: Decimal,
    #[serde(rename = "RUB")]
    pub rub: Decimal,
    #[serde(rename = "EUR")]
    pub eur: Decimal,
}

impl Balances {
    /// Create balances with explicit per-currency values.
    pub fn new(usd: Decimal, rub: Decimal, eur: Decimal) -> Self {
        Self { usd, rub, eur }
    }

    /// Create all-zero balances.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Get the balance for one currency.
    pub fn get(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => self.usd,
            Currency::Rub => self.rub,
            Currency::Eur => self.eur,
        }
    }

    /// Get a mutable reference to the balance for one currency.
    pub fn get_mut(&mut self, currency: Currency) -> &mut Decimal {
        match currency {
            Currency::Usd => &mut self.usd,
            Currency::Rub => &mut self.rub,
            Currency::Eur => &mut self.eur,
        }
    }
}

impl fmt::Display for Balances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "USD={} RUB={} EUR={}", self.usd, self.rub, self.eur)
    }
}

/// A full conversion table: each currency's value relative to a fixed
/// base unit. Replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(rename = "USD")]
    pub usd: Decimal,
    #[serde(rename = "RUB")]
    pub rub: Decimal,
    #[serde(rename = "EUR")]
    pub eur: Decimal,
}

impl RateTable {
    /// Create a table with explicit per-currency values.
    pub fn new(usd: Decimal, rub: Decimal, eur: Decimal) -> Self {
        Self { usd, rub, eur }
    }

    /// Get one currency's value relative to the base unit.
    pub fn value(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => self.usd,
            Currency::Rub => self.rub,
            Currency::Eur => self.eur,
        }
    }

    /// Derived conversion rate between two currencies.
    ///
    /// `cross_rate(x, x)` is 1 by construction. Values must be
    /// strictly positive; tables are validated on admission.
    pub fn cross_rate(&self, from: Currency, to: Currency) -> Decimal {
        self.value(to) / self.value(from)
    }

    /// Check that every value is strictly positive.
    pub fn is_positive(&self) -> bool {
        Currency::ALL
            .iter()
            .all(|c| self.value(*c) > Decimal::ZERO)
    }
}
