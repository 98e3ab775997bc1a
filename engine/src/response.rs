//! Response types returned by the engine.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fxwallet_common::{Balances, Currency, Username};

/// Point-in-time view of one account's balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceView {
    pub username: Username,
    pub balances: Balances,
}

/// Result of a committed exchange: the credited amount and the
/// post-exchange balances of the currencies the exchange touched.
///
/// `new_balance` carries only the affected currencies, in canonical
/// currency order. A same-currency exchange affects one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    pub exchanged_amount: Decimal,
    pub new_balance: BTreeMap<Currency, Decimal>,
}

impl ExchangeOutcome {
    /// Build an outcome from the full post-exchange balances.
    pub fn new(
        exchanged_amount: Decimal,
        from: Currency,
        to: Currency,
        balances: &Balances,
    ) -> Self {
        let mut new_balance = BTreeMap::new();
        new_balance.insert(from, balances.get(from));
        new_balance.insert(to, balances.get(to));
        Self {
            exchanged_amount,
            new_balance,
        }
    }
}
