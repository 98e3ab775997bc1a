//! Balance store trait.

use async_trait::async_trait;
use rust_decimal::Decimal;

use fxwallet_common::{Balances, Currency, Result, Username};

/// Persistence boundary for per-account balances.
///
/// Every mutation is a single atomic check-and-apply: the
/// non-negativity constraint is evaluated against the committed value
/// at commit time, never against an earlier read. Operations on the
/// same account serialize with respect to each other; operations on
/// different accounts proceed independently, with no global lock.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Read-only snapshot of an account's current balances.
    ///
    /// Fails with `NotFound` if the account does not exist.
    async fn balances(&self, username: &Username) -> Result<Balances>;

    /// Add `delta` (positive for deposit, negative for withdraw) to
    /// the named currency field and return the post-update balances.
    ///
    /// Fails with `InsufficientFunds`, leaving the balance untouched,
    /// when the result would be negative.
    async fn apply_delta(
        &self,
        username: &Username,
        currency: Currency,
        delta: Decimal,
    ) -> Result<Balances>;

    /// Debit `amount` from `from` and credit `exchange_credit(from,
    /// to, amount, rate)` to `to` as one indivisible unit. Either both
    /// legs commit or neither does.
    ///
    /// Fails with `InsufficientFunds` when the `from` balance is below
    /// `amount` at commit time.
    async fn apply_exchange(
        &self,
        username: &Username,
        from: Currency,
        to: Currency,
        amount: Decimal,
        rate: Decimal,
    ) -> Result<Balances>;
}

/// The amount an exchange credits to the destination currency.
///
/// Cross-currency credits round to the destination's scale. A
/// same-currency exchange credits exactly what it debits, so the two
/// legs net to zero; rounding there would mint or burn the sub-scale
/// remainder.
pub fn exchange_credit(from: Currency, to: Currency, amount: Decimal, rate: Decimal) -> Decimal {
    if from == to {
        amount
    } else {
        to.round(amount * rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exchange_credit_rounds_to_destination_scale() {
        let credit = exchange_credit(Currency::Rub, Currency::Eur, dec!(100), dec!(0.011));
        assert_eq!(credit, dec!(1.1));

        let credit = exchange_credit(Currency::Rub, Currency::Eur, dec!(1), dec!(0.0114));
        assert_eq!(credit, dec!(0.01));
    }

    #[test]
    fn test_same_currency_credit_equals_debit_exactly() {
        // A sub-scale amount must not round on the credit leg.
        let credit = exchange_credit(Currency::Usd, Currency::Usd, dec!(0.015), Decimal::ONE);
        assert_eq!(credit, dec!(0.015));
        assert_eq!(credit - dec!(0.015), Decimal::ZERO);
    }
}
