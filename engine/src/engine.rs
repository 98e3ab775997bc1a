//! Main exchange engine implementation.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use fxwallet_audit::{AuditEvent, AuditPublisher, EventChannel};
use fxwallet_common::{
    Balances, Currency, OperationKind, RateTable, Result, Username, WalletError,
};
use fxwallet_ledger::{exchange_credit, BalanceStore};
use fxwallet_rates::{RateCache, RateSource};

use crate::config::EngineConfig;
use crate::response::{BalanceView, ExchangeOutcome};

/// The main exchange engine.
///
/// Orchestrates validation, rate lookup, atomic ledger mutation, and
/// threshold-gated audit dispatch. Mutations happen in the store;
/// the engine never computes a new balance from a previously read one.
pub struct ExchangeEngine {
    store: Arc<dyn BalanceStore>,
    rates: RateCache,
    audit: AuditPublisher,
    config: EngineConfig,
}

impl ExchangeEngine {
    /// Create a new engine over a balance store, a rate source, and an
    /// audit event channel.
    pub fn new(
        store: Arc<dyn BalanceStore>,
        source: Arc<dyn RateSource>,
        channel: Arc<dyn EventChannel>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            rates: RateCache::with_config(source, config.rate_cache.clone()),
            audit: AuditPublisher::with_config(channel, config.audit.clone()),
            config,
        }
    }

    /// Deposit an amount into one currency of an account.
    #[instrument(skip(self), fields(username = %username, amount = %amount))]
    pub async fn deposit(
        &self,
        username: &Username,
        currency: &str,
        amount: Decimal,
    ) -> Result<Balances> {
        self.apply_signed(username, currency, amount, OperationKind::Deposit)
            .await
    }

    /// Withdraw an amount from one currency of an account.
    #[instrument(skip(self), fields(username = %username, amount = %amount))]
    pub async fn withdraw(
        &self,
        username: &Username,
        currency: &str,
        amount: Decimal,
    ) -> Result<Balances> {
        self.apply_signed(username, currency, amount, OperationKind::Withdraw)
            .await
    }

    /// Convert an amount between two currencies of an account.
    #[instrument(skip(self), fields(username = %username, amount = %amount))]
    pub async fn exchange(
        &self,
        username: &Username,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<ExchangeOutcome> {
        let from = self.validate(from, amount)?;
        let to = Currency::from_code(to)?;

        // Exchanges never price against a non-positive rate.
        let rate = self.rates.rate(from, to).await?;
        if rate <= Decimal::ZERO {
            return Err(WalletError::RateUnavailable {
                reason: format!("non-positive rate {rate} for {from}/{to}"),
            });
        }

        let balances = self.store.apply_exchange(username, from, to, amount, rate).await?;
        // Matches the credit the store applied.
        let exchanged_amount = exchange_credit(from, to, amount, rate);

        info!(
            rate = %rate,
            exchanged_amount = %exchanged_amount,
            "Exchange committed"
        );

        Ok(ExchangeOutcome::new(exchanged_amount, from, to, &balances))
    }

    /// Read one account's balances.
    pub async fn balance(&self, username: &Username) -> Result<BalanceView> {
        let balances = self.store.balances(username).await?;
        Ok(BalanceView {
            username: username.clone(),
            balances,
        })
    }

    /// The full conversion table, served through the cache policy.
    pub async fn rates(&self) -> Result<RateTable> {
        self.rates.table().await
    }

    async fn apply_signed(
        &self,
        username: &Username,
        currency: &str,
        amount: Decimal,
        kind: OperationKind,
    ) -> Result<Balances> {
        let currency = self.validate(currency, amount)?;

        let balances = self
            .store
            .apply_delta(username, currency, kind.signed_delta(amount))
            .await?;

        info!(
            operation = kind.as_str(),
            new_balance = %balances.get(currency),
            "Ledger operation committed"
        );

        // Dispatched only after commit; the result is already decided.
        self.maybe_audit(username, kind, amount);

        Ok(balances)
    }

    /// The amount is checked before the currency code; a request that
    /// is wrong in both ways reports the amount.
    fn validate(&self, currency: &str, amount: Decimal) -> Result<Currency> {
        if amount <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount { amount });
        }
        Currency::from_code(currency)
    }

    fn maybe_audit(&self, username: &Username, kind: OperationKind, amount: Decimal) {
        if amount >= self.config.large_transaction_threshold {
            self.audit
                .dispatch(AuditEvent::new(username.clone(), kind, amount));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxwallet_audit::RecordingChannel;
    use fxwallet_ledger::MemoryStore;
    use fxwallet_rates::MockRateSource;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn setup() -> (ExchangeEngine, Arc<MockRateSource>, Arc<RecordingChannel>) {
        let store = MemoryStore::new();
        store.insert_account(
            Username::from("alice"),
            Balances::new(dec!(100), dec!(100), dec!(100)),
        );

        let source = Arc::new(MockRateSource::new("test"));
        // Base unit RUB: RUB->EUR prices at 0.011, RUB->USD at 0.01.
        source.set_table(RateTable::new(dec!(0.01), dec!(1), dec!(0.011)));

        let channel = Arc::new(RecordingChannel::new());

        let engine = ExchangeEngine::new(
            Arc::new(store),
            source.clone(),
            channel.clone(),
            EngineConfig::default(),
        );
        (engine, source, channel)
    }

    async fn wait_for_attempts(channel: &RecordingChannel, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while channel.attempt_count() < count {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {count} audit attempts"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_deposit_withdraw_exchange_sequence() {
        let (engine, _, _) = setup();
        let alice = Username::from("alice");

        let after_deposit = engine.deposit(&alice, "USD", dec!(50)).await.unwrap();
        assert_eq!(after_deposit.usd, dec!(150));

        let after_withdraw = engine.withdraw(&alice, "USD", dec!(100)).await.unwrap();
        assert_eq!(after_withdraw.usd, dec!(50));

        let outcome = engine.exchange(&alice, "RUB", "EUR", dec!(100)).await.unwrap();
        assert_eq!(outcome.exchanged_amount, dec!(1.1));
        assert_eq!(outcome.new_balance[&Currency::Rub], dec!(0));
        assert_eq!(outcome.new_balance[&Currency::Eur], dec!(101.1));

        let view = engine.balance(&alice).await.unwrap();
        assert_eq!(view.balances, Balances::new(dec!(50), dec!(0), dec!(101.1)));
    }

    #[tokio::test]
    async fn test_same_currency_exchange_conserves_balance() {
        let (engine, _, _) = setup();
        let alice = Username::from("alice");

        // Sub-scale amount: debit and credit must cancel exactly
        // instead of rounding the credit leg up.
        let outcome = engine.exchange(&alice, "USD", "USD", dec!(0.015)).await.unwrap();
        assert_eq!(outcome.exchanged_amount, dec!(0.015));
        assert_eq!(outcome.new_balance[&Currency::Usd], dec!(100));

        let view = engine.balance(&alice).await.unwrap();
        assert_eq!(view.balances.usd, dec!(100));
    }

    #[tokio::test]
    async fn test_amount_is_validated_before_currency() {
        let (engine, _, _) = setup();
        let alice = Username::from("alice");

        // Both the amount and the code are wrong; the amount wins.
        let err = engine.deposit(&alice, "GBP", dec!(-5)).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AMOUNT");

        let err = engine.deposit(&alice, "GBP", dec!(5)).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CURRENCY");

        let err = engine.withdraw(&alice, "USD", Decimal::ZERO).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AMOUNT");
    }

    #[tokio::test]
    async fn test_unsupported_currency_rejected_before_any_state_access() {
        let (engine, source, _) = setup();
        let alice = Username::from("alice");

        let err = engine
            .exchange(&alice, "GBP", "EUR", dec!(10))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CURRENCY");

        let err = engine
            .exchange(&alice, "USD", "CHF", dec!(10))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CURRENCY");

        // Neither the rate source nor the ledger was touched.
        assert_eq!(source.fetch_count(), 0);
        let view = engine.balance(&alice).await.unwrap();
        assert_eq!(view.balances, Balances::new(dec!(100), dec!(100), dec!(100)));
    }

    #[tokio::test]
    async fn test_failed_operations_leave_balances_unchanged() {
        let (engine, _, _) = setup();
        let alice = Username::from("alice");

        let err = engine.withdraw(&alice, "USD", dec!(500)).await.unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");

        let err = engine
            .exchange(&alice, "RUB", "EUR", dec!(150))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");

        let view = engine.balance(&alice).await.unwrap();
        assert_eq!(view.balances, Balances::new(dec!(100), dec!(100), dec!(100)));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let (engine, _, _) = setup();
        let ghost = Username::from("ghost");

        let err = engine.deposit(&ghost, "USD", dec!(10)).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let err = engine.balance(&ghost).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_rates_returns_full_table() {
        let (engine, source, _) = setup();

        let table = engine.rates().await.unwrap();
        assert_eq!(table, RateTable::new(dec!(0.01), dec!(1), dec!(0.011)));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_large_deposit_triggers_one_tagged_audit_attempt() {
        let (engine, _, channel) = setup();
        let alice = Username::from("alice");

        engine.deposit(&alice, "USD", dec!(30000)).await.unwrap();
        wait_for_attempts(&channel, 1).await;

        let sent = channel.sent();
        assert_eq!(sent.len(), 1);

        let (routing_key, payload) = &sent[0];
        assert_eq!(routing_key, "wallet.event.deposit");

        let event: serde_json::Value = serde_json::from_slice(payload).unwrap();
        assert_eq!(event["user"], "alice");
        assert_eq!(event["operation_type"], "deposit");
        assert_eq!(event["amount"], "30000");
    }

    #[tokio::test]
    async fn test_large_withdrawal_tagged_withdraw() {
        let (engine, _, channel) = setup();
        let alice = Username::from("alice");

        engine.deposit(&alice, "EUR", dec!(40000)).await.unwrap();
        engine.withdraw(&alice, "EUR", dec!(35000)).await.unwrap();
        wait_for_attempts(&channel, 2).await;

        let sent = channel.sent();
        let keys: Vec<&str> = sent.iter().map(|(key, _)| key.as_str()).collect();
        assert!(keys.contains(&"wallet.event.deposit"));
        assert!(keys.contains(&"wallet.event.withdraw"));
    }

    #[tokio::test]
    async fn test_below_threshold_operations_are_not_audited() {
        let (engine, _, channel) = setup();
        let alice = Username::from("alice");

        engine.deposit(&alice, "USD", dec!(29999.99)).await.unwrap();
        engine.withdraw(&alice, "USD", dec!(10)).await.unwrap();
        engine.exchange(&alice, "RUB", "EUR", dec!(50)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(channel.attempt_count(), 0);
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_affect_the_result() {
        let (engine, _, channel) = setup();
        let alice = Username::from("alice");
        channel.set_fail(true);

        let balances = engine.deposit(&alice, "USD", dec!(30000)).await.unwrap();
        assert_eq!(balances.usd, dec!(30100));

        wait_for_attempts(&channel, 1).await;
        assert!(channel.sent().is_empty());

        let view = engine.balance(&alice).await.unwrap();
        assert_eq!(view.balances.usd, dec!(30100));
    }

    #[tokio::test]
    async fn test_exchange_unavailable_when_rates_never_fetched() {
        let (engine, source, _) = setup();
        let alice = Username::from("alice");
        source.set_fail(true);

        let err = engine
            .exchange(&alice, "RUB", "EUR", dec!(10))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "RATE_UNAVAILABLE");

        let view = engine.balance(&alice).await.unwrap();
        assert_eq!(view.balances, Balances::new(dec!(100), dec!(100), dec!(100)));
    }
}
