//! In-memory balance store.

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

use async_trait::async_trait;
use fxwallet_common::{Balances, Currency, Result, Username, WalletError};

use crate::store::{exchange_credit, BalanceStore};

/// Balance store backed by a sharded concurrent map.
///
/// Each mutation runs while holding the account's map entry, so the
/// constraint check and the write are one atomic unit per account.
/// Accounts in different shards never contend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: DashMap<Username, Balances>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Insert an account with starting balances, replacing any
    /// existing record. Accounts are otherwise created at
    /// registration, outside this store.
    pub fn insert_account(&self, username: Username, balances: Balances) {
        self.accounts.insert(username, balances);
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    async fn balances(&self, username: &Username) -> Result<Balances> {
        self.accounts
            .get(username)
            .map(|entry| *entry)
            .ok_or_else(|| WalletError::NotFound {
                username: username.clone(),
            })
    }

    async fn apply_delta(
        &self,
        username: &Username,
        currency: Currency,
        delta: Decimal,
    ) -> Result<Balances> {
        let mut entry =
            self.accounts
                .get_mut(username)
                .ok_or_else(|| WalletError::NotFound {
                    username: username.clone(),
                })?;

        let field = entry.get_mut(currency);
        let next = *field + delta;
        if next < Decimal::ZERO {
            return Err(WalletError::InsufficientFunds {
                username: username.clone(),
                currency,
            });
        }
        *field = next;

        debug!(user = %username, currency = %currency, delta = %delta, "Applied balance delta");
        Ok(*entry)
    }

    async fn apply_exchange(
        &self,
        username: &Username,
        from: Currency,
        to: Currency,
        amount: Decimal,
        rate: Decimal,
    ) -> Result<Balances> {
        let credit = exchange_credit(from, to, amount, rate);

        let mut entry =
            self.accounts
                .get_mut(username)
                .ok_or_else(|| WalletError::NotFound {
                    username: username.clone(),
                })?;

        if entry.get(from) < amount {
            return Err(WalletError::InsufficientFunds {
                username: username.clone(),
                currency: from,
            });
        }

        // Both legs mutate under the same entry guard, so no observer
        // sees the debit without the credit.
        *entry.get_mut(from) -= amount;
        *entry.get_mut(to) += credit;

        debug!(
            user = %username,
            from = %from,
            to = %to,
            amount = %amount,
            credit = %credit,
            "Applied exchange"
        );
        Ok(*entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn seeded_store(user: &Username) -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_account(user.clone(), Balances::new(dec!(100), dec!(100), dec!(100)));
        store
    }

    #[tokio::test]
    async fn test_deposit_then_withdraw() {
        let user = Username::new("alice");
        let store = seeded_store(&user);

        let after = store
            .apply_delta(&user, Currency::Usd, dec!(50))
            .await
            .unwrap();
        assert_eq!(after.usd, dec!(150));

        let after = store
            .apply_delta(&user, Currency::Usd, dec!(-100))
            .await
            .unwrap();
        assert_eq!(after.usd, dec!(50));
        assert_eq!(after.rub, dec!(100));
        assert_eq!(after.eur, dec!(100));
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_leaves_balance_untouched() {
        let user = Username::new("alice");
        let store = seeded_store(&user);

        let err = store
            .apply_delta(&user, Currency::Eur, dec!(-100.01))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");

        let balances = store.balances(&user).await.unwrap();
        assert_eq!(balances.eur, dec!(100));
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let store = MemoryStore::new();
        let err = store
            .balances(&Username::new("nobody"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_exchange_both_legs_commit() {
        let user = Username::new("alice");
        let store = seeded_store(&user);

        let after = store
            .apply_exchange(&user, Currency::Rub, Currency::Eur, dec!(100), dec!(0.011))
            .await
            .unwrap();

        assert_eq!(after.rub, dec!(0));
        assert_eq!(after.eur, dec!(101.1));
        assert_eq!(after.usd, dec!(100));
    }

    #[tokio::test]
    async fn test_exchange_insufficient_funds_leaves_both_legs_untouched() {
        let user = Username::new("alice");
        let store = seeded_store(&user);

        let err = store
            .apply_exchange(&user, Currency::Rub, Currency::Eur, dec!(100.5), dec!(0.011))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");

        let balances = store.balances(&user).await.unwrap();
        assert_eq!(balances.rub, dec!(100));
        assert_eq!(balances.eur, dec!(100));
    }

    #[tokio::test]
    async fn test_exchange_same_currency_is_net_neutral() {
        let user = Username::new("alice");
        let store = seeded_store(&user);

        let after = store
            .apply_exchange(&user, Currency::Usd, Currency::Usd, dec!(40), Decimal::ONE)
            .await
            .unwrap();
        assert_eq!(after.usd, dec!(100));

        // A sub-scale amount must not pick up value through the
        // credit leg: debit and credit cancel exactly, repeatedly.
        for _ in 0..3 {
            let after = store
                .apply_exchange(&user, Currency::Usd, Currency::Usd, dec!(0.015), Decimal::ONE)
                .await
                .unwrap();
            assert_eq!(after.usd, dec!(100));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_withdrawals_drain_to_exactly_zero() {
        let user = Username::new("alice");
        let store = Arc::new(MemoryStore::new());
        store.insert_account(user.clone(), Balances::new(dec!(200), dec!(0), dec!(0)));

        // 10 racers against funds for exactly 8.
        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = Arc::clone(&store);
            let user = user.clone();
            handles.push(tokio::spawn(async move {
                store.apply_delta(&user, Currency::Usd, dec!(-25)).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(err) => assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS"),
            }
        }

        assert_eq!(successes, 8);
        assert_eq!(store.balances(&user).await.unwrap().usd, Decimal::ZERO);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: after any sequence of deltas, the balance equals
        /// the sum of committed deltas and never goes negative.
        #[test]
        fn prop_delta_sequence_conserves_balance(
            ops in prop::collection::vec((any::<bool>(), 1u32..500u32), 1..40)
        ) {
            tokio_test::block_on(async {
                let user = Username::new("prop");
                let store = MemoryStore::new();
                store.insert_account(user.clone(), Balances::zero());

                let mut expected = Decimal::ZERO;
                for (is_deposit, units) in ops {
                    let signed = if is_deposit {
                        Decimal::from(units)
                    } else {
                        -Decimal::from(units)
                    };

                    match store.apply_delta(&user, Currency::Rub, signed).await {
                        Ok(balances) => {
                            expected += signed;
                            assert_eq!(balances.rub, expected);
                        }
                        Err(err) => {
                            assert_eq!(err.error_code(), "INSUFFICIENT_FUNDS");
                            assert!(expected + signed < Decimal::ZERO);
                        }
                    }
                    assert!(expected >= Decimal::ZERO);
                }

                let balances = store.balances(&user).await.unwrap();
                assert_eq!(balances.rub, expected);
            });
        }
    }
}
