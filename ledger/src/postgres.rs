//! PostgreSQL balance store.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use async_trait::async_trait;
use fxwallet_common::{Balances, Currency, Result, Username, WalletError};

use crate::store::{exchange_credit, BalanceStore};

/// Balance store backed by a `wallets` table with one numeric column
/// per currency.
///
/// Expected schema (owned by the service bootstrap, not this crate):
///
/// ```sql
/// CREATE TABLE wallets (
///     username    TEXT PRIMARY KEY,
///     balance_usd NUMERIC NOT NULL DEFAULT 0,
///     balance_rub NUMERIC NOT NULL DEFAULT 0,
///     balance_eur NUMERIC NOT NULL DEFAULT 0
/// );
/// ```
///
/// Every mutation is a single conditional `UPDATE ... RETURNING`, so
/// the constraint check and the write commit as one statement and
/// concurrent writers to the same row serialize on the row lock.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether the account row exists. Used to tell a missing
    /// account apart from a failed balance constraint after a
    /// conditional update matched no row.
    async fn account_exists(&self, username: &Username) -> Result<bool> {
        let row: Option<i32> = sqlx::query_scalar("SELECT 1 FROM wallets WHERE username = $1")
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.is_some())
    }

    /// Map a missed conditional update to the caller-facing error.
    async fn missed_update(&self, username: &Username, currency: Currency) -> WalletError {
        match self.account_exists(username).await {
            Ok(true) => WalletError::InsufficientFunds {
                username: username.clone(),
                currency,
            },
            Ok(false) => WalletError::NotFound {
                username: username.clone(),
            },
            Err(err) => err,
        }
    }
}

/// Column for a currency. Identifiers interpolated into SQL come only
/// from this closed mapping, never from caller input.
fn column(currency: Currency) -> &'static str {
    match currency {
        Currency::Usd => "balance_usd",
        Currency::Rub => "balance_rub",
        Currency::Eur => "balance_eur",
    }
}

fn db_err(err: sqlx::Error) -> WalletError {
    WalletError::Persistence(err.to_string())
}

fn to_balances(row: (Decimal, Decimal, Decimal)) -> Balances {
    Balances::new(row.0, row.1, row.2)
}

#[async_trait]
impl BalanceStore for PostgresStore {
    async fn balances(&self, username: &Username) -> Result<Balances> {
        let row = sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(
            "SELECT balance_usd, balance_rub, balance_eur FROM wallets WHERE username = $1",
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(to_balances).ok_or_else(|| WalletError::NotFound {
            username: username.clone(),
        })
    }

    async fn apply_delta(
        &self,
        username: &Username,
        currency: Currency,
        delta: Decimal,
    ) -> Result<Balances> {
        let col = column(currency);
        let sql = format!(
            "UPDATE wallets \
             SET {col} = {col} + $2 \
             WHERE username = $1 AND {col} + $2 >= 0 \
             RETURNING balance_usd, balance_rub, balance_eur"
        );

        let row = sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(&sql)
            .bind(username.as_str())
            .bind(delta)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => {
                debug!(user = %username, currency = %currency, delta = %delta, "Applied balance delta");
                Ok(to_balances(row))
            }
            None => Err(self.missed_update(username, currency).await),
        }
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

        // A column can only be assigned once per UPDATE, so the
        // same-currency case nets the two legs into one assignment;
        // credit equals debit there, so the net is exactly zero. The
        // debit constraint stays `balance >= amount` either way.
        let row = if from == to {
            let col = column(from);
            let sql = format!(
                "UPDATE wallets \
                 SET {col} = {col} + $2 \
                 WHERE username = $1 AND {col} >= $3 \
                 RETURNING balance_usd, balance_rub, balance_eur"
            );
            sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(&sql)
                .bind(username.as_str())
                .bind(credit - amount)
                .bind(amount)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?
        } else {
            let from_col = column(from);
            let to_col = column(to);
            let sql = format!(
                "UPDATE wallets \
                 SET {from_col} = {from_col} - $2, {to_col} = {to_col} + $3 \
                 WHERE username = $1 AND {from_col} >= $2 \
                 RETURNING balance_usd, balance_rub, balance_eur"
            );
            sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(&sql)
                .bind(username.as_str())
                .bind(amount)
                .bind(credit)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?
        };

        match row {
            Some(row) => {
                debug!(
                    user = %username,
                    from = %from,
                    to = %to,
                    amount = %amount,
                    credit = %credit,
                    "Applied exchange"
                );
                Ok(to_balances(row))
            }
            None => Err(self.missed_update(username, from).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_mapping_is_closed() {
        assert_eq!(column(Currency::Usd), "balance_usd");
        assert_eq!(column(Currency::Rub), "balance_rub");
        assert_eq!(column(Currency::Eur), "balance_eur");
    }
}
