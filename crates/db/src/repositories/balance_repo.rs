//! Repository for the `user_balances` table (the Balance Store).
//!
//! Every mutation is a single atomic SQL statement keyed by user id and
//! amount. Application code never reads a balance and writes it back, so
//! concurrent requests for the same user cannot lose updates.

use sqlx::PgPool;

use glaze_core::types::UserId;

/// Atomic operations on per-user token balances.
pub struct BalanceRepo;

impl BalanceRepo {
    /// Current balance for a user. A user with no row has zero tokens.
    pub async fn get(pool: &PgPool, user_id: &UserId) -> Result<i64, sqlx::Error> {
        let tokens: Option<i64> =
            sqlx::query_scalar("SELECT tokens FROM user_balances WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
        Ok(tokens.unwrap_or(0))
    }

    /// Atomically subtract `amount` tokens, returning the new balance.
    ///
    /// The true cost is only known after the upstream call, so this runs
    /// post-generation and may legitimately drive the balance to zero or
    /// slightly negative; the pre-check in the API layer is the admission
    /// control. Returns `None` if the user has no balance row.
    pub async fn decrement(
        pool: &PgPool,
        user_id: &UserId,
        amount: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE user_balances
             SET tokens = tokens - $2, updated_at = now()
             WHERE user_id = $1
             RETURNING tokens",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(pool)
        .await
    }

    /// Atomically add `amount` tokens, creating the row if needed.
    /// Returns the new balance.
    ///
    /// Takes any executor so the webhook path can run it inside the
    /// purchase-claiming transaction.
    pub async fn credit(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: &UserId,
        amount: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO user_balances (user_id, tokens)
             VALUES ($1, $2)
             ON CONFLICT (user_id)
             DO UPDATE SET tokens = user_balances.tokens + EXCLUDED.tokens,
                           updated_at = now()
             RETURNING tokens",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_one(executor)
        .await
    }
}
