//! Repository for the `purchases` table (the Purchase Ledger).

use sqlx::PgPool;

use glaze_core::types::{DbId, UserId};

use crate::models::purchase::{CreatePurchase, PurchaseRecord};
use crate::repositories::BalanceRepo;

/// Column list for purchases queries.
const COLUMNS: &str =
    "id, user_id, transaction_id, tokens, amount_cents, status, created_at, updated_at";

/// Ledger operations for payment-confirmation processing.
pub struct PurchaseRepo;

impl PurchaseRepo {
    /// Look up a purchase by the payment provider's transaction id.
    ///
    /// Called before insertion on every webhook delivery; a hit means the
    /// event was already processed (fully or partially).
    pub async fn find_by_transaction_id(
        pool: &PgPool,
        transaction_id: &str,
    ) -> Result<Option<PurchaseRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM purchases WHERE transaction_id = $1");
        sqlx::query_as::<_, PurchaseRecord>(&query)
            .bind(transaction_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a fresh purchase in `pending` status, returning the row.
    ///
    /// Fails with a unique-constraint violation (`uq_purchases_transaction_id`)
    /// if the transaction id is already ledgered.
    pub async fn insert(
        pool: &PgPool,
        input: &CreatePurchase,
    ) -> Result<PurchaseRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO purchases (user_id, transaction_id, tokens, amount_cents)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PurchaseRecord>(&query)
            .bind(&input.user_id)
            .bind(&input.transaction_id)
            .bind(input.tokens)
            .bind(input.amount_cents)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim a purchase and credit its tokens.
    ///
    /// One transaction: the `pending`/`failed` -> `completed` transition
    /// gates the credit (`WHERE status <> 'completed'`), so for a given
    /// purchase exactly one delivery can ever credit, however deliveries
    /// interleave or crash. Returns the new balance, or `None` when the
    /// row was already completed.
    pub async fn complete_and_credit(
        pool: &PgPool,
        purchase_id: DbId,
        user_id: &UserId,
        tokens: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed: Option<DbId> = sqlx::query_scalar(
            "UPDATE purchases
             SET status = 'completed', updated_at = now()
             WHERE id = $1 AND status <> 'completed'
             RETURNING id",
        )
        .bind(purchase_id)
        .fetch_optional(&mut *tx)
        .await?;

        if claimed.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let new_balance = BalanceRepo::credit(&mut *tx, user_id, tokens).await?;
        tx.commit().await?;
        Ok(Some(new_balance))
    }

    /// Move a purchase to a terminal status. Returns `true` if a row was
    /// updated.
    pub async fn update_status(
        pool: &PgPool,
        purchase_id: DbId,
        status: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE purchases SET status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(purchase_id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
