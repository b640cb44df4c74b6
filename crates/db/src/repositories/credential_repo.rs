//! Repository for the `gateway_credentials` table (BYO keys).

use sqlx::PgPool;

use glaze_core::types::UserId;

/// Stored bring-your-own-key upstream credentials, one per user.
pub struct CredentialRepo;

impl CredentialRepo {
    /// The stored upstream API key for a user, if any.
    pub async fn find_api_key(
        pool: &PgPool,
        user_id: &UserId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT api_key FROM gateway_credentials WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Store or replace a user's upstream API key.
    pub async fn upsert(
        pool: &PgPool,
        user_id: &UserId,
        api_key: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO gateway_credentials (user_id, api_key)
             VALUES ($1, $2)
             ON CONFLICT (user_id)
             DO UPDATE SET api_key = EXCLUDED.api_key, updated_at = now()",
        )
        .bind(user_id)
        .bind(api_key)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Remove a user's stored key. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, user_id: &UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM gateway_credentials WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
