//! Purchase-ledger entity models.

use serde::Serialize;
use sqlx::FromRow;

use glaze_core::types::{DbId, Timestamp, UserId};

/// Lifecycle states of a purchase. `pending -> completed` and
/// `pending -> failed` are the only transitions; both are terminal for a
/// given webhook delivery (a retried delivery may move `failed` to
/// `completed` by re-crediting the same row).
pub mod status {
    pub const PENDING: &str = "pending";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

/// A row from the `purchases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseRecord {
    pub id: DbId,
    pub user_id: UserId,
    /// Payment provider's transaction id -- the idempotency anchor.
    pub transaction_id: String,
    pub tokens: i64,
    pub amount_cents: i64,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for inserting a fresh (pending) purchase.
#[derive(Debug, Clone)]
pub struct CreatePurchase {
    pub user_id: UserId,
    pub transaction_id: String,
    pub tokens: i64,
    pub amount_cents: i64,
}
