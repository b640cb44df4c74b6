//! Balance-store entity model.

use serde::Serialize;
use sqlx::FromRow;

use glaze_core::types::{Timestamp, UserId};

/// A row from the `user_balances` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserBalance {
    pub user_id: UserId,
    pub tokens: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
