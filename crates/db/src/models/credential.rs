//! Bring-your-own-key credential model.

use serde::Serialize;
use sqlx::FromRow;

use glaze_core::types::{Timestamp, UserId};

/// A row from the `gateway_credentials` table. The key itself is never
/// serialized into API responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GatewayCredential {
    pub user_id: UserId,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
