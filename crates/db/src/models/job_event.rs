//! Job-log entity models.

use serde::Serialize;
use sqlx::FromRow;

use glaze_core::types::{DbId, Timestamp, UserId};

/// A row from the append-only `job_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobEvent {
    pub id: DbId,
    pub user_id: UserId,
    pub request_id: Option<String>,
    pub batch_id: Option<String>,
    pub mode: String,
    pub model: String,
    pub gateway: String,
    pub status: String,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub input_bytes: i64,
    pub output_bytes: i64,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub tokens_charged: i64,
    pub elapsed_ms: i64,
    pub retry_count: i32,
    pub balance_before: Option<i64>,
    pub balance_after: Option<i64>,
    pub image_count: i32,
    /// Generated images (JSON array of data URIs / URLs), kept so the batch
    /// status endpoint can return results for completed jobs.
    pub images: Option<serde_json::Value>,
    pub content: Option<String>,
    pub created_at: Timestamp,
}

/// Input for appending one job event. Write-once; there is no update model.
#[derive(Debug, Clone, Default)]
pub struct CreateJobEvent {
    pub user_id: UserId,
    pub request_id: Option<String>,
    pub batch_id: Option<String>,
    pub mode: String,
    pub model: String,
    pub gateway: String,
    pub status: String,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub input_bytes: i64,
    pub output_bytes: i64,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub tokens_charged: i64,
    pub elapsed_ms: i64,
    pub balance_before: Option<i64>,
    pub balance_after: Option<i64>,
    pub image_count: i32,
    pub images: Option<serde_json::Value>,
    pub content: Option<String>,
}
