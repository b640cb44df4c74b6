//! Repository for the append-only `job_events` table (the Job Log).

use sqlx::PgPool;

use crate::models::job_event::{CreateJobEvent, JobEvent};

/// Column list for job_events queries.
const COLUMNS: &str = "id, user_id, request_id, batch_id, mode, model, gateway, \
    status, error_code, error_message, input_bytes, output_bytes, \
    prompt_tokens, completion_tokens, tokens_charged, elapsed_ms, retry_count, \
    balance_before, balance_after, image_count, images, content, created_at";

/// Append and query audit records. Rows are write-once; there is no update.
pub struct JobEventRepo;

impl JobEventRepo {
    /// Append one job event, returning the created row.
    pub async fn insert(pool: &PgPool, input: &CreateJobEvent) -> Result<JobEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO job_events
                (user_id, request_id, batch_id, mode, model, gateway, status,
                 error_code, error_message, input_bytes, output_bytes,
                 prompt_tokens, completion_tokens, tokens_charged, elapsed_ms,
                 balance_before, balance_after, image_count, images, content)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                     $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JobEvent>(&query)
            .bind(&input.user_id)
            .bind(&input.request_id)
            .bind(&input.batch_id)
            .bind(&input.mode)
            .bind(&input.model)
            .bind(&input.gateway)
            .bind(&input.status)
            .bind(&input.error_code)
            .bind(&input.error_message)
            .bind(input.input_bytes)
            .bind(input.output_bytes)
            .bind(input.prompt_tokens)
            .bind(input.completion_tokens)
            .bind(input.tokens_charged)
            .bind(input.elapsed_ms)
            .bind(input.balance_before)
            .bind(input.balance_after)
            .bind(input.image_count)
            .bind(&input.images)
            .bind(&input.content)
            .fetch_one(pool)
            .await
    }

    /// Fetch events for a set of request correlation ids, scoped to one
    /// user. Used by the batch status endpoint; ids with no event are
    /// simply absent from the result.
    pub async fn find_by_request_ids(
        pool: &PgPool,
        user_id: &str,
        request_ids: &[String],
    ) -> Result<Vec<JobEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM job_events
             WHERE user_id = $1 AND request_id = ANY($2)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, JobEvent>(&query)
            .bind(user_id)
            .bind(request_ids)
            .fetch_all(pool)
            .await
    }
}
