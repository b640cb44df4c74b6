//! Batch status lookup.
//!
//! Routes:
//! - `POST /api/v1/jobs/status` — fetch outcomes for a set of request
//!   correlation ids, scoped to the caller.

use std::collections::HashMap;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use glaze_db::models::job_event::JobEvent;
use glaze_db::repositories::JobEventRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Upper bound on ids per lookup; anything beyond it is silently dropped.
const MAX_STATUS_IDS: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    #[serde(default)]
    pub job_ids: Vec<String>,
}

/// POST /api/v1/jobs/status
///
/// Returns a mapping from each requested id to its latest outcome. Ids
/// that never produced an event map to `{"status": "not_found"}` -- the
/// client treats that as "still in flight or never submitted".
pub async fn status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<StatusRequest>,
) -> AppResult<impl IntoResponse> {
    let mut job_ids = input.job_ids;
    job_ids.truncate(MAX_STATUS_IDS);

    if job_ids.is_empty() {
        return Ok(Json(json!({})));
    }

    let events = JobEventRepo::find_by_request_ids(&state.pool, &user.user_id, &job_ids).await?;

    // Events come back newest-first; the first hit per id is its latest.
    let mut latest: HashMap<&str, &JobEvent> = HashMap::new();
    for event in &events {
        if let Some(id) = event.request_id.as_deref() {
            latest.entry(id).or_insert(event);
        }
    }

    let mut statuses = serde_json::Map::new();
    for id in &job_ids {
        let entry = match latest.get(id.as_str()) {
            Some(event) => status_entry(event),
            None => json!({ "status": "not_found" }),
        };
        statuses.insert(id.clone(), entry);
    }

    tracing::debug!(
        user_id = %user.user_id,
        requested = job_ids.len(),
        found = latest.len(),
        "Batch status lookup"
    );

    Ok(Json(Value::Object(statuses)))
}

/// Project a job event onto the status wire shape.
fn status_entry(event: &JobEvent) -> Value {
    let mut entry = json!({
        "status": event.status,
        "elapsed": event.elapsed_ms,
        "retryCount": event.retry_count,
    });

    if let Some(images) = &event.images {
        entry["images"] = images.clone();
    }
    if let Some(content) = &event.content {
        entry["content"] = json!(content);
    }
    if event.prompt_tokens + event.completion_tokens > 0 {
        entry["usage"] = json!({
            "prompt_tokens": event.prompt_tokens,
            "completion_tokens": event.completion_tokens,
            "total_tokens": event.prompt_tokens + event.completion_tokens,
        });
    }
    if let Some(message) = &event.error_message {
        entry["error"] = json!(message);
    }
    if let Some(code) = &event.error_code {
        entry["errorCode"] = json!(code);
    }

    entry
}
