//! Usage metering: token cost, balance decrement, and job-event recording.
//!
//! Metering operations are advisory. Once a generation has happened, a
//! failure to bill or to log degrades to an audit gap, never to a
//! user-facing error; every failure path here is logged and swallowed.

use glaze_core::request::{estimated_decoded_bytes, split_data_uri, GenerationRequest};
use glaze_core::routing::GatewaySelection;
use glaze_core::types::UserId;
use glaze_core::usage::JobStatus;

use glaze_db::models::job_event::CreateJobEvent;
use glaze_db::repositories::{BalanceRepo, JobEventRepo};
use glaze_db::DbPool;

use glaze_gateway::GenerationResult;

// ---------------------------------------------------------------------------
// Event construction
// ---------------------------------------------------------------------------

/// Estimated decoded bytes of all submitted images plus the instruction.
pub fn input_bytes(request: &GenerationRequest) -> i64 {
    let image_bytes: u64 = request
        .images
        .iter()
        .chain(request.reference_images.iter())
        .map(|uri| {
            let payload_len = split_data_uri(uri).map(|(_, p)| p.len()).unwrap_or(uri.len());
            estimated_decoded_bytes(payload_len)
        })
        .sum();
    image_bytes as i64 + request.instruction.len() as i64
}

/// Bytes returned to the client: image URIs/URLs plus text content.
pub fn output_bytes(result: &GenerationResult) -> i64 {
    let image_bytes: usize = result.images.iter().map(|i| i.len()).sum();
    (image_bytes + result.content.len()) as i64
}

/// Skeleton event shared by every outcome of one attempt: correlation ids,
/// mode, model, and gateway are known as soon as routing has run.
fn base_event(
    user_id: &UserId,
    request: &GenerationRequest,
    selection: &GatewaySelection,
) -> CreateJobEvent {
    CreateJobEvent {
        user_id: user_id.clone(),
        request_id: request.request_id.clone(),
        batch_id: request.batch_id.clone(),
        mode: request.mode.as_str().to_string(),
        model: selection.model.clone(),
        gateway: selection.kind.as_str().to_string(),
        input_bytes: input_bytes(request),
        ..Default::default()
    }
}

/// Event for an attempt that failed, before or after dispatch. Zero cost;
/// pre-dispatch failures have no balance snapshot.
pub fn failure_event(
    user_id: &UserId,
    request: &GenerationRequest,
    selection: &GatewaySelection,
    error_code: &str,
    error_message: &str,
    balance_before: Option<i64>,
) -> CreateJobEvent {
    CreateJobEvent {
        status: JobStatus::Error.as_str().to_string(),
        error_code: Some(error_code.to_string()),
        error_message: Some(error_message.to_string()),
        balance_before,
        balance_after: balance_before,
        ..base_event(user_id, request, selection)
    }
}

/// Event for a completed upstream call (success or warning outcome).
#[allow(clippy::too_many_arguments)]
pub fn outcome_event(
    user_id: &UserId,
    request: &GenerationRequest,
    selection: &GatewaySelection,
    result: &GenerationResult,
    status: JobStatus,
    tokens_charged: i64,
    balance_before: i64,
    balance_after: i64,
) -> CreateJobEvent {
    CreateJobEvent {
        status: status.as_str().to_string(),
        output_bytes: output_bytes(result),
        prompt_tokens: result.usage.prompt_tokens,
        completion_tokens: result.usage.completion_tokens,
        tokens_charged,
        elapsed_ms: result.elapsed_ms as i64,
        balance_before: Some(balance_before),
        balance_after: Some(balance_after),
        image_count: result.images.len() as i32,
        images: serde_json::to_value(&result.images).ok(),
        content: if result.content.is_empty() {
            None
        } else {
            Some(result.content.clone())
        },
        ..base_event(user_id, request, selection)
    }
}

// ---------------------------------------------------------------------------
// Advisory operations
// ---------------------------------------------------------------------------

/// Append a job event. Fire-and-forget: a failed write is logged and never
/// fails the request it describes.
pub async fn record_event(pool: &DbPool, event: CreateJobEvent) {
    if let Err(err) = JobEventRepo::insert(pool, &event).await {
        tracing::error!(
            user_id = %event.user_id,
            request_id = ?event.request_id,
            status = %event.status,
            error = %err,
            "Failed to record job event"
        );
    }
}

/// Best-effort post-generation decrement.
///
/// Returns the new balance, or `balance_before - amount` as an estimate
/// when the store update failed or the user has no balance row. The
/// generation already happened, so a store error is an audit gap, not a
/// request failure.
pub async fn charge(pool: &DbPool, user_id: &UserId, amount: i64, balance_before: i64) -> i64 {
    if amount == 0 {
        return balance_before;
    }
    match BalanceRepo::decrement(pool, user_id, amount).await {
        Ok(Some(new_balance)) => new_balance,
        Ok(None) => {
            tracing::warn!(%user_id, amount, "Decrement found no balance row");
            balance_before - amount
        }
        Err(err) => {
            tracing::error!(%user_id, amount, error = %err, "Balance decrement failed");
            balance_before - amount
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use glaze_core::request::{make_data_uri, GenerationMode};
    use glaze_core::routing::{self, ProviderKind};
    use glaze_core::usage::TokenUsage;

    fn request() -> GenerationRequest {
        GenerationRequest {
            instruction: "0123456789".to_string(),
            images: vec![make_data_uri("image/png", &"A".repeat(400))],
            reference_images: Vec::new(),
            model: "byo/gemini-2.5-flash-image".to_string(),
            image_size: None,
            aspect_ratio: None,
            mode: GenerationMode::Batch,
            batch_id: Some("batch_1".to_string()),
            request_id: Some("req_1".to_string()),
        }
    }

    #[test]
    fn input_bytes_counts_payload_and_instruction() {
        // 400 base64 chars -> 300 decoded bytes, plus 10 instruction bytes.
        assert_eq!(input_bytes(&request()), 310);
    }

    #[test]
    fn failure_event_is_zero_cost_and_carries_code() {
        let req = request();
        let sel = routing::resolve(&req.model);
        let event = failure_event(&"u1".to_string(), &req, &sel, "RATE_LIMITED", "429", Some(900));

        assert_eq!(event.status, "error");
        assert_eq!(event.tokens_charged, 0);
        assert_eq!(event.error_code.as_deref(), Some("RATE_LIMITED"));
        assert_eq!(event.balance_before, Some(900));
        assert_eq!(event.balance_after, Some(900));
        assert_eq!(event.gateway, "byo");
        assert_eq!(event.request_id.as_deref(), Some("req_1"));
    }

    #[test]
    fn outcome_event_snapshots_balances_and_usage() {
        let req = request();
        let sel = routing::resolve(&req.model);
        let result = GenerationResult {
            images: vec!["data:image/png;base64,QUJD".to_string()],
            content: "done".to_string(),
            usage: TokenUsage::new(100, 1190),
            elapsed_ms: 5000,
            kind: ProviderKind::BringYourOwnKey,
            model: sel.model.clone(),
        };

        let event = outcome_event(
            &"u1".to_string(),
            &req,
            &sel,
            &result,
            JobStatus::Success,
            0,
            900,
            900,
        );

        assert_eq!(event.status, "success");
        assert_eq!(event.prompt_tokens, 100);
        assert_eq!(event.completion_tokens, 1190);
        assert_eq!(event.tokens_charged, 0);
        assert_eq!(event.image_count, 1);
        assert_eq!(event.elapsed_ms, 5000);
        assert_eq!(event.balance_before, Some(900));
        assert_eq!(event.balance_after, Some(900));
    }
}
