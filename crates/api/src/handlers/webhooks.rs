//! Payment webhook processing.
//!
//! Routes:
//! - `POST /api/v1/webhooks/payment` — signed payment-provider callbacks.
//!
//! The provider retries deliveries until it sees a 2xx, so the handler is
//! idempotent: the unique index on `purchases.transaction_id` is the anchor,
//! and every path that has already credited the tokens acknowledges without
//! crediting again.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use glaze_core::error::CoreError;
use glaze_core::webhook::verify_signature;
use glaze_db::models::purchase::{status, CreatePurchase};
use glaze_db::repositories::PurchaseRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the provider's hex HMAC-SHA256 signature of the raw body.
pub const SIGNATURE_HEADER: &str = "x-glaze-signature";

/// The one event type with ledger effects.
const EVENT_ORDER_COMPLETED: &str = "order.completed";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentEvent {
    event_type: String,
    transaction_id: Option<String>,
    #[serde(default)]
    amount_cents: i64,
    metadata: Option<PaymentMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentMetadata {
    user_id: Option<String>,
    tokens: Option<i64>,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks/payment
///
/// Signature verification runs over the raw bytes before anything parses the
/// body, so the handler takes `Bytes` rather than `Json`.
pub async fn payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(&state.config.webhook_secret, &body, provided) {
        tracing::warn!("Rejected payment webhook with bad signature");
        return Err(AppError::Core(CoreError::Forbidden(
            "Invalid webhook signature".into(),
        )));
    }

    let event: PaymentEvent = serde_json::from_slice(&body)
        .map_err(|err| AppError::BadRequest(format!("Malformed webhook payload: {err}")))?;

    if event.event_type != EVENT_ORDER_COMPLETED {
        tracing::debug!(event_type = %event.event_type, "Ignoring payment event");
        return Ok(Json(json!({ "received": true, "processed": false })));
    }

    let transaction_id = event
        .transaction_id
        .ok_or_else(|| AppError::BadRequest("Missing transactionId".into()))?;
    let metadata = event
        .metadata
        .ok_or_else(|| AppError::BadRequest("Missing metadata".into()))?;
    let user_id = metadata
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing metadata.userId".into()))?;
    let tokens = metadata
        .tokens
        .filter(|t| *t > 0)
        .ok_or_else(|| AppError::BadRequest("Missing or non-positive metadata.tokens".into()))?;

    // Idempotency gate: a completed purchase for this transaction means a
    // previous delivery already credited the tokens.
    let purchase = match PurchaseRepo::find_by_transaction_id(&state.pool, &transaction_id).await? {
        Some(existing) if existing.status == status::COMPLETED => {
            tracing::info!(%transaction_id, "Duplicate payment webhook acknowledged");
            return Ok(Json(json!({ "received": true, "processed": false })));
        }
        // A pending or failed row means a previous delivery stalled before
        // crediting; retry against the same row.
        Some(existing) => existing,
        None => {
            let input = CreatePurchase {
                user_id: user_id.clone(),
                transaction_id: transaction_id.clone(),
                tokens,
                amount_cents: event.amount_cents,
            };
            match PurchaseRepo::insert(&state.pool, &input).await {
                Ok(purchase) => purchase,
                // Lost a race with a concurrent delivery of the same event;
                // the winner is crediting, so acknowledge.
                Err(err) if is_unique_violation(&err) => {
                    tracing::info!(%transaction_id, "Concurrent payment webhook acknowledged");
                    return Ok(Json(json!({ "received": true, "processed": false })));
                }
                Err(err) => return Err(err.into()),
            }
        }
    };

    // Claim and credit in one transaction: the status transition gates the
    // credit, so a concurrent or replayed delivery of the same transaction
    // can never credit twice.
    let new_balance =
        match PurchaseRepo::complete_and_credit(&state.pool, purchase.id, &user_id, tokens).await {
            Ok(Some(balance)) => balance,
            Ok(None) => {
                tracing::info!(%transaction_id, "Purchase already completed, acknowledging");
                return Ok(Json(json!({ "received": true, "processed": false })));
            }
            Err(err) => {
                // Leave the purchase in a retryable state and surface a 5xx
                // so the provider redelivers.
                tracing::error!(%transaction_id, %user_id, error = %err, "Token credit failed");
                let _ =
                    PurchaseRepo::update_status(&state.pool, purchase.id, status::FAILED).await;
                return Err(AppError::InternalError(
                    "Failed to credit purchased tokens".into(),
                ));
            }
        };

    tracing::info!(
        %transaction_id,
        %user_id,
        tokens,
        new_balance,
        "Payment processed"
    );

    Ok(Json(json!({
        "received": true,
        "processed": true,
        "tokens": tokens,
        "balance": new_balance
    })))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_event_deserializes_camel_case() {
        let event: PaymentEvent = serde_json::from_value(serde_json::json!({
            "eventType": "order.completed",
            "transactionId": "txn_123",
            "amountCents": 999,
            "metadata": { "userId": "u1", "tokens": 100000 }
        }))
        .unwrap();

        assert_eq!(event.event_type, "order.completed");
        assert_eq!(event.transaction_id.as_deref(), Some("txn_123"));
        assert_eq!(event.amount_cents, 999);
        let metadata = event.metadata.unwrap();
        assert_eq!(metadata.user_id.as_deref(), Some("u1"));
        assert_eq!(metadata.tokens, Some(100_000));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let event: PaymentEvent = serde_json::from_value(serde_json::json!({
            "eventType": "order.refunded",
            "provider": "stripe",
            "extra": { "nested": true }
        }))
        .unwrap();
        assert_eq!(event.event_type, "order.refunded");
        assert!(event.transaction_id.is_none());
    }
}
