//! Handler for the generation endpoint.
//!
//! Routes:
//! - `POST /api/v1/generate` — dispatch one generation to an upstream
//!   provider, bill it, and log it.
//!
//! The flow is admission (validation, credential resolution, balance
//! pre-check), then dispatch, then settlement (billing + job event). Every
//! auth-passed attempt records exactly one job event, whichever way it
//! ends.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use glaze_core::error::CoreError;
use glaze_core::request::{
    validate_image_sizes, validate_instruction, GenerationMode, GenerationRequest, ImageSize,
};
use glaze_core::routing::{self, GatewaySelection, ProviderKind, DEFAULT_MODEL};
use glaze_core::types::UserId;
use glaze_core::usage::{classify_success, error_code, tokens_charged, JobStatus, TokenUsage};
use glaze_db::repositories::{BalanceRepo, CredentialRepo};

use crate::error::{AppError, AppResult};
use crate::metering;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Inbound generation request body.
///
/// `image` and `images` are alternatives; a single `image` is folded into
/// the list. Field names are camelCase on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub instruction: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub reference_images: Vec<String>,
    pub model: Option<String>,
    pub image_size: Option<ImageSize>,
    pub aspect_ratio: Option<String>,
    pub mode: Option<GenerationMode>,
    pub batch_id: Option<String>,
    pub request_id: Option<String>,
}

impl GenerateRequest {
    /// Fold the wire shape into the canonical, immutable request.
    fn into_canonical(self) -> GenerationRequest {
        let mut images = self.images;
        if let Some(single) = self.image {
            images.insert(0, single);
        }
        GenerationRequest {
            instruction: self.instruction.unwrap_or_default(),
            images,
            reference_images: self.reference_images,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            image_size: self.image_size,
            aspect_ratio: self.aspect_ratio,
            mode: self.mode.unwrap_or(GenerationMode::Batch),
            batch_id: self.batch_id,
            request_id: self.request_id,
        }
    }
}

/// Successful generation response.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub images: Vec<String>,
    pub content: String,
    pub usage: TokenUsage,
    /// Upstream call duration in milliseconds.
    pub elapsed: u64,
    pub model: String,
    pub tokens_remaining: i64,
    pub gateway: &'static str,
}

// ---------------------------------------------------------------------------
// Failure snapshot
// ---------------------------------------------------------------------------

/// A failed attempt plus the balance snapshot taken before it failed.
///
/// Threading the snapshot through explicitly guarantees the failure path
/// records the same numbers the success path would have, without reaching
/// into surrounding scope.
struct Failure {
    error: AppError,
    balance_before: Option<i64>,
}

impl Failure {
    fn pre_dispatch(error: impl Into<AppError>) -> Self {
        Self {
            error: error.into(),
            balance_before: None,
        }
    }
}

/// What admission control hands to the dispatch phase.
struct Admission {
    credential: String,
    balance_before: i64,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /api/v1/generate
pub async fn generate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<GenerateRequest>,
) -> AppResult<impl IntoResponse> {
    let request = input.into_canonical();
    let selection = routing::resolve(&request.model);

    let admission = match admit(&state, &user.user_id, &request, &selection).await {
        Ok(admission) => admission,
        Err(failure) => {
            // Pre-dispatch rejection: zero-cost event, then the error.
            let event = metering::failure_event(
                &user.user_id,
                &request,
                &selection,
                failure.error.job_error_code(),
                &failure.error.to_string(),
                failure.balance_before,
            );
            metering::record_event(&state.pool, event).await;
            return Err(failure.error);
        }
    };

    settle(&state, &user.user_id, &request, &selection, admission).await
}

/// Validate the request, resolve the credential, and pre-check the balance.
///
/// Order matters: validation failures must not read the balance, and the
/// balance pre-check is coarse admission control only -- the true cost is
/// unknown until the upstream call completes.
async fn admit(
    state: &AppState,
    user_id: &UserId,
    request: &GenerationRequest,
    selection: &GatewaySelection,
) -> Result<Admission, Failure> {
    let limits = &state.config.limits;

    validate_instruction(&request.instruction, limits.max_instruction_chars)
        .map_err(Failure::pre_dispatch)?;
    validate_image_sizes(request, limits.max_image_bytes).map_err(Failure::pre_dispatch)?;

    let credential = match selection.kind {
        ProviderKind::BringYourOwnKey => CredentialRepo::find_api_key(&state.pool, user_id)
            .await
            .map_err(Failure::pre_dispatch)?
            .ok_or_else(|| Failure::pre_dispatch(CoreError::MissingCredential(user_id.clone())))?,
        ProviderKind::Direct => state
            .config
            .gateway
            .direct_api_key
            .clone()
            .ok_or_else(|| {
                Failure::pre_dispatch(CoreError::Configuration(
                    "GATEWAY_DIRECT_API_KEY is not configured".into(),
                ))
            })?,
        ProviderKind::Aggregator => state
            .config
            .gateway
            .aggregator_api_key
            .clone()
            .ok_or_else(|| {
                Failure::pre_dispatch(CoreError::Configuration(
                    "GATEWAY_AGGREGATOR_API_KEY is not configured".into(),
                ))
            })?,
    };

    let balance_before = BalanceRepo::get(&state.pool, user_id)
        .await
        .map_err(Failure::pre_dispatch)?;

    if balance_before < limits.min_balance_tokens {
        return Err(Failure {
            error: AppError::Core(CoreError::InsufficientBalance {
                balance: balance_before,
                required: limits.min_balance_tokens,
            }),
            balance_before: Some(balance_before),
        });
    }

    Ok(Admission {
        credential,
        balance_before,
    })
}

/// Dispatch upstream, then bill and log whatever came back.
///
/// Post-dispatch, billing and logging run even on failure: the upstream
/// work happened, and no attempt may go unrecorded.
async fn settle(
    state: &AppState,
    user_id: &UserId,
    request: &GenerationRequest,
    selection: &GatewaySelection,
    admission: Admission,
) -> AppResult<impl IntoResponse> {
    let Admission {
        credential,
        balance_before,
    } = admission;

    let result = match state.gateway.dispatch(selection, request, &credential).await {
        Ok(result) => result,
        Err(gateway_err) => {
            let error = AppError::Gateway(gateway_err);
            let event = metering::failure_event(
                user_id,
                request,
                selection,
                error.job_error_code(),
                &error.to_string(),
                Some(balance_before),
            );
            metering::record_event(&state.pool, event).await;
            return Err(error);
        }
    };

    let status = classify_success(result.images.len(), &result.content);
    let charged = tokens_charged(
        selection.kind,
        &result.usage,
        state.config.limits.fallback_token_cost,
    );
    let balance_after = metering::charge(&state.pool, user_id, charged, balance_before).await;

    if status == JobStatus::Error {
        // 2xx but neither images nor text. Still billed: the upstream call
        // did the work it reported usage for.
        let mut event = metering::outcome_event(
            user_id, request, selection, &result, status, charged, balance_before, balance_after,
        );
        event.error_code = Some(error_code::NO_OUTPUT.to_string());
        event.error_message = Some("upstream returned neither images nor text".to_string());
        metering::record_event(&state.pool, event).await;
        return Err(AppError::NoOutput);
    }

    if status == JobStatus::Warning {
        tracing::warn!(
            user_id = %user_id,
            gateway = selection.kind.as_str(),
            model = %selection.model,
            "Generation returned text but no images"
        );
    }

    let event = metering::outcome_event(
        user_id, request, selection, &result, status, charged, balance_before, balance_after,
    );
    metering::record_event(&state.pool, event).await;

    Ok(Json(GenerateResponse {
        images: result.images,
        content: result.content,
        usage: result.usage,
        elapsed: result.elapsed_ms,
        model: result.model,
        tokens_remaining: balance_after,
        gateway: selection.kind.as_str(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_image_field_is_folded_first() {
        let input: GenerateRequest = serde_json::from_value(serde_json::json!({
            "instruction": "blend these",
            "image": "data:image/png;base64,AAAA",
            "images": ["data:image/png;base64,BBBB"],
            "mode": "combine"
        }))
        .unwrap();

        let request = input.into_canonical();
        assert_eq!(request.images.len(), 2);
        assert_eq!(request.images[0], "data:image/png;base64,AAAA");
        assert_eq!(request.mode, GenerationMode::Combine);
        assert_eq!(request.model, DEFAULT_MODEL);
    }

    #[test]
    fn camel_case_fields_deserialize() {
        let input: GenerateRequest = serde_json::from_value(serde_json::json!({
            "instruction": "upscale",
            "referenceImages": ["data:image/png;base64,AAAA"],
            "imageSize": "large",
            "aspectRatio": "16:9",
            "batchId": "b1",
            "requestId": "r1"
        }))
        .unwrap();

        assert_eq!(input.reference_images.len(), 1);
        assert_eq!(input.image_size, Some(ImageSize::Large));
        assert_eq!(input.aspect_ratio.as_deref(), Some("16:9"));
        assert_eq!(input.batch_id.as_deref(), Some("b1"));
        assert_eq!(input.request_id.as_deref(), Some("r1"));
    }
}
