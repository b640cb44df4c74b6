//! Bring-your-own-key credential management.
//!
//! Routes:
//! - `PUT /api/v1/credentials/gateway` — store or replace the caller's key.
//! - `DELETE /api/v1/credentials/gateway` — remove it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use glaze_core::error::CoreError;
use glaze_db::repositories::CredentialRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCredentialRequest {
    pub api_key: String,
}

/// PUT /api/v1/credentials/gateway
pub async fn upsert(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<UpsertCredentialRequest>,
) -> AppResult<impl IntoResponse> {
    let api_key = input.api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "apiKey must not be empty".into(),
        )));
    }

    CredentialRepo::upsert(&state.pool, &user.user_id, api_key).await?;
    tracing::info!(user_id = %user.user_id, "Stored gateway credential");

    Ok(Json(DataResponse {
        data: json!({ "stored": true }),
    }))
}

/// DELETE /api/v1/credentials/gateway
///
/// Idempotent: deleting an absent key is still a 204.
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let deleted = CredentialRepo::delete(&state.pool, &user.user_id).await?;
    tracing::info!(user_id = %user.user_id, deleted, "Removed gateway credential");
    Ok(StatusCode::NO_CONTENT)
}
